use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::Serialize;

use crate::config::TelegramCredentials;

const TELEGRAM_API: &str = "https://api.telegram.org";

/// Delivers one plain-text message.
pub trait Notifier {
    fn send(&self, text: &str) -> Result<()>;
}

impl<T: Notifier + ?Sized> Notifier for &T {
    fn send(&self, text: &str) -> Result<()> {
        (**self).send(text)
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    disable_web_page_preview: bool,
}

pub struct TelegramNotifier {
    client: Client,
    endpoint: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(credentials: &TelegramCredentials, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("building telegram client")?;
        Ok(Self {
            client,
            endpoint: format!("{TELEGRAM_API}/bot{}/sendMessage", credentials.bot_token),
            chat_id: credentials.chat_id.clone(),
        })
    }
}

impl Notifier for TelegramNotifier {
    fn send(&self, text: &str) -> Result<()> {
        let body = SendMessage {
            chat_id: &self.chat_id,
            text,
            disable_web_page_preview: true,
        };
        // the endpoint embeds the bot token, keep it out of error messages
        self.client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .map_err(|e| e.without_url())
            .context("telegram sendMessage")?
            .error_for_status()
            .map_err(|e| e.without_url())?;
        Ok(())
    }
}
