use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use price_drop_monitor::archiver::JsonFileStore;
use price_drop_monitor::config::Config;
use price_drop_monitor::fetcher::HttpFetcher;
use price_drop_monitor::monitor::Monitor;
use price_drop_monitor::notifier::TelegramNotifier;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    info!(
        "monitoring {} sites, drop threshold {}%",
        config.sites.len(),
        config.drop_threshold
    );

    let fetcher = HttpFetcher::new(config.request_timeout)?;
    let notifier = TelegramNotifier::new(&config.telegram, config.request_timeout)?;
    let store = JsonFileStore::new(&config.state_path);

    Monitor::new(&config, fetcher, notifier).run(&store)?;
    Ok(())
}
