use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::{Client, ClientBuilder};
use reqwest::header::{ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::redirect;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";
const MAX_REDIRECTS: usize = 10;

/// Hands back the raw markup of a listing page.
pub trait Fetcher {
    fn fetch_html(&self, url: &str) -> Result<String>;
}

impl<T: Fetcher + ?Sized> Fetcher for &T {
    fn fetch_html(&self, url: &str) -> Result<String> {
        (**self).fetch_html(url)
    }
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = client_builder(timeout)
            .build()
            .context("building http client")?;
        Ok(Self { client })
    }
}

fn client_builder(timeout: Duration) -> ClientBuilder {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("es-PE,es;q=0.9,en;q=0.8"),
    );

    Client::builder()
        .default_headers(headers)
        .redirect(redirect::Policy::limited(MAX_REDIRECTS))
        .timeout(timeout)
}

impl Fetcher for HttpFetcher {
    fn fetch_html(&self, url: &str) -> Result<String> {
        let resp = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("GET {url}"))?
            .error_for_status()?;
        Ok(resp.text()?)
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    use super::*;

    /// Answers one request with `status` and `body`, returning the request head.
    fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/ofertas", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut head = String::new();
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
                    break;
                }
                head.push_str(&line);
            }
            stream.write_all(response.as_bytes()).unwrap();
            head.to_lowercase()
        });
        (url, handle)
    }

    fn local_fetcher(timeout: Duration) -> HttpFetcher {
        HttpFetcher {
            client: client_builder(timeout).no_proxy().build().unwrap(),
        }
    }

    #[test]
    fn test_client_builds() {
        assert!(HttpFetcher::new(Duration::from_secs(20)).is_ok());
    }

    #[test]
    fn test_fetch_returns_body_and_sends_browser_headers() {
        let (url, server) = serve_once("200 OK", "<article>hola</article>");
        let fetcher = local_fetcher(Duration::from_secs(5));

        assert_eq!(fetcher.fetch_html(&url).unwrap(), "<article>hola</article>");

        let head = server.join().unwrap();
        assert!(head.starts_with("get /ofertas http/1.1"));
        assert!(head.contains("user-agent: mozilla/5.0"));
        assert!(head.contains("accept-language: es-pe,es;q=0.9,en;q=0.8"));
    }

    #[test]
    fn test_error_status_is_an_error() {
        let (url, server) = serve_once("503 Service Unavailable", "busy");
        let fetcher = local_fetcher(Duration::from_secs(5));

        let err = fetcher.fetch_html(&url).unwrap_err();
        assert!(format!("{err:#}").contains("503"));
        server.join().unwrap();
    }

    #[test]
    fn test_unreachable_host_is_an_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        drop(listener);

        let fetcher = local_fetcher(Duration::from_secs(2));
        assert!(fetcher.fetch_html(&url).is_err());
    }
}
