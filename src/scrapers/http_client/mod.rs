//! Plain HTTP listing fetcher with browser-like headers and request jitter.

mod user_agent;

pub use user_agent::{resolve_user_agent, IMPERSONATE_USER_AGENTS, USER_AGENT};

use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, UPGRADE_INSECURE_REQUESTS};
use reqwest::Client;
use tracing::debug;

use super::delay::DelayRange;
use super::error::ScrapeError;
use crate::config::ScraperSettings;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_LANGUAGE_EN: &str = "en-US,en;q=0.5";

/// HTTP client used when the browser is disabled or failed to start.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    user_agent: String,
    request_delay: DelayRange,
}

impl HttpClient {
    /// Create a new HTTP client from scraper settings.
    pub fn new(settings: &ScraperSettings) -> Result<Self, ScrapeError> {
        let user_agent = resolve_user_agent(settings.user_agent.as_deref());

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_EN));
        headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));

        let client = Client::builder()
            .user_agent(&user_agent)
            .default_headers(headers)
            .timeout(Duration::from_secs(settings.request_timeout))
            .gzip(true)
            .brotli(true)
            .cookie_store(true)
            .build()?;

        Ok(Self {
            client,
            user_agent,
            request_delay: settings.request_delay,
        })
    }

    /// User agent this client identifies as.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Fetch a page body as text after a randomized pause.
    ///
    /// Non-success status codes are errors.
    pub async fn get_text(&self, url: &str) -> Result<String, ScrapeError> {
        self.request_delay.sleep().await;

        let start = Instant::now();
        let response = self.client.get(url).send().await?;
        let status = response.status();
        debug!("GET {} -> {} in {:?}", url, status, start.elapsed());

        let body = response.error_for_status()?.text().await?;
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_uses_configured_user_agent() {
        let settings = ScraperSettings {
            user_agent: Some("ListingBot/2.0".to_string()),
            ..Default::default()
        };
        let client = HttpClient::new(&settings).unwrap();
        assert_eq!(client.user_agent(), "ListingBot/2.0");
    }

    #[test]
    fn test_client_defaults_to_desktop_chrome() {
        let client = HttpClient::new(&ScraperSettings::default()).unwrap();
        assert_eq!(client.user_agent(), USER_AGENT);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_an_http_error() {
        let settings = ScraperSettings {
            request_timeout: 2,
            request_delay: DelayRange::none(),
            ..Default::default()
        };
        let client = HttpClient::new(&settings).unwrap();
        let err = client.get_text("http://127.0.0.1:9/").await.unwrap_err();
        assert!(matches!(err, ScrapeError::Http(_)));
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_http_error() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            let _ = socket
                .write_all(
                    b"HTTP/1.1 404 Not Found\r\nContent-Length: 9\r\nConnection: close\r\n\r\nnot found",
                )
                .await;
        });

        let settings = ScraperSettings {
            request_timeout: 5,
            request_delay: DelayRange::none(),
            ..Default::default()
        };
        let client = HttpClient::new(&settings).unwrap();
        let err = client
            .get_text(&format!("http://{}/laptops/?page=1", addr))
            .await
            .unwrap_err();
        match err {
            ScrapeError::Http(e) => {
                assert_eq!(e.status(), Some(reqwest::StatusCode::NOT_FOUND))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
