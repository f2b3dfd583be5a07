//! Scraper error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Browser error: {0}")]
    Browser(#[from] anyhow::Error),
    #[error("Invalid {field} selector {pattern:?}: {message}")]
    InvalidSelector {
        field: &'static str,
        pattern: String,
        message: String,
    },
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("No product cards found at {0}")]
    NoProducts(String),
}
