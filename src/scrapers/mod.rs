//! Daraz listing scraper: fetching, selector fallback and field extraction.

pub mod browser;
pub mod category;
pub mod delay;
pub mod error;
pub mod extract;
pub mod fetch;
mod http_client;
pub mod selectors;

pub use browser::{BrowserEngineConfig, BrowserFetcher};
pub use category::{extract_listing, DarazScraper, PageExtraction};
pub use delay::DelayRange;
pub use error::ScrapeError;
pub use extract::{compute_discount, parse_price, resolve_url, FieldExtractor};
pub use fetch::{listing_url, Degradation, FetchOutcome, HtmlSource, PageFetcher};
pub use http_client::{HttpClient, USER_AGENT};
pub use selectors::{CompiledSelectors, SelectorConfig, SelectorList};
