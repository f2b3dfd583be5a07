//! Listing page retrieval: browser rendering with a plain HTTP fallback.

use async_trait::async_trait;
use scraper::{ElementRef, Html};
use tracing::{debug, info, warn};
use url::Url;

use super::browser::{BrowserEngineConfig, BrowserFetcher, RenderedPage};
use super::error::ScrapeError;
use super::http_client::HttpClient;
use super::selectors::SelectorList;
use crate::config::ScraperSettings;

/// Listing URL for one page of a category.
pub fn listing_url(base_url: &Url, category: &str, page: u32) -> String {
    format!(
        "{}/{}/?page={}",
        base_url.as_str().trim_end_matches('/'),
        category.trim_matches('/'),
        page
    )
}

/// Why a page came back usable but incomplete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Degradation {
    /// No product card appeared before the ready timeout.
    ReadyTimeout,
    /// Rendering failed after navigation; the markup is whatever had loaded.
    RenderInterrupted(String),
}

impl std::fmt::Display for Degradation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReadyTimeout => write!(f, "timed out waiting for product cards"),
            Self::RenderInterrupted(reason) => write!(f, "render interrupted: {}", reason),
        }
    }
}

/// Result of fetching one listing page.
#[derive(Debug)]
pub enum FetchOutcome {
    Complete(String),
    Degraded { html: String, reason: Degradation },
    Failed(ScrapeError),
}

impl FetchOutcome {
    /// Page markup, if any was obtained.
    pub fn html(&self) -> Option<&str> {
        match self {
            Self::Complete(html) | Self::Degraded { html, .. } => Some(html),
            Self::Failed(_) => None,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }
}

impl From<RenderedPage> for FetchOutcome {
    fn from(page: RenderedPage) -> Self {
        if let Some(reason) = page.render_error {
            Self::Degraded {
                html: page.html,
                reason: Degradation::RenderInterrupted(reason),
            }
        } else if page.ready_timed_out {
            Self::Degraded {
                html: page.html,
                reason: Degradation::ReadyTimeout,
            }
        } else {
            Self::Complete(page.html)
        }
    }
}

/// Anything that can turn a listing URL into markup.
#[async_trait]
pub trait HtmlSource: Send {
    /// Fetch `url`. `ready` lists selectors whose presence means the listing
    /// has rendered; sources that do not render may ignore it.
    async fn fetch(&mut self, url: &str, ready: &[String]) -> FetchOutcome;

    /// True if pages are rendered in a browser rather than fetched raw.
    fn browser_active(&self) -> bool;

    /// Release any held resources. Safe to call more than once.
    async fn close(&mut self);
}

/// Fetches listing pages with Chrome when available, plain HTTP otherwise.
///
/// If the browser cannot be started the fetcher stays in plain mode for the
/// rest of its life.
pub struct PageFetcher {
    browser: Option<BrowserFetcher>,
    http: HttpClient,
}

impl PageFetcher {
    pub async fn new(
        settings: &ScraperSettings,
        browser_config: &BrowserEngineConfig,
        use_browser: bool,
    ) -> Result<Self, ScrapeError> {
        let http = HttpClient::new(settings)?;

        let browser = if use_browser && browser_config.enabled {
            let mut fetcher =
                BrowserFetcher::new(browser_config.clone(), http.user_agent().to_string());
            match fetcher.ensure_browser().await {
                Ok(()) => {
                    info!("Browser ready");
                    Some(fetcher)
                }
                Err(e) => {
                    warn!("Browser unavailable, using plain HTTP: {:#}", e);
                    None
                }
            }
        } else {
            debug!("Browser disabled, using plain HTTP");
            None
        };

        Ok(Self { browser, http })
    }
}

#[async_trait]
impl HtmlSource for PageFetcher {
    async fn fetch(&mut self, url: &str, ready: &[String]) -> FetchOutcome {
        match self.browser.as_mut() {
            Some(browser) => match browser.render(url, ready).await {
                Ok(page) => page.into(),
                Err(e) => FetchOutcome::Failed(ScrapeError::Browser(e)),
            },
            None => match self.http.get_text(url).await {
                Ok(html) => FetchOutcome::Complete(html),
                Err(e) => FetchOutcome::Failed(e),
            },
        }
    }

    fn browser_active(&self) -> bool {
        self.browser.is_some()
    }

    async fn close(&mut self) {
        if let Some(mut browser) = self.browser.take() {
            browser.close().await;
        }
    }
}

/// Product cards on a parsed page, using the first container selector that
/// matches anything.
pub fn locate_cards<'a>(document: &'a Html, containers: &SelectorList) -> Vec<ElementRef<'a>> {
    match containers.select_first_nonempty(document) {
        Some((pattern, cards)) => {
            info!("Found {} products using selector: {}", cards.len(), pattern);
            cards
        }
        None => {
            warn!(
                "No product containers found. Classes on page: {}",
                class_summary(document, 10).join(", ")
            );
            Vec::new()
        }
    }
}

/// Class attributes of the first `limit` elements that have one.
pub fn class_summary(document: &Html, limit: usize) -> Vec<String> {
    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter_map(|el| el.value().attr("class"))
        .map(str::trim)
        .filter(|class| !class.is_empty())
        .take(limit)
        .map(str::to_string)
        .collect()
}
