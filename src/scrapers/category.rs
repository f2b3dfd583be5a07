//! Category scraper: walks a page range and collects product records.

use scraper::Html;
use tracing::{debug, info, warn};
use url::Url;

use super::delay::DelayRange;
use super::error::ScrapeError;
use super::extract::FieldExtractor;
use super::fetch::{listing_url, locate_cards, FetchOutcome, HtmlSource, PageFetcher};
use super::selectors::CompiledSelectors;
use crate::config::Config;
use crate::models::{ExtractedProduct, ProductRecord};

/// Products pulled out of one listing page.
#[derive(Debug, Default)]
pub struct PageExtraction {
    pub cards: usize,
    pub products: Vec<ExtractedProduct>,
    pub failed_cards: usize,
}

/// Parse `html` and extract every product card on it.
///
/// Kept synchronous: the parsed document must not live across an await.
pub fn extract_listing(html: &str, selectors: &CompiledSelectors, base_url: &Url) -> PageExtraction {
    let document = Html::parse_document(html);
    let cards = locate_cards(&document, &selectors.containers);
    let extractor = FieldExtractor::new(&selectors.card, base_url);

    let mut extraction = PageExtraction {
        cards: cards.len(),
        ..Default::default()
    };
    for (idx, card) in cards.into_iter().enumerate() {
        match extractor.extract(card) {
            Ok(product) => extraction.products.push(product),
            Err(e) => {
                warn!("Error extracting product {}: {}", idx + 1, e);
                extraction.failed_cards += 1;
            }
        }
    }
    extraction
}

/// Scrapes Daraz category listings page by page.
pub struct DarazScraper {
    source: Box<dyn HtmlSource>,
    selectors: CompiledSelectors,
    base_url: Url,
    page_delay: DelayRange,
}

impl DarazScraper {
    /// Build a scraper from configuration.
    ///
    /// Selectors and the base URL are validated before any browser is
    /// launched. A browser that fails to start is not an error: the scraper
    /// falls back to plain HTTP.
    pub async fn new(config: &Config, use_browser: bool) -> Result<Self, ScrapeError> {
        let selectors = CompiledSelectors::compile(&config.selectors)?;
        let base_url = Url::parse(&config.scraper.base_url)?;
        let fetcher = PageFetcher::new(&config.scraper, &config.browser, use_browser).await?;

        Ok(Self::with_source(
            Box::new(fetcher),
            selectors,
            base_url,
            config.scraper.page_delay,
        ))
    }

    /// Build a scraper around an arbitrary page source.
    pub fn with_source(
        source: Box<dyn HtmlSource>,
        selectors: CompiledSelectors,
        base_url: Url,
        page_delay: DelayRange,
    ) -> Self {
        Self {
            source,
            selectors,
            base_url,
            page_delay,
        }
    }

    pub fn browser_active(&self) -> bool {
        self.source.browser_active()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Scrape one listing page.
    ///
    /// Cards without a title are dropped. A page with no recognizable product
    /// cards is reported as [`ScrapeError::NoProducts`].
    pub async fn scrape_page(
        &mut self,
        category: &str,
        page: u32,
    ) -> Result<Vec<ProductRecord>, ScrapeError> {
        let url = listing_url(&self.base_url, category, page);
        info!("Scraping page {}: {}", page, url);

        let html = match self.source.fetch(&url, &self.selectors.ready).await {
            FetchOutcome::Complete(html) => html,
            FetchOutcome::Degraded { html, reason } => {
                warn!("Page {} degraded ({}), extracting what loaded", page, reason);
                html
            }
            FetchOutcome::Failed(e) => return Err(e),
        };

        let extraction = extract_listing(&html, &self.selectors, &self.base_url);
        if extraction.cards == 0 {
            return Err(ScrapeError::NoProducts(url));
        }

        let records: Vec<ProductRecord> = extraction
            .products
            .into_iter()
            .filter(ExtractedProduct::has_title)
            .map(|product| product.into_record(category, page))
            .collect();

        debug!(
            "Page {}: {} cards, {} kept, {} failed",
            page,
            extraction.cards,
            records.len(),
            extraction.failed_cards
        );
        Ok(records)
    }

    /// Scrape pages `start_page..=end_page` of `category`.
    ///
    /// Failed or empty pages are logged and skipped. A randomized pause
    /// separates consecutive pages. An empty range fetches nothing.
    pub async fn scrape_category(
        &mut self,
        category: &str,
        start_page: u32,
        end_page: u32,
    ) -> Vec<ProductRecord> {
        let mut all_products = Vec::new();

        for page in start_page..=end_page {
            match self.scrape_page(category, page).await {
                Ok(records) => {
                    info!("Extracted {} products from page {}", records.len(), page);
                    all_products.extend(records);
                }
                Err(e) => warn!("Skipping page {}: {}", page, e),
            }

            if page < end_page {
                self.page_delay.sleep().await;
            }
        }

        info!(
            "Scraped {} products from {} (pages {}-{})",
            all_products.len(),
            category,
            start_page,
            end_page
        );
        all_products
    }

    /// Shut down the page source (closes the browser, if any).
    pub async fn close(&mut self) {
        self.source.close().await;
    }
}
