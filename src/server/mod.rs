//! HTTP API for on-demand category scraping.
//!
//! One scraper (and therefore at most one browser) is shared by every
//! request. It is built lazily by the first scrape request, serialized
//! behind a mutex and closed when the server shuts down.

mod handlers;
mod routes;

pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use crate::config::Config;
use crate::models::ProductRecord;
use crate::scrapers::{DarazScraper, ScrapeError};

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    scraper: Arc<Mutex<Option<DarazScraper>>>,
    /// Mirrors the scraper's browser mode so health checks never wait on a
    /// running scrape.
    browser_active: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            scraper: Arc::new(Mutex::new(None)),
            browser_active: Arc::new(AtomicBool::new(false)),
        }
    }

    /// State with a ready-made scraper.
    pub fn with_scraper(config: Config, scraper: DarazScraper) -> Self {
        Self {
            config: Arc::new(config),
            browser_active: Arc::new(AtomicBool::new(scraper.browser_active())),
            scraper: Arc::new(Mutex::new(Some(scraper))),
        }
    }

    /// True once a scraper exists and renders pages in a browser.
    pub fn browser_active(&self) -> bool {
        self.browser_active.load(Ordering::Relaxed)
    }

    /// Run a category scrape on the shared scraper, building it first if
    /// this is the first request. `use_browser` only matters then.
    pub async fn scrape(
        &self,
        category: &str,
        start_page: u32,
        end_page: u32,
        use_browser: bool,
    ) -> Result<Vec<ProductRecord>, ScrapeError> {
        let mut guard = self.scraper.lock().await;
        let scraper = match &mut *guard {
            Some(scraper) => scraper,
            slot => {
                let scraper = DarazScraper::new(&self.config, use_browser).await?;
                self.browser_active
                    .store(scraper.browser_active(), Ordering::Relaxed);
                slot.insert(scraper)
            }
        };

        info!("Starting scrape for category: {}", category);
        Ok(scraper.scrape_category(category, start_page, end_page).await)
    }

    /// Close the shared scraper, if one was built.
    pub async fn shutdown(&self) {
        if let Some(mut scraper) = self.scraper.lock().await.take() {
            scraper.close().await;
        }
        self.browser_active.store(false, Ordering::Relaxed);
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Start the web server and run until Ctrl-C.
pub async fn serve(config: Config, host: &str, port: u16) -> anyhow::Result<()> {
    let state = AppState::new(config);
    let app = create_router(state.clone());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.shutdown().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    use crate::scrapers::category::tests::{fixture_scraper, listing, page_url, FixtureSource};

    fn app_with(source: FixtureSource) -> axum::Router {
        create_router(AppState::with_scraper(Config::default(), fixture_scraper(source)))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn two_shoes() -> FixtureSource {
        FixtureSource::default().with_page(
            &page_url("fashion-mens", 1),
            &listing(&[("Shoe", "/p/1"), ("Boot", "/p/2")]),
        )
    }

    #[tokio::test]
    async fn test_root_banner() {
        let response = app_with(FixtureSource::default())
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["endpoints"]["scrape"], "/scrape");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_health() {
        let response = app_with(FixtureSource::default())
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["selenium_available"], false);
        assert!(json["timestamp"].as_f64().unwrap() > 0.0);
    }

    #[tokio::test]
    async fn test_categories() {
        let response = app_with(FixtureSource::default())
            .oneshot(
                Request::builder()
                    .uri("/categories")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let json = body_json(response).await;
        let categories = json["categories"].as_array().unwrap();
        assert_eq!(categories.len(), 10);
        assert_eq!(categories[0], "mobile-cases-covers");
    }

    #[tokio::test]
    async fn test_post_scrape() {
        let response = app_with(two_shoes())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/scrape")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"category": "fashion-mens"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "success");
        assert_eq!(json["count"], 2);
        assert_eq!(json["products"][0]["title"], "Shoe");
        assert_eq!(json["products"][0]["category"], "fashion-mens");
        assert_eq!(json["message"], "Successfully scraped 2 products");
    }

    #[tokio::test]
    async fn test_post_scrape_empty_range() {
        let response = app_with(two_shoes())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/scrape")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        r#"{"category": "fashion-mens", "start_page": 2, "end_page": 1}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        let json = body_json(response).await;
        assert_eq!(json["count"], 0);
        assert_eq!(json["products"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_get_scrape_json() {
        let response = app_with(two_shoes())
            .oneshot(
                Request::builder()
                    .uri("/scrape?category=fashion-mens&start_page=1&end_page=1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "success");
        assert_eq!(json["count"], 2);
        assert!(json.get("message").is_none());
    }

    #[tokio::test]
    async fn test_get_scrape_csv() {
        let response = app_with(two_shoes())
            .oneshot(
                Request::builder()
                    .uri("/scrape?category=fashion-mens&format=CSV")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let json = body_json(response).await;
        assert_eq!(json["count"], 2);
        let csv = json["csv_data"].as_str().unwrap();
        assert!(csv.starts_with("title,price,original_price"));
        assert_eq!(csv.lines().count(), 3);
    }

    #[tokio::test]
    async fn test_post_and_get_agree_on_image_only_cards() {
        let html = r#"<html><body><div data-qa-locator="product-item">
            <a title="Shoe" href="/p/1"><img src="/i.jpg"></a>
        </div></body></html>"#;
        let source = FixtureSource::default()
            .with_page(&page_url("fashion-mens", 1), html)
            .with_page(&page_url("fashion-mens", 0), html);

        for range in ["start_page=1&end_page=1", "start_page=0&end_page=0"] {
            let get = app_with(source.clone())
                .oneshot(
                    Request::builder()
                        .uri(format!("/scrape?category=fashion-mens&{}", range))
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            let get = body_json(get).await;

            let (start, end) = if range.starts_with("start_page=0") { (0, 0) } else { (1, 1) };
            let post = app_with(source.clone())
                .oneshot(
                    Request::builder()
                        .method("POST")
                        .uri("/scrape")
                        .header(header::CONTENT_TYPE, "application/json")
                        .body(Body::from(format!(
                            r#"{{"category": "fashion-mens", "start_page": {}, "end_page": {}}}"#,
                            start, end
                        )))
                        .unwrap(),
                )
                .await
                .unwrap();
            let post = body_json(post).await;

            assert_eq!(get["count"], 1, "GET {}", range);
            assert_eq!(post["count"], get["count"], "POST {}", range);
            assert_eq!(post["products"][0]["title"], "");
            assert_eq!(post["products"][0]["image_url"], "https://www.daraz.com.np/i.jpg");
        }
    }

    #[tokio::test]
    async fn test_invalid_selectors_are_500() {
        let mut config = Config::default();
        config.selectors.title = vec!["a[".to_string()];
        config.browser.enabled = false;
        let app = create_router(AppState::new(config));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/scrape")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"category": "laptops", "use_selenium": false}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert!(json["detail"]
            .as_str()
            .unwrap()
            .starts_with("Scraping failed: Invalid title selector"));
    }

    #[tokio::test]
    async fn test_shutdown_closes_scraper() {
        let source = FixtureSource::default();
        let closed = source.closed.clone();
        let state = AppState::with_scraper(Config::default(), fixture_scraper(source));

        state.shutdown().await;
        assert!(*closed.lock().unwrap());
        assert!(!state.browser_active());
    }
}
