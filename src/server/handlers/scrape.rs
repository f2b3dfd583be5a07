//! Scrape endpoints.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use super::super::AppState;
use crate::export::{to_csv, OutputFormat};
use crate::models::ProductRecord;

fn default_page() -> u32 {
    1
}

fn default_use_browser() -> bool {
    true
}

/// Body of `POST /scrape`.
#[derive(Debug, Deserialize)]
pub struct ScrapeRequest {
    pub category: String,
    #[serde(default = "default_page")]
    pub start_page: u32,
    #[serde(default = "default_page")]
    pub end_page: u32,
    /// Render with the browser. Only honored when the shared scraper is
    /// first built.
    #[serde(default = "default_use_browser", rename = "use_selenium", alias = "use_browser")]
    pub use_browser: bool,
}

/// Query of `GET /scrape`.
#[derive(Debug, Deserialize)]
pub struct ScrapeQuery {
    pub category: String,
    #[serde(default = "default_page")]
    pub start_page: u32,
    #[serde(default = "default_page")]
    pub end_page: u32,
    #[serde(default = "default_use_browser", rename = "use_selenium", alias = "use_browser")]
    pub use_browser: bool,
    /// `json` (default) or `csv`.
    pub format: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ScrapeResponse {
    pub status: &'static str,
    pub count: usize,
    pub products: Vec<ProductRecord>,
    pub message: String,
}

fn internal_error(detail: String) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "detail": detail })),
    )
        .into_response()
}

/// Scrape a category and return the validated products.
pub async fn scrape_products(
    State(state): State<AppState>,
    Json(request): Json<ScrapeRequest>,
) -> Response {
    let products = match state
        .scrape(
            &request.category,
            request.start_page,
            request.end_page,
            request.use_browser,
        )
        .await
    {
        Ok(products) => products,
        Err(e) => return internal_error(format!("Scraping failed: {}", e)),
    };

    let products: Vec<ProductRecord> = products
        .into_iter()
        .filter(|product| match product.validate() {
            Ok(()) => true,
            Err(reason) => {
                warn!("Dropping product {:?}: {}", product.title, reason);
                false
            }
        })
        .collect();

    Json(ScrapeResponse {
        status: "success",
        count: products.len(),
        message: format!("Successfully scraped {} products", products.len()),
        products,
    })
    .into_response()
}

/// Scrape a category, returning JSON records or CSV text.
pub async fn scrape_products_get(
    State(state): State<AppState>,
    Query(params): Query<ScrapeQuery>,
) -> Response {
    let products = match state
        .scrape(
            &params.category,
            params.start_page,
            params.end_page,
            params.use_browser,
        )
        .await
    {
        Ok(products) => products,
        Err(e) => return internal_error(e.to_string()),
    };

    match OutputFormat::from_param(params.format.as_deref()) {
        OutputFormat::Csv => match to_csv(&products) {
            Ok(csv_data) => Json(json!({
                "csv_data": csv_data,
                "count": products.len(),
            }))
            .into_response(),
            Err(e) => internal_error(e.to_string()),
        },
        OutputFormat::Json => Json(json!({
            "status": "success",
            "count": products.len(),
            "products": products,
        }))
        .into_response(),
    }
}
