//! Service information endpoints.

use axum::{extract::State, response::IntoResponse, Json};
use chrono::Utc;
use serde_json::json;

use super::super::AppState;
use crate::models::POPULAR_CATEGORIES;

/// Service banner with the endpoint map.
pub async fn root() -> impl IntoResponse {
    Json(json!({
        "message": "Daraz Nepal Product Scraper API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "scrape": "/scrape",
            "categories": "/categories",
            "health": "/health",
        }
    }))
}

/// Health check endpoint for container orchestration.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let timestamp = Utc::now().timestamp_millis() as f64 / 1000.0;
    Json(json!({
        "status": "healthy",
        "selenium_available": state.browser_active(),
        "timestamp": timestamp,
    }))
}

/// Popular category slugs.
pub async fn categories() -> impl IntoResponse {
    Json(json!({ "categories": POPULAR_CATEGORIES }))
}
