//! HTTP request handlers for the API server.

mod api;
mod scrape;

pub use api::{categories, health, root};
pub use scrape::{scrape_products, scrape_products_get};
