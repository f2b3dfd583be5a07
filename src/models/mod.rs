//! Data models for scraped listings.

mod category;
mod product;

pub use category::POPULAR_CATEGORIES;
pub use product::{
    ExtractedProduct, ProductRecord, NOT_AVAILABLE, NO_RATING, NO_REVIEWS, PRODUCT_COLUMNS,
};
