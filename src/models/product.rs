//! Product records produced by the listing scraper.

use serde::{Deserialize, Serialize};

/// Placeholder for an unresolved title, price or image.
pub const NOT_AVAILABLE: &str = "N/A";
/// Placeholder for an unresolved rating.
pub const NO_RATING: &str = "No rating";
/// Placeholder for an unresolved review count.
pub const NO_REVIEWS: &str = "0";

/// Column names in the order records are written.
pub const PRODUCT_COLUMNS: &[&str] = &[
    "title",
    "price",
    "original_price",
    "discount",
    "rating",
    "reviews",
    "image_url",
    "product_url",
    "category",
    "page",
];

/// Fields pulled from a single product card, before page bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedProduct {
    pub title: String,
    pub price: String,
    pub original_price: Option<String>,
    pub discount: Option<String>,
    pub rating: String,
    pub reviews: String,
    pub image_url: String,
    pub product_url: String,
}

impl ExtractedProduct {
    /// True if the card produced a usable title.
    pub fn has_title(&self) -> bool {
        self.title != NOT_AVAILABLE
    }

    /// Attach the category slug and page number the card was found on.
    pub fn into_record(self, category: &str, page: u32) -> ProductRecord {
        ProductRecord {
            title: self.title,
            price: self.price,
            original_price: self.original_price,
            discount: self.discount,
            rating: self.rating,
            reviews: self.reviews,
            image_url: self.image_url,
            product_url: self.product_url,
            category: category.to_string(),
            page,
        }
    }
}

/// A normalized product listing entry.
///
/// Field order matches [`PRODUCT_COLUMNS`]; serializers rely on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub title: String,
    pub price: String,
    pub original_price: Option<String>,
    pub discount: Option<String>,
    pub rating: String,
    pub reviews: String,
    pub image_url: String,
    pub product_url: String,
    pub category: String,
    pub page: u32,
}

impl ProductRecord {
    /// Check the record against the invariants the API promises.
    ///
    /// Titles must be resolved, and URLs must be absolute (an empty product
    /// URL or the image placeholder is allowed). An empty title is still a
    /// resolved one: image-only title anchors carry no text.
    pub fn validate(&self) -> Result<(), String> {
        if self.title == NOT_AVAILABLE {
            return Err("missing title".to_string());
        }
        if !self.product_url.is_empty() && url::Url::parse(&self.product_url).is_err() {
            return Err(format!("relative product_url {:?}", self.product_url));
        }
        if self.image_url != NOT_AVAILABLE && url::Url::parse(&self.image_url).is_err() {
            return Err(format!("relative image_url {:?}", self.image_url));
        }
        Ok(())
    }
}
