//! Known listing categories.

/// Popular category slugs offered to API and CLI users.
pub const POPULAR_CATEGORIES: &[&str] = &[
    "mobile-cases-covers",
    "smartphones",
    "laptops",
    "fashion-womens",
    "fashion-mens",
    "electronics",
    "home-garden",
    "sports-outdoor",
    "health-beauty",
    "baby-toys",
];
