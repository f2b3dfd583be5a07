//! Ordered CSS selector tables for Daraz listing markup.
//!
//! Daraz serves several generations of listing markup at once (hashed class
//! names, legacy `c…` classes, `data-qa-locator` attributes), so every field is
//! matched against a ranked list of patterns and the first one that hits wins.

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

use super::error::ScrapeError;

/// Product card containers on a listing page.
pub const DEFAULT_CONTAINERS: &[&str] = &[
    r#"[data-qa-locator="product-item"]"#,
    ".gridItem--Yd0sa",
    r#"[data-tracking="product-card"]"#,
    ".search-card-item",
    ".c2prKC",
];

/// Any of these appearing means the listing finished rendering.
pub const DEFAULT_READY: &[&str] = &[
    r#"[data-qa-locator="product-item"]"#,
    ".gridItem--Yd0sa",
    r#"[data-tracking="product-card"]"#,
    ".search-card-item",
];

pub const DEFAULT_TITLE: &[&str] = &[
    ".title--wFj93 a",
    "a.title--wFj93",
    ".title a",
    r#"[data-qa-locator="product-item"] .c16H9d a"#,
    ".c16H9d a",
    "a[title]",
    "h3 a",
];

pub const DEFAULT_PRICE: &[&str] = &[
    ".price--NVB62",
    ".price span",
    ".c13VH6",
    ".current-price",
    r#"[data-qa-locator="product-price"]"#,
];

pub const DEFAULT_ORIGINAL_PRICE: &[&str] = &[".origPrice--AoCxF", ".original-price", ".c1hkC1"];

pub const DEFAULT_RATING: &[&str] = &[".rating--ZI3Ol", ".rating", ".c6LcCO"];

pub const DEFAULT_REVIEWS: &[&str] = &[".rate--DCc0D", ".rate", ".c6LcCO + span"];

pub const DEFAULT_IMAGE: &[&str] = &[
    ".image--WOyuZ img",
    ".image img",
    r#"img[data-qa-locator="product-image"]"#,
    "img",
];

fn owned(patterns: &[&str]) -> Vec<String> {
    patterns.iter().map(|s| s.to_string()).collect()
}

fn default_containers() -> Vec<String> {
    owned(DEFAULT_CONTAINERS)
}

fn default_ready() -> Vec<String> {
    owned(DEFAULT_READY)
}

fn default_title() -> Vec<String> {
    owned(DEFAULT_TITLE)
}

fn default_price() -> Vec<String> {
    owned(DEFAULT_PRICE)
}

fn default_original_price() -> Vec<String> {
    owned(DEFAULT_ORIGINAL_PRICE)
}

fn default_rating() -> Vec<String> {
    owned(DEFAULT_RATING)
}

fn default_reviews() -> Vec<String> {
    owned(DEFAULT_REVIEWS)
}

fn default_image() -> Vec<String> {
    owned(DEFAULT_IMAGE)
}

/// Selector lists as written in the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectorConfig {
    #[serde(default = "default_containers")]
    pub containers: Vec<String>,
    /// Patterns the browser waits for before reading the page.
    #[serde(default = "default_ready")]
    pub ready: Vec<String>,
    #[serde(default = "default_title")]
    pub title: Vec<String>,
    #[serde(default = "default_price")]
    pub price: Vec<String>,
    #[serde(default = "default_original_price")]
    pub original_price: Vec<String>,
    #[serde(default = "default_rating")]
    pub rating: Vec<String>,
    #[serde(default = "default_reviews")]
    pub reviews: Vec<String>,
    #[serde(default = "default_image")]
    pub image: Vec<String>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            containers: default_containers(),
            ready: default_ready(),
            title: default_title(),
            price: default_price(),
            original_price: default_original_price(),
            rating: default_rating(),
            reviews: default_reviews(),
            image: default_image(),
        }
    }
}

/// A ranked list of compiled selectors for one field.
#[derive(Debug, Clone)]
pub struct SelectorList {
    field: &'static str,
    entries: Vec<(String, Selector)>,
}

impl SelectorList {
    /// Compile patterns in order. Any invalid pattern fails the whole list.
    pub fn compile(field: &'static str, patterns: &[String]) -> Result<Self, ScrapeError> {
        let entries = patterns
            .iter()
            .map(|pattern| {
                Selector::parse(pattern)
                    .map(|selector| (pattern.clone(), selector))
                    .map_err(|e| ScrapeError::InvalidSelector {
                        field,
                        pattern: pattern.clone(),
                        message: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { field, entries })
    }

    pub fn field(&self) -> &'static str {
        self.field
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(p, _)| p.as_str())
    }

    /// First element under `root` matched by the highest-ranked selector that
    /// matches anything.
    pub fn first_match<'a>(&self, root: ElementRef<'a>) -> Option<ElementRef<'a>> {
        self.first_match_where(root, |_| true)
    }

    /// Like [`first_match`](Self::first_match), but skips elements `accept`
    /// rejects and keeps probing lower-ranked selectors.
    pub fn first_match_where<'a, F>(&self, root: ElementRef<'a>, accept: F) -> Option<ElementRef<'a>>
    where
        F: Fn(&ElementRef<'a>) -> bool,
    {
        self.entries
            .iter()
            .find_map(|(_, selector)| root.select(selector).find(|el| accept(el)))
    }

    /// All elements of `document` matched by the first selector that matches
    /// anything, together with that selector's pattern.
    pub fn select_first_nonempty<'a>(&self, document: &'a Html) -> Option<(&str, Vec<ElementRef<'a>>)> {
        self.entries.iter().find_map(|(pattern, selector)| {
            let found: Vec<ElementRef<'a>> = document.select(selector).collect();
            (!found.is_empty()).then(|| (pattern.as_str(), found))
        })
    }
}

/// Field selectors applied inside one product card.
#[derive(Debug, Clone)]
pub struct CardSelectors {
    pub title: SelectorList,
    pub price: SelectorList,
    pub original_price: SelectorList,
    pub rating: SelectorList,
    pub reviews: SelectorList,
    pub image: SelectorList,
}

/// Every selector table the scraper needs, validated up front.
#[derive(Debug, Clone)]
pub struct CompiledSelectors {
    pub containers: SelectorList,
    pub ready: Vec<String>,
    pub card: CardSelectors,
}

impl CompiledSelectors {
    pub fn compile(config: &SelectorConfig) -> Result<Self, ScrapeError> {
        // Ready patterns run in the browser, but reject typos here all the same.
        SelectorList::compile("ready", &config.ready)?;

        Ok(Self {
            containers: SelectorList::compile("container", &config.containers)?,
            ready: config.ready.clone(),
            card: CardSelectors {
                title: SelectorList::compile("title", &config.title)?,
                price: SelectorList::compile("price", &config.price)?,
                original_price: SelectorList::compile("original_price", &config.original_price)?,
                rating: SelectorList::compile("rating", &config.rating)?,
                reviews: SelectorList::compile("reviews", &config.reviews)?,
                image: SelectorList::compile("image", &config.image)?,
            },
        })
    }

    pub fn defaults() -> Result<Self, ScrapeError> {
        Self::compile(&SelectorConfig::default())
    }
}
