//! Product card field extraction and URL normalization.

use scraper::ElementRef;
use url::Url;

use super::error::ScrapeError;
use super::selectors::CardSelectors;
use crate::models::{ExtractedProduct, NOT_AVAILABLE, NO_RATING, NO_REVIEWS};

/// Resolve a path to a full URL, handling both absolute and relative paths.
///
/// Values that already carry a scheme are returned untouched, so resolving
/// twice is a no-op. Empty input stays empty.
pub fn resolve_url(base_url: &Url, path: &str) -> Result<String, url::ParseError> {
    if path.is_empty() || Url::parse(path).is_ok() {
        return Ok(path.to_string());
    }
    base_url.join(path).map(String::from)
}

/// Parse a displayed price such as `Rs. 1,299.50` into a number.
///
/// Thousands separators and everything that is not a digit or a decimal
/// point are dropped. Dots left dangling by currency abbreviations
/// (the `.` in `Rs.`) are trimmed before parsing, so `Rs. 1,299.50` reads
/// as `1299.5` rather than failing on a leading `.1299.50`.
pub fn parse_price(text: &str) -> Option<f64> {
    let cleaned: String = text
        .replace(',', "")
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    cleaned.trim_matches('.').parse::<f64>().ok()
}

/// Percentage saved between an original and a current price, as `"<n>% off"`.
///
/// Absent when either price is unparseable, when the original is not
/// strictly higher, or when the saving truncates to zero.
pub fn compute_discount(price: &str, original_price: &str) -> Option<String> {
    let current = parse_price(price)?;
    let original = parse_price(original_price)?;
    if original <= current {
        return None;
    }
    let percent = (((original - current) / original) * 100.0).floor() as u32;
    (percent > 0).then(|| format!("{}% off", percent))
}

/// Trimmed text content of an element.
pub fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Pulls normalized product fields out of listing cards.
pub struct FieldExtractor<'s> {
    selectors: &'s CardSelectors,
    base_url: &'s Url,
}

impl<'s> FieldExtractor<'s> {
    pub fn new(selectors: &'s CardSelectors, base_url: &'s Url) -> Self {
        Self {
            selectors,
            base_url,
        }
    }

    /// Extract one card. Unmatched fields fall back to their placeholders.
    pub fn extract(&self, card: ElementRef<'_>) -> Result<ExtractedProduct, ScrapeError> {
        let s = self.selectors;

        let title_elem = s.title.first_match(card);
        let title = title_elem
            .as_ref()
            .map(element_text)
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());
        let product_url = match title_elem.and_then(|el| el.value().attr("href")) {
            Some(href) => resolve_url(self.base_url, href.trim())?,
            None => String::new(),
        };

        let price = s.price.first_match(card).map(|el| element_text(&el));
        let original_price = s.original_price.first_match(card).map(|el| element_text(&el));
        let discount = match (&price, &original_price) {
            (Some(current), Some(original)) => compute_discount(current, original),
            _ => None,
        };

        let rating = s
            .rating
            .first_match(card)
            .map(|el| {
                el.value()
                    .attr("aria-label")
                    .map(str::trim)
                    .filter(|label| !label.is_empty())
                    .map(str::to_string)
                    .unwrap_or_else(|| element_text(&el))
            })
            .unwrap_or_else(|| NO_RATING.to_string());

        let reviews = s
            .reviews
            .first_match(card)
            .map(|el| element_text(&el))
            .unwrap_or_else(|| NO_REVIEWS.to_string());

        let image_src = s
            .image
            .first_match_where(card, |el| {
                el.value().attr("src").is_some_and(|src| !src.trim().is_empty())
            })
            .and_then(|el| el.value().attr("src"));
        let image_url = match image_src {
            Some(src) => resolve_url(self.base_url, src.trim())?,
            None => NOT_AVAILABLE.to_string(),
        };

        Ok(ExtractedProduct {
            title,
            price: price.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            original_price,
            discount,
            rating,
            reviews,
            image_url,
            product_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::selectors::CompiledSelectors;
    use scraper::{Html, Selector};

    const BASE: &str = "https://www.daraz.com.np";

    fn extract_card(card_html: &str) -> ExtractedProduct {
        let html = Html::parse_fragment(&format!(
            r#"<div data-qa-locator="product-item">{}</div>"#,
            card_html
        ));
        let card_selector = Selector::parse(r#"[data-qa-locator="product-item"]"#).unwrap();
        let card = html.select(&card_selector).next().unwrap();
        let selectors = CompiledSelectors::defaults().unwrap();
        let base = Url::parse(BASE).unwrap();
        FieldExtractor::new(&selectors.card, &base)
            .extract(card)
            .unwrap()
    }

    #[test]
    fn test_resolve_url_relative() {
        let base = Url::parse(BASE).unwrap();
        assert_eq!(
            resolve_url(&base, "/p/123").unwrap(),
            "https://www.daraz.com.np/p/123"
        );
        assert_eq!(
            resolve_url(&base, "//img.drz.lazcdn.com/a.jpg").unwrap(),
            "https://img.drz.lazcdn.com/a.jpg"
        );
    }

    #[test]
    fn test_resolve_url_absolute_is_unchanged() {
        let base = Url::parse(BASE).unwrap();
        let absolute = "https://static-01.daraz.com.np/p/x.jpg?w=200";
        let once = resolve_url(&base, absolute).unwrap();
        assert_eq!(once, absolute);
        assert_eq!(resolve_url(&base, &once).unwrap(), once);

        let relative_once = resolve_url(&base, "products/a-i1.html").unwrap();
        assert_eq!(resolve_url(&base, &relative_once).unwrap(), relative_once);
    }

    #[test]
    fn test_resolve_url_empty() {
        let base = Url::parse(BASE).unwrap();
        assert_eq!(resolve_url(&base, "").unwrap(), "");
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("Rs. 1,000"), Some(1000.0));
        assert_eq!(parse_price("Rs. 1,299.50"), Some(1299.5));
        assert_eq!(parse_price("रु 450"), Some(450.0));
        assert_eq!(parse_price("Rs."), None);
        assert_eq!(parse_price("free"), None);
        assert_eq!(parse_price("1.2.3"), None);
        assert_eq!(
            compute_discount("Rs. 1,130.00", "Rs. 1,299.50"),
            Some("13% off".to_string())
        );
    }

    #[test]
    fn test_compute_discount() {
        assert_eq!(
            compute_discount("Rs. 1,000", "Rs. 2,000"),
            Some("50% off".to_string())
        );
        // 1 - 649/999 = 35.03...%
        assert_eq!(
            compute_discount("Rs. 649", "Rs. 999"),
            Some("35% off".to_string())
        );
        assert_eq!(compute_discount("Rs. 100", "Rs. 90"), None);
        assert_eq!(compute_discount("Rs. 100", "Rs. 100"), None);
        assert_eq!(compute_discount("Rs. 100", "-"), None);
        assert_eq!(compute_discount("N/A", "Rs. 100"), None);
        // Saving rounds down to 0%
        assert_eq!(compute_discount("Rs. 999.5", "Rs. 1,000"), None);
    }

    #[test]
    fn test_extract_full_card() {
        let product = extract_card(
            r#"<a class="title--wFj93" href="/p/123">Shoe</a>
               <span class="price--NVB62">Rs. 1,000</span>
               <span class="origPrice--AoCxF">Rs. 2,000</span>"#,
        );
        assert_eq!(product.title, "Shoe");
        assert_eq!(product.price, "Rs. 1,000");
        assert_eq!(product.original_price.as_deref(), Some("Rs. 2,000"));
        assert_eq!(product.discount.as_deref(), Some("50% off"));
        assert_eq!(product.product_url, "https://www.daraz.com.np/p/123");
    }

    #[test]
    fn test_extract_placeholders_when_nothing_matches() {
        let product = extract_card("<p>sold out</p>");
        assert_eq!(product.title, NOT_AVAILABLE);
        assert!(!product.has_title());
        assert_eq!(product.price, NOT_AVAILABLE);
        assert_eq!(product.original_price, None);
        assert_eq!(product.discount, None);
        assert_eq!(product.rating, NO_RATING);
        assert_eq!(product.reviews, NO_REVIEWS);
        assert_eq!(product.image_url, NOT_AVAILABLE);
        assert_eq!(product.product_url, "");
    }

    #[test]
    fn test_extract_title_without_href() {
        let product = extract_card(r#"<div class="title--wFj93"><a>Bag</a></div>"#);
        assert_eq!(product.title, "Bag");
        assert_eq!(product.product_url, "");
    }

    #[test]
    fn test_extract_rating_prefers_aria_label() {
        let labelled = extract_card(
            r#"<a title="x" href="/p/1">X</a><div class="rating--ZI3Ol" aria-label="4.5 out of 5">★★★★</div>"#,
        );
        assert_eq!(labelled.rating, "4.5 out of 5");

        let text_only =
            extract_card(r#"<a title="x" href="/p/1">X</a><div class="rating">4.2</div>"#);
        assert_eq!(text_only.rating, "4.2");
    }

    #[test]
    fn test_extract_reviews() {
        let product = extract_card(
            r#"<a title="x" href="/p/1">X</a><span class="rate--DCc0D">(128)</span>"#,
        );
        assert_eq!(product.reviews, "(128)");
    }

    #[test]
    fn test_extract_image_skips_missing_src() {
        let product = extract_card(
            r#"<a title="x" href="/p/1">X</a>
               <div class="image--WOyuZ"><img alt="placeholder"></div>
               <img src="//img.drz.lazcdn.com/real.jpg">"#,
        );
        assert_eq!(product.image_url, "https://img.drz.lazcdn.com/real.jpg");
    }

    #[test]
    fn test_extract_keeps_absolute_links() {
        let product = extract_card(
            r#"<a class="title--wFj93" href="https://www.daraz.com.np/products/x-i9.html">X</a>
               <img src="https://static-01.daraz.com.np/x.jpg">"#,
        );
        assert_eq!(
            product.product_url,
            "https://www.daraz.com.np/products/x-i9.html"
        );
        assert_eq!(product.image_url, "https://static-01.daraz.com.np/x.jpg");
    }

    #[test]
    fn test_extract_no_discount_when_original_is_lower() {
        let product = extract_card(
            r#"<a title="x" href="/p/1">X</a>
               <span class="price--NVB62">Rs. 100</span>
               <span class="origPrice--AoCxF">Rs. 90</span>"#,
        );
        assert_eq!(product.original_price.as_deref(), Some("Rs. 90"));
        assert_eq!(product.discount, None);
    }

    #[test]
    fn test_extract_fails_on_unjoinable_href() {
        let html = Html::parse_fragment(
            r#"<div data-qa-locator="product-item"><a class="title--wFj93" href="//[bad">X</a></div>"#,
        );
        let card_selector = Selector::parse(r#"[data-qa-locator="product-item"]"#).unwrap();
        let card = html.select(&card_selector).next().unwrap();
        let selectors = CompiledSelectors::defaults().unwrap();
        let base = Url::parse(BASE).unwrap();
        let result = FieldExtractor::new(&selectors.card, &base).extract(card);
        assert!(matches!(result, Err(ScrapeError::Url(_))));
    }
}
