// ABOUTME: Generic metadata extraction from social meta tags and plain HTML fallbacks.
// ABOUTME: Fills only fields still absent and scans platform price selectors when no price was found.

//! Generic metadata extraction.
//!
//! Field priority: `og:*` meta tag, then the plain HTML equivalent. Values
//! already present on the seed metadata are never overwritten.

use tracing::{debug, warn};

use crate::extractors::fields::{digits_only, extract_field_text_single, extract_text_first};
use crate::extractors::Page;
use crate::result::ProductMetadata;

/// Title sources in priority order.
const TITLE_SELECTORS: &[&str] = &["meta[property='og:title']", "title"];

/// Image sources in priority order.
const IMAGE_SELECTORS: &[&str] = &["meta[property='og:image']"];

/// Description sources in priority order.
const DESCRIPTION_SELECTORS: &[&str] = &[
    "meta[property='og:description']",
    "meta[name='description']",
];

/// Price nodes on priority platform pages, most accurate first.
///
/// The original/list price is a real price but not what the buyer pays, so
/// it only counts when neither the final nor the sale price is shown.
pub const PRICE_SELECTORS: &[(&str, &str)] = &[
    (".final-price-amount", "final"),
    (".sales-price-amount", "sale"),
    (".original-price-amount", "original"),
];

/// Scan the price selectors and return the first digit-bearing price.
pub fn extract_dom_price(page: &Page<'_>) -> Option<String> {
    for (selector, label) in PRICE_SELECTORS {
        let Some(text) = extract_text_first(&page.doc, selector) else {
            continue;
        };
        let price = digits_only(&text);
        if price.is_empty() {
            continue;
        }
        if *label == "original" {
            warn!(component = "generic", field = "price", outcome = "fallback", price = %price, "only the list price was found");
        } else {
            debug!(component = "generic", field = "price", outcome = "found", source = *label, price = %price, "price read from DOM");
        }
        return Some(price);
    }
    warn!(component = "generic", field = "price", outcome = "missing", "no price node on page");
    None
}

/// Fill missing fields of `seed` from meta tags and HTML fallbacks.
pub fn extract_generic(page: &Page<'_>, seed: ProductMetadata) -> ProductMetadata {
    let fill = |current: Option<String>, selectors: &[&str], field: &str| {
        current.or_else(|| {
            let found = extract_field_text_single(&page.doc, selectors);
            if found.is_some() {
                debug!(component = "generic", field, outcome = "filled", "field filled from markup");
            }
            found
        })
    };

    let title = fill(seed.title, TITLE_SELECTORS, "title");
    let image = fill(seed.image, IMAGE_SELECTORS, "image");
    let description = fill(seed.description, DESCRIPTION_SELECTORS, "description");

    let price = match seed.price {
        Some(p) => Some(p),
        None if page.is_priority() => extract_dom_price(page),
        None => None,
    };

    ProductMetadata {
        title,
        image,
        price,
        description,
    }
}
