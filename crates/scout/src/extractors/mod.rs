// ABOUTME: Product metadata extraction: the parsed Page wrapper and the ordered extractor pipeline.
// ABOUTME: Structured data runs first for the priority platform; generic extraction fills whatever is left.

//! Metadata extraction.
//!
//! Submodules:
//! - `fields`: selector helpers shared by the extractors.
//! - `structured`: JSON-LD `Product` extraction for the priority platform.
//! - `generic`: social meta tags, plain HTML fallbacks and DOM prices.

pub mod fields;
pub mod generic;
pub mod structured;

use scraper::Html;
use tracing::debug;

use crate::platform::{detect_platform, PRIORITY_HOST};
use crate::result::ProductMetadata;

pub use generic::{extract_dom_price, extract_generic};
pub use structured::extract_structured;

/// A fetched page: its URL, raw HTML and parsed document.
pub struct Page<'a> {
    pub url: &'a str,
    pub raw_html: &'a str,
    pub doc: Html,
}

impl<'a> Page<'a> {
    pub fn parse(url: &'a str, raw_html: &'a str) -> Self {
        Self {
            url,
            raw_html,
            doc: Html::parse_document(raw_html),
        }
    }

    /// True when the page belongs to the priority platform, judged by its
    /// URL or by the markup mentioning the platform's host.
    pub fn is_priority(&self) -> bool {
        detect_platform(self.url).is_priority() || self.raw_html.contains(PRIORITY_HOST)
    }
}

/// Run the extractors in priority order.
///
/// Structured data that already carries a title and an image is returned as
/// is; otherwise the generic extractor fills the gaps.
pub fn extract_metadata(page: &Page<'_>) -> ProductMetadata {
    let seed = match extract_structured(page) {
        Some(meta) if meta.is_complete() => {
            debug!(component = "extract", outcome = "structured", url = page.url, "structured data complete");
            return meta;
        }
        Some(partial) => partial,
        None => ProductMetadata::default(),
    };

    let meta = extract_generic(page, seed);
    debug!(
        component = "extract",
        outcome = if meta.is_complete() { "complete" } else { "incomplete" },
        url = page.url,
        "metadata extracted"
    );
    meta
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const URL: &str = "https://www.coupang.com/vp/products/1";

    #[test]
    fn structured_block_beats_conflicting_meta_tags() {
        let html = r#"<html><head>
            <meta property="og:title" content="OG Title">
            <meta property="og:image" content="https://img.test/og.jpg">
            <script type="application/ld+json">
              {"@type":"Product","name":"LD Title","image":"https://img.test/ld.jpg","offers":{"price":5000}}
            </script>
        </head></html>"#;
        let meta = extract_metadata(&Page::parse(URL, html));
        assert_eq!(meta.title.as_deref(), Some("LD Title"));
        assert_eq!(meta.image.as_deref(), Some("https://img.test/ld.jpg"));
        assert_eq!(meta.price.as_deref(), Some("5000"));
    }

    #[test]
    fn structured_block_with_odd_description_still_wins() {
        let html = r#"<html><head>
            <meta property="og:title" content="OG">
            <meta property="og:image" content="https://img.test/og.jpg">
            <script type="application/ld+json">
              {"@type":"Product","name":"LD","image":"https://img.test/ld.jpg","description":{"@value":"x"}}
            </script>
        </head></html>"#;
        let meta = extract_metadata(&Page::parse(URL, html));
        assert_eq!(meta.title.as_deref(), Some("LD"));
        assert_eq!(meta.image.as_deref(), Some("https://img.test/ld.jpg"));
    }

    #[test]
    fn complete_structured_data_skips_generic_fill() {
        let html = r#"<html><head>
            <meta property="og:description" content="OG description">
            <script type="application/ld+json">{"@type":"Product","name":"LD","image":"https://img.test/ld.jpg"}</script>
        </head><body><span class="final-price-amount">1,000원</span></body></html>"#;
        let meta = extract_metadata(&Page::parse(URL, html));
        assert_eq!(meta.description, None);
        assert_eq!(meta.price, None);
    }

    #[test]
    fn partial_structured_data_is_filled() {
        let html = r#"<html><head>
            <meta property="og:title" content="OG Title">
            <meta property="og:image" content="https://img.test/og.jpg">
            <script type="application/ld+json">{"@type":"Product","name":"LD Title"}</script>
        </head><body><span class="sales-price-amount">7,500원</span></body></html>"#;
        let meta = extract_metadata(&Page::parse(URL, html));
        assert_eq!(
            meta,
            ProductMetadata {
                title: Some("LD Title".to_string()),
                image: Some("https://img.test/og.jpg".to_string()),
                price: Some("7500".to_string()),
                description: None,
            }
        );
    }

    #[test]
    fn unknown_platform_uses_generic_path_only() {
        let html = r#"<html><head>
            <title>Widget</title>
            <script type="application/ld+json">{"@type":"Product","name":"LD Widget"}</script>
        </head></html>"#;
        let meta = extract_metadata(&Page::parse("https://shop.example.com/w", html));
        assert_eq!(meta.title.as_deref(), Some("Widget"));
    }

    #[test]
    fn empty_page_yields_empty_metadata() {
        let meta = extract_metadata(&Page::parse("https://shop.example.com/w", "<html></html>"));
        assert_eq!(meta, ProductMetadata::default());
        assert!(!meta.is_complete());
    }
}
