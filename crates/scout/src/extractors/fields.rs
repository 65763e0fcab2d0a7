// ABOUTME: Selector helpers shared by the structured and generic extractors.
// ABOUTME: Extracts meta content, attributes, normalized text and digit-only prices with fallback selectors.

//! Field extraction helpers.
//!
//! Key behaviors:
//! - Selectors are tried in order; first non-empty match wins.
//! - Whitespace is normalized (collapsed to single spaces, trimmed).
//! - Empty strings are treated as no match.

use scraper::{Html, Selector};

/// Normalizes whitespace in a string by collapsing runs of whitespace into single spaces.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keep only ASCII digits. `"12,900원"` becomes `"12900"`.
pub fn digits_only(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Extracts the `content` attribute from the first matching meta tag.
pub fn extract_meta_content(doc: &Html, selector: &str) -> Option<String> {
    extract_attr_first(doc, selector, "content")
}

/// Extracts an attribute value from the first matching element with a non-empty value.
pub fn extract_attr_first(doc: &Html, selector: &str, attr: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    for el in doc.select(&sel) {
        if let Some(value) = el.value().attr(attr) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }
    None
}

/// Extracts normalized inner text of the first element matching `selector`.
///
/// Only the first element is considered, so an empty first match is `None`
/// even when later elements carry text.
pub fn extract_text_first(doc: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    let el = doc.select(&sel).next()?;
    let text: String = el.text().collect::<Vec<_>>().join(" ");
    let normalized = normalize_whitespace(&text);
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

/// Extracts text content from the first selector that yields a non-empty match.
///
/// Selectors starting with `meta[` read the `content` attribute; anything
/// else reads the first matching element's inner text.
pub fn extract_field_text_single(doc: &Html, selectors: &[&str]) -> Option<String> {
    selectors.iter().find_map(|sel| {
        if sel.starts_with("meta[") {
            extract_meta_content(doc, sel)
        } else {
            extract_text_first(doc, sel)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_HTML: &str = r#"
        <!DOCTYPE html>
        <html>
        <head>
            <title>  Sample
                Page </title>
            <meta property="og:title" content="  OG Title  ">
            <meta property="og:image" content="">
        </head>
        <body>
            <span class="price">12,900원</span>
            <span class="empty">   </span>
            <img src="/local.jpg">
        </body>
        </html>
    "#;

    fn parse_html() -> Html {
        Html::parse_document(SAMPLE_HTML)
    }

    #[test]
    fn test_extract_meta_content_trims() {
        let doc = parse_html();
        assert_eq!(
            extract_meta_content(&doc, "meta[property='og:title']"),
            Some("OG Title".to_string())
        );
    }

    #[test]
    fn test_empty_meta_content_is_none() {
        let doc = parse_html();
        assert!(extract_meta_content(&doc, "meta[property='og:image']").is_none());
    }

    #[test]
    fn test_extract_attr_first_img_src() {
        let doc = parse_html();
        assert_eq!(
            extract_attr_first(&doc, "img", "src"),
            Some("/local.jpg".to_string())
        );
    }

    #[test]
    fn test_extract_text_first_normalizes_whitespace() {
        let doc = parse_html();
        assert_eq!(
            extract_text_first(&doc, "title"),
            Some("Sample Page".to_string())
        );
        assert!(extract_text_first(&doc, ".empty").is_none());
    }

    #[test]
    fn test_extract_field_text_single_mixes_meta_and_text() {
        let doc = parse_html();
        assert_eq!(
            extract_field_text_single(&doc, &["meta[name='nope']", "title"]),
            Some("Sample Page".to_string())
        );
        assert!(extract_field_text_single(&doc, &[".foo", ".bar"]).is_none());
    }

    #[test]
    fn test_invalid_selector_is_no_match() {
        let doc = parse_html();
        assert!(extract_attr_first(&doc, "[[[", "src").is_none());
    }

    #[test]
    fn test_digits_only() {
        assert_eq!(digits_only("12,900원"), "12900");
        assert_eq!(digits_only("₩ 1 000"), "1000");
        assert_eq!(digits_only("가격 문의"), "");
    }
}
