// ABOUTME: Platform detection, URL normalization and product-link validation.
// ABOUTME: All functions are total: malformed input maps to a fallback value instead of an error.

//! URL classification for the priority platform.
//!
//! Key behaviors:
//! - Platform detection is a hostname substring match on `coupang.com`.
//! - Normalization keeps only the identifying query parameters of priority
//!   platform links and leaves every other URL untouched.
//! - Validation accepts the link-shortener host unconditionally, otherwise
//!   requires a products path or an `itemId` parameter.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

/// Hostname fragment identifying the priority platform.
pub const PRIORITY_HOST: &str = "coupang.com";

/// Link-shortener host of the priority platform.
const SHORTLINK_HOST: &str = "link.coupang.com";

/// Query parameters that identify a product; everything else is tracking noise.
const KEPT_PARAMS: &[&str] = &["itemId", "vendorItemId"];

/// The e-commerce platform a URL belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Coupang,
    #[default]
    Unknown,
}

impl Platform {
    /// Returns true for the platform with structured-data and price tuning.
    pub fn is_priority(self) -> bool {
        self == Platform::Coupang
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Platform::Coupang => "coupang",
            Platform::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

fn lowercase_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Classify the platform of a URL from its hostname.
pub fn detect_platform(url: &str) -> Platform {
    match Url::parse(url).ok().as_ref().and_then(lowercase_host) {
        Some(host) if host.contains(PRIORITY_HOST) => Platform::Coupang,
        _ => Platform::Unknown,
    }
}

/// Strip tracking parameters from a priority platform URL.
///
/// Only `itemId` and `vendorItemId` survive, in that order. URLs of other
/// platforms and unparseable strings are returned unchanged.
pub fn normalize_url(url: &str) -> String {
    let mut parsed = match Url::parse(url) {
        Ok(u) => u,
        Err(_) => return url.to_string(),
    };

    match lowercase_host(&parsed) {
        Some(host) if host.contains(PRIORITY_HOST) => {}
        _ => return url.to_string(),
    }

    let kept: Vec<(&str, String)> = KEPT_PARAMS
        .iter()
        .filter_map(|&name| {
            parsed
                .query_pairs()
                .find(|(k, v)| k == name && !v.is_empty())
                .map(|(_, v)| (name, v.into_owned()))
        })
        .collect();

    if kept.is_empty() {
        parsed.set_query(None);
    } else {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(kept.iter().map(|(k, v)| (*k, v.as_str())))
            .finish();
        parsed.set_query(Some(&query));
    }

    parsed.to_string()
}

/// Check that a URL is a product link of the priority platform.
pub fn is_valid_product_url(url: &str) -> bool {
    let parsed = match Url::parse(url) {
        Ok(u) => u,
        Err(_) => return false,
    };
    let host = match lowercase_host(&parsed) {
        Some(h) => h,
        None => return false,
    };

    if !host.contains(PRIORITY_HOST) {
        return false;
    }
    if host.contains(SHORTLINK_HOST) {
        return true;
    }

    parsed.path().contains("/products/") || parsed.query_pairs().any(|(k, _)| k == "itemId")
}
