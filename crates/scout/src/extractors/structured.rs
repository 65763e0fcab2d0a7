// ABOUTME: JSON-LD Product extraction for pages of the priority platform.
// ABOUTME: Scans ld+json blocks in order, skips malformed ones and maps the first named Product to metadata.

//! Structured-data extraction.
//!
//! Key behaviors:
//! - Only runs for pages recognised as belonging to the priority platform.
//! - Blocks are scanned in document order; a block that fails to parse is
//!   skipped, never reported as an error.
//! - A block may hold one object, an array of objects or an `@graph`.
//!   The first node typed `Product` that has a non-empty `name` wins.
//! - Fields are decoded one at a time, so an odd `description` or `offers`
//!   only loses that field, not the product.

use scraper::Selector;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::extractors::Page;
use crate::result::ProductMetadata;

/// A value that may be given once or as a list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    fn first(&self) -> Option<&T> {
        match self {
            OneOrMany::One(v) => Some(v),
            OneOrMany::Many(vs) => vs.first(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ImageLd {
    Url(String),
    Object { url: Option<String> },
}

impl ImageLd {
    fn url(&self) -> Option<&str> {
        match self {
            ImageLd::Url(u) => Some(u),
            ImageLd::Object { url } => url.as_deref(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PriceLd {
    Number(serde_json::Number),
    Text(String),
}

impl PriceLd {
    fn render(&self) -> String {
        match self {
            PriceLd::Text(s) => s.trim().to_string(),
            PriceLd::Number(n) => match n.as_f64() {
                Some(f) if n.is_f64() && f.fract() == 0.0 => format!("{:.0}", f),
                _ => n.to_string(),
            },
        }
    }
}

/// Decode one field of a node on its own; a malformed field is `None`.
fn field<T: DeserializeOwned>(node: &Value, key: &str) -> Option<T> {
    let value = node.get(key)?;
    match T::deserialize(value) {
        Ok(v) => Some(v),
        Err(e) => {
            debug!(component = "structured", outcome = "field_skipped", field = key, detail = %e, "unexpected JSON-LD field shape");
            None
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    let t = s.trim();
    (!t.is_empty()).then(|| t.to_string())
}

/// True when `@type` is `Product` or a list containing it.
fn is_product(node: &Value) -> bool {
    match node.get("@type") {
        Some(Value::String(t)) => t == "Product",
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some("Product")),
        _ => false,
    }
}

/// Price of an offer node: `price`, else the first `priceSpecification.price`.
fn offer_price(offer: &Value) -> Option<String> {
    let direct = field::<PriceLd>(offer, "price");
    let nested = || {
        let spec = match offer.get("priceSpecification")? {
            Value::Array(specs) => specs.first()?,
            other => other,
        };
        field::<PriceLd>(spec, "price")
    };
    direct
        .or_else(nested)
        .map(|p| p.render())
        .filter(|p| !p.is_empty())
}

/// Map a `Product` node onto metadata, reading each field independently.
fn product_metadata(node: &Value) -> Option<ProductMetadata> {
    if !is_product(node) {
        return None;
    }
    let title = node.get("name").and_then(Value::as_str).and_then(non_empty)?;

    let image = field::<OneOrMany<ImageLd>>(node, "image")
        .as_ref()
        .and_then(|i| i.first())
        .and_then(ImageLd::url)
        .and_then(non_empty);
    let price = match node.get("offers") {
        Some(Value::Array(offers)) => offers.first().and_then(offer_price),
        Some(offer) => offer_price(offer),
        None => None,
    };
    let description = field::<String>(node, "description")
        .as_deref()
        .and_then(non_empty);

    Some(ProductMetadata {
        title: Some(title),
        image,
        price,
        description,
    })
}

/// Flatten a parsed block into candidate nodes: the object itself, the
/// elements of a top-level array, and members of `@graph`.
fn candidates(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.into_iter().flat_map(candidates).collect(),
        Value::Object(mut map) => match map.remove("@graph") {
            Some(Value::Array(graph)) => graph,
            Some(other) => {
                map.insert("@graph".to_string(), other);
                vec![Value::Object(map)]
            }
            None => vec![Value::Object(map)],
        },
        _ => Vec::new(),
    }
}

/// Extract metadata from the page's first named JSON-LD Product.
///
/// Returns `None` for pages outside the priority platform and when no block
/// yields a product. The result may still lack the image or price.
pub fn extract_structured(page: &Page<'_>) -> Option<ProductMetadata> {
    if !page.is_priority() {
        return None;
    }

    let selector = Selector::parse(r#"script[type="application/ld+json"]"#).ok()?;

    for (index, script) in page.doc.select(&selector).enumerate() {
        let text = script.text().collect::<String>();
        let text = text.trim();
        if text.is_empty() {
            continue;
        }

        let value: Value = match serde_json::from_str(text) {
            Ok(v) => v,
            Err(e) => {
                debug!(component = "structured", outcome = "skipped", block = index, detail = %e, "malformed JSON-LD block");
                continue;
            }
        };

        for node in candidates(value) {
            if let Some(metadata) = product_metadata(&node) {
                debug!(
                    component = "structured",
                    outcome = "found",
                    block = index,
                    has_image = metadata.image.is_some(),
                    has_price = metadata.price.is_some(),
                    "JSON-LD product found"
                );
                return Some(metadata);
            }
        }
    }

    debug!(component = "structured", outcome = "none", "no JSON-LD product on page");
    None
}
