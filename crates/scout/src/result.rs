// ABOUTME: Result types: ProductMetadata, its validation, the extraction report and the product draft.
// ABOUTME: Missing fields are modelled as values so callers can branch to manual entry instead of handling errors.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::platform::{detect_platform, Platform};
use crate::quantity::ParsedQuantity;
use crate::retrieval::Attempt;

/// Commerce metadata recovered from a product page.
///
/// Every field is optional because any extraction step may come up empty.
/// `title` and `image` gate success; `price` and `description` are best-effort.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Absolute image URL once the client has resolved it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Price text; digits only when it came from the DOM fallback.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ProductMetadata {
    /// True when both gating fields are present.
    pub fn is_complete(&self) -> bool {
        self.title.is_some() && self.image.is_some()
    }

    /// Report which gating fields are missing.
    pub fn validate(&self) -> Validation {
        let mut missing = Vec::new();
        if self.title.is_none() {
            missing.push(RequiredField::Title);
        }
        if self.image.is_none() {
            missing.push(RequiredField::Image);
        }
        Validation { missing }
    }

    /// Price as a number when the text is numeric, e.g. `12900` or `1990.5`.
    ///
    /// Grouped or decorated text such as `13,500` or `₩32,000` is `None`.
    pub fn price_value(&self) -> Option<f64> {
        let price = self.price.as_deref()?.trim();
        if price.is_empty() {
            return None;
        }
        price.parse::<f64>().ok().filter(|p| p.is_finite())
    }
}

/// A field the caller needs before a product can be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequiredField {
    Title,
    Image,
}

impl RequiredField {
    /// Message shown when the field could not be extracted.
    pub fn message(self) -> &'static str {
        match self {
            RequiredField::Title => "product title not found",
            RequiredField::Image => "product image not found",
        }
    }
}

impl fmt::Display for RequiredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RequiredField::Title => "title",
            RequiredField::Image => "image",
        };
        write!(f, "{}", s)
    }
}

/// Outcome of [`ProductMetadata::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Validation {
    pub missing: Vec<RequiredField>,
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        self.missing.is_empty()
    }

    /// User-facing messages, one per missing field.
    pub fn errors(&self) -> Vec<&'static str> {
        self.missing.iter().map(|f| f.message()).collect()
    }
}

/// Metadata together with how it was obtained.
#[derive(Debug, Clone, Serialize)]
pub struct Extraction {
    pub url: String,
    pub platform: Platform,
    pub metadata: ProductMetadata,
    /// Quantities read from the title (compound form yields two).
    pub quantities: Vec<ParsedQuantity>,
    /// Strategy that delivered the HTML.
    pub strategy: String,
    pub attempts: Vec<Attempt>,
}

/// Whole prices are written as JSON integers.
fn serialize_price<S: serde::Serializer>(price: &Option<f64>, s: S) -> Result<S::Ok, S::Error> {
    match price {
        Some(p) if p.fract() == 0.0 && *p >= 0.0 && *p <= u64::MAX as f64 => {
            s.serialize_some(&(*p as u64))
        }
        Some(p) => s.serialize_some(p),
        None => s.serialize_none(),
    }
}

/// A product record prefilled from a shared link, ready for manual correction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductDraft {
    pub name: Option<String>,
    pub thumbnail: Option<String>,
    #[serde(serialize_with = "serialize_price")]
    pub price: Option<f64>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub original_url: String,
    pub platform: Platform,
    /// Gating fields extraction could not fill.
    pub missing: Vec<RequiredField>,
}

impl ProductDraft {
    /// Build a draft from extracted metadata.
    pub fn from_metadata(
        original_url: impl Into<String>,
        platform: Platform,
        metadata: &ProductMetadata,
        quantity: Option<&ParsedQuantity>,
    ) -> Self {
        Self {
            name: metadata.title.clone(),
            thumbnail: metadata.image.clone(),
            price: metadata.price_value(),
            quantity: quantity.map(|q| q.quantity),
            unit: quantity.map(|q| q.unit.clone()),
            original_url: original_url.into(),
            platform,
            missing: metadata.validate().missing,
        }
    }

    /// Empty draft for manual entry after extraction failed.
    pub fn manual(original_url: impl Into<String>) -> Self {
        let original_url = original_url.into();
        Self {
            name: None,
            thumbnail: None,
            price: None,
            quantity: None,
            unit: None,
            platform: detect_platform(&original_url),
            original_url,
            missing: vec![RequiredField::Title, RequiredField::Image],
        }
    }

    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}
