// ABOUTME: Rule-based quantity/unit extraction from free-form product titles.
// ABOUTME: Ordered regex rules, a unit synonym table, compound "A x B" parsing and quantity formatting.

//! Quantity and unit parsing.
//!
//! Rules are tried in a fixed order and the first rule matching anywhere in
//! the text wins. Several rules share unit tokens (`개` appears in three of
//! them), so the order decides the result and must not be shuffled.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A quantity expression recognised in text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedQuantity {
    pub quantity: f64,
    /// Normalized unit token.
    pub unit: String,
    /// The substring the quantity was read from.
    pub original: String,
}

/// Unit synonyms mapped to their canonical token. Unlisted tokens pass through.
pub const UNIT_SYNONYMS: &[(&str, &str)] = &[
    ("개입", "개"),
    ("입", "개"),
    ("그램", "g"),
    ("킬로그램", "kg"),
    ("리터", "L"),
    ("밀리리터", "ml"),
    ("장", "매"),
];

const NUMBER: &str = r"([0-9]+(?:\.[0-9]+)?)";

/// A named quantity pattern. Capture 1 is the number, capture 2 the unit.
pub struct QuantityRule {
    pub name: &'static str,
    pattern: Regex,
}

impl QuantityRule {
    fn new(name: &'static str, body: &str) -> Self {
        let pattern = Regex::new(&format!("(?i){}", body.replace("{n}", NUMBER)))
            .unwrap_or_else(|e| panic!("quantity rule {name} does not compile: {e}"));
        Self { name, pattern }
    }

    fn apply(&self, text: &str) -> Option<ParsedQuantity> {
        let caps = self.pattern.captures(text)?;
        let quantity = caps.get(1)?.as_str().parse::<f64>().ok()?;
        let unit = normalize_unit(caps.get(2)?.as_str());
        Some(ParsedQuantity {
            quantity,
            unit,
            original: caps.get(0)?.as_str().to_string(),
        })
    }
}

/// Quantity rules in priority order.
pub static QUANTITY_RULES: Lazy<Vec<QuantityRule>> = Lazy::new(|| {
    vec![
        // 12개입, 24입, 500개
        QuantityRule::new("count", r"{n}\s*(개입|개|입)"),
        // 1kg, 500g, 2.5kg
        QuantityRule::new("weight", r"{n}\s*(kg|g|그램|킬로그램)"),
        // 500ml, 1L, 1.5l
        QuantityRule::new("volume", r"{n}\s*(ml|l|리터|밀리리터)"),
        // 100매, 200장
        QuantityRule::new("sheet", r"{n}\s*(매|장|팩|개)"),
        // x 24팩, x24개
        QuantityRule::new("multiplier", r"x\s*{n}\s*(팩|개|입|병|캔)"),
        // 24팩, 12병
        QuantityRule::new("container", r"{n}\s*(팩|병|캔|통|박스)"),
    ]
});

/// "500ml x 24팩": a per-item amount followed by a pack count.
static COMPOUND_RULE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i){NUMBER}\s*(ml|l|g|kg|개|팩|병|캔)\s*x\s*{NUMBER}\s*(팩|개|입|병|캔)"
    ))
    .unwrap_or_else(|e| panic!("compound quantity rule does not compile: {e}"))
});

/// Map a unit token to its canonical form.
///
/// The token is lowercased first, so `ML` and `ml` normalize alike.
pub fn normalize_unit(unit: &str) -> String {
    canonical_unit(&unit.to_lowercase())
}

/// Synonym table lookup with the token's case preserved.
fn canonical_unit(unit: &str) -> String {
    UNIT_SYNONYMS
        .iter()
        .find(|(from, _)| *from == unit)
        .map(|(_, to)| (*to).to_string())
        .unwrap_or_else(|| unit.to_string())
}

/// Extract the first quantity expression from text.
///
/// Only the first occurrence of the first matching rule is used. Zero is
/// not rejected.
pub fn parse_quantity_from_text(text: &str) -> Option<ParsedQuantity> {
    QUANTITY_RULES.iter().find_map(|rule| rule.apply(text))
}

/// Extract up to two quantities.
///
/// The compound "A-unit x B-unit" form yields both sides in left-to-right
/// order; otherwise this falls back to the single-quantity parse.
pub fn parse_multiple_quantities(text: &str) -> Vec<ParsedQuantity> {
    if let Some(caps) = COMPOUND_RULE.captures(text) {
        let side = |num: usize, unit: usize| -> Option<ParsedQuantity> {
            let number = caps.get(num)?.as_str();
            let token = caps.get(unit)?.as_str();
            Some(ParsedQuantity {
                quantity: number.parse().ok()?,
                unit: canonical_unit(token),
                original: format!("{}{}", number, token),
            })
        };
        if let (Some(first), Some(second)) = (side(1, 2), side(3, 4)) {
            return vec![first, second];
        }
    }

    parse_quantity_from_text(text).into_iter().collect()
}

/// Render a quantity with its unit, e.g. `10kg` or `2.5L`.
pub fn format_quantity(quantity: f64, unit: &str) -> String {
    if quantity.fract() == 0.0 {
        format!("{:.0}{}", quantity, unit)
    } else {
        // ties round away from zero: 2.25 -> 2.3
        format!("{:.1}{}", (quantity * 10.0).round() / 10.0, unit)
    }
}
