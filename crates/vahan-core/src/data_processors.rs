//! Numeric coercion of loosely typed sales cells.
//!
//! Every aggregation goes through [`SalesCoercion::coerce`]; the ingestion
//! path uses [`SalesCoercion::from_text`] so numeric text is stored as a
//! number whenever it can be read as one.

use std::sync::OnceLock;

use regex::Regex;

use crate::models::SalesValue;

fn leading_float_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[+-]?(?:Infinity|(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)")
            .expect("regex is valid")
    })
}

/// Parse the longest floating-point prefix of `text`.
///
/// Leading whitespace is skipped and trailing garbage ignored, so `"12 units"`
/// reads as 12. Returns `None` when no digits start the string.
pub fn parse_leading_float(text: &str) -> Option<f64> {
    let trimmed = text.trim_start();
    let matched = leading_float_pattern().find(trimmed)?.as_str();
    match matched.trim_start_matches(['+', '-']) {
        "Infinity" => Some(if matched.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        }),
        _ => matched.parse::<f64>().ok(),
    }
}

/// Stateless conversions between sheet text, stored cells and numbers.
pub struct SalesCoercion;

impl SalesCoercion {
    /// Coerce a stored cell to a sales count.
    ///
    /// * number → itself (NaN → 0)
    /// * text   → grouping commas stripped, leading float parsed, 0 on failure
    /// * null   → 0
    pub fn coerce(value: &SalesValue) -> f64 {
        match value {
            SalesValue::Number(n) if n.is_nan() => 0.0,
            SalesValue::Number(n) => *n,
            SalesValue::Text(text) => Self::coerce_text(text),
            SalesValue::Null => 0.0,
        }
    }

    /// Coerce free text to a sales count, 0 when unparsable.
    pub fn coerce_text(text: &str) -> f64 {
        Self::parse_grouped(text)
            .filter(|n| !n.is_nan())
            .unwrap_or(0.0)
    }

    /// Convert a textual sheet cell into the value to store: a number when the
    /// comma-stripped text parses to a finite value, otherwise the original
    /// text unchanged. Non-finite numbers do not survive JSON persistence.
    pub fn from_text(text: &str) -> SalesValue {
        match Self::parse_grouped(text) {
            Some(n) if n.is_finite() => SalesValue::Number(n),
            _ => SalesValue::Text(text.to_string()),
        }
    }

    /// Sum the coerced value of every cell, whatever its key.
    pub fn sum_all<'a>(values: impl IntoIterator<Item = &'a SalesValue>) -> f64 {
        values.into_iter().map(Self::coerce).sum()
    }

    fn parse_grouped(text: &str) -> Option<f64> {
        parse_leading_float(&text.replace(',', ""))
    }
}
