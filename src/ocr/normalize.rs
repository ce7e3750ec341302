//! Normalization of raw conversion responses.
//!
//! The service returns a primary `text` field, a handful of top-level
//! extras (`latex_styled`, `html`, confidence values, content flags) and a
//! `data` array of `{type, value}` entries carrying secondary notations:
//!
//! ```json
//! {
//!   "text": "\\( x^2 \\)",
//!   "confidence": 0.98,
//!   "is_printed": true,
//!   "data": [
//!     {"type": "asciimath", "value": "x^2"},
//!     {"type": "tsv", "value": "a\tb"}
//!   ],
//!   "line_data": [{"type": "math", "text": "..."}]
//! }
//! ```
//!
//! Every field is optional. Missing strings normalize to empty, missing
//! flags to `false` and a missing confidence to `0`.

use std::collections::HashMap;

use serde_json::Value;

use super::delimiters::{convert_delimiters, validate_delimiters, DelimiterStyle};
use super::tables::{detect_table, tsv_to_markdown};
use crate::models::NormalizedResult;

/// Secondary notations indexed by type; the first entry of each type wins.
#[derive(Debug, Default)]
pub struct SecondaryFormats {
    values: HashMap<String, String>,
}

impl SecondaryFormats {
    pub fn from_entries(entries: &[Value]) -> Self {
        let mut values = HashMap::new();
        for entry in entries {
            let (Some(kind), Some(value)) = (
                entry.get("type").and_then(Value::as_str),
                entry.get("value").and_then(Value::as_str),
            ) else {
                continue;
            };
            values
                .entry(kind.to_string())
                .or_insert_with(|| value.to_string());
        }
        Self { values }
    }

    /// Value for `kind`, or an empty string.
    pub fn get(&self, kind: &str) -> &str {
        self.values.get(kind).map(String::as_str).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Converts raw service responses into [`NormalizedResult`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseNormalizer {
    /// Rewrite math in the primary text to this style.
    delimiter_style: Option<DelimiterStyle>,
}

impl ResponseNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter_style(mut self, style: DelimiterStyle) -> Self {
        self.delimiter_style = Some(style);
        self
    }

    pub fn normalize(&self, raw: Value) -> NormalizedResult {
        let entries = array_field(&raw, "data");
        let secondary = SecondaryFormats::from_entries(entries);
        let line_items = array_field(&raw, "line_data");

        let mut text = string_field(&raw, "text");
        if let Some(style) = self.delimiter_style {
            text = convert_delimiters(&text, style);
        }

        let html = string_field(&raw, "html");
        let tsv = secondary.get("tsv").to_string();
        let table_html = secondary.get("table_html").to_string();
        let contains_table = detect_table(
            &tsv,
            &[html.as_str(), table_html.as_str(), text.as_str()],
            line_items,
        );
        let table_markdown = tsv_to_markdown(&tsv);
        let warnings = validate_delimiters(&text);

        let latex_styled = string_field(&raw, "latex_styled");
        let latex = match secondary.get("latex") {
            "" => latex_styled.clone(),
            value => value.to_string(),
        };

        NormalizedResult {
            latex_styled,
            asciimath: secondary.get("asciimath").to_string(),
            mathml: secondary.get("mathml").to_string(),
            latex,
            tsv,
            table_html,
            html,
            table_markdown,
            confidence: confidence_field(&raw, "confidence"),
            confidence_rate: confidence_field(&raw, "confidence_rate"),
            is_handwritten: flag_field(&raw, &["is_handwritten", "isHandwritten"]),
            is_printed: flag_field(&raw, &["is_printed", "isPrinted"]),
            contains_table,
            contains_chemistry: flag_field(
                &raw,
                &["contains_chemistry", "containsChemistry", "contains_chem"],
            ),
            warnings,
            text,
            raw,
        }
    }
}

fn string_field(raw: &Value, key: &str) -> String {
    raw.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn array_field<'a>(raw: &'a Value, key: &str) -> &'a [Value] {
    raw.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn confidence_field(raw: &Value, key: &str) -> f64 {
    raw.get(key)
        .and_then(Value::as_f64)
        .map(NormalizedResult::clamp_confidence)
        .unwrap_or(0.0)
}

fn flag_field(raw: &Value, keys: &[&str]) -> bool {
    keys.iter()
        .find_map(|key| raw.get(*key).and_then(Value::as_bool))
        .unwrap_or(false)
}
