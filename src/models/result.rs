//! Canonical result record produced from a raw conversion response.

use serde::Serialize;
use serde_json::Value;

/// Format-agnostic view of a completed job's output.
///
/// Absent formats read as empty strings and absent flags as `false`, so
/// consumers never need to inspect the raw response.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizedResult {
    /// Primary text (Markdown with embedded math).
    pub text: String,
    pub latex_styled: String,
    pub asciimath: String,
    pub mathml: String,
    pub latex: String,
    pub tsv: String,
    pub table_html: String,
    pub html: String,
    /// Markdown table derived from `tsv`, empty when there is no tabular data.
    pub table_markdown: String,
    /// Always within `[0, 1]`; `0` when the service omitted it.
    pub confidence: f64,
    pub confidence_rate: f64,
    pub is_handwritten: bool,
    pub is_printed: bool,
    pub contains_table: bool,
    pub contains_chemistry: bool,
    /// Structural problems found in the text, such as unbalanced delimiters.
    pub warnings: Vec<String>,
    /// The response as returned by the service, kept for diagnostics.
    #[serde(skip_serializing_if = "Value::is_null")]
    pub raw: Value,
}

impl NormalizedResult {
    /// Clamp a reported confidence into `[0, 1]`, mapping non-finite values to 0.
    pub fn clamp_confidence(value: f64) -> f64 {
        if value.is_finite() {
            value.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Copy without the raw response, for export to downstream consumers.
    pub fn without_raw(&self) -> Self {
        Self {
            raw: Value::Null,
            ..self.clone()
        }
    }
}
