//! Processing options sent with a submission.
//!
//! Every field is optional so that layers (built-in defaults, configured
//! defaults, caller options) can be overlaid field by field. Unset fields are
//! omitted from the serialized request.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Which secondary representations the service should include in results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_asciimath: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_latex: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_mathml: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_tsv: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_table_html: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_line_data: Option<bool>,
}

impl DataOptions {
    /// Overlay `other` on top of `self`; set fields in `other` win.
    pub fn overlay(&self, other: &DataOptions) -> DataOptions {
        DataOptions {
            include_asciimath: other.include_asciimath.or(self.include_asciimath),
            include_latex: other.include_latex.or(self.include_latex),
            include_mathml: other.include_mathml.or(self.include_mathml),
            include_tsv: other.include_tsv.or(self.include_tsv),
            include_table_html: other.include_table_html.or(self.include_table_html),
            include_line_data: other.include_line_data.or(self.include_line_data),
        }
    }
}

/// Recognized submission options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessingOptions {
    /// Output formats to generate, e.g. `{"docx": true, "tex.zip": true}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversion_formats: Option<BTreeMap<String, bool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_options: Option<DataOptions>,
    /// Opening and closing inline math delimiters, e.g. `["$", "$"]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub math_inline_delimiters: Option<(String, String)>,
    /// Opening and closing display math delimiters, e.g. `["$$", "$$"]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub math_display_delimiters: Option<(String, String)>,
    /// Page selection such as `"1-3,7"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_ranges: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_equation_tags: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_number_sections: Option<bool>,
    /// Free-form metadata; privacy keys inside it are always overwritten.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl ProcessingOptions {
    /// Options the client uses when nothing else is configured.
    pub fn builtin_defaults() -> Self {
        Self {
            conversion_formats: None,
            data_options: Some(DataOptions {
                include_asciimath: Some(true),
                include_latex: Some(true),
                include_tsv: Some(true),
                include_table_html: Some(true),
                ..Default::default()
            }),
            math_inline_delimiters: Some(("$".to_string(), "$".to_string())),
            math_display_delimiters: Some(("$$".to_string(), "$$".to_string())),
            page_ranges: None,
            include_equation_tags: Some(false),
            auto_number_sections: Some(false),
            metadata: None,
        }
    }

    /// Overlay `other` on top of `self`; set fields in `other` win.
    ///
    /// `data_options` and `metadata` are merged key by key rather than
    /// replaced wholesale.
    pub fn overlay(&self, other: &ProcessingOptions) -> ProcessingOptions {
        let data_options = match (&self.data_options, &other.data_options) {
            (Some(base), Some(top)) => Some(base.overlay(top)),
            (base, top) => top.clone().or_else(|| base.clone()),
        };
        let metadata = match (&self.metadata, &other.metadata) {
            (Some(base), Some(top)) => {
                let mut merged = base.clone();
                for (key, value) in top {
                    merged.insert(key.clone(), value.clone());
                }
                Some(merged)
            }
            (base, top) => top.clone().or_else(|| base.clone()),
        };

        ProcessingOptions {
            conversion_formats: other
                .conversion_formats
                .clone()
                .or_else(|| self.conversion_formats.clone()),
            data_options,
            math_inline_delimiters: other
                .math_inline_delimiters
                .clone()
                .or_else(|| self.math_inline_delimiters.clone()),
            math_display_delimiters: other
                .math_display_delimiters
                .clone()
                .or_else(|| self.math_display_delimiters.clone()),
            page_ranges: other.page_ranges.clone().or_else(|| self.page_ranges.clone()),
            include_equation_tags: other.include_equation_tags.or(self.include_equation_tags),
            auto_number_sections: other.auto_number_sections.or(self.auto_number_sections),
            metadata,
        }
    }

    /// Formats requested through `conversion_formats` (enabled entries only).
    pub fn requested_formats(&self) -> Vec<String> {
        self.conversion_formats
            .as_ref()
            .map(|formats| {
                formats
                    .iter()
                    .filter(|(_, enabled)| **enabled)
                    .map(|(name, _)| name.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Enable an output format.
    pub fn with_format(mut self, format: &str) -> Self {
        self.conversion_formats
            .get_or_insert_with(BTreeMap::new)
            .insert(format.to_string(), true);
        self
    }

    /// Restrict processing to a page range.
    pub fn with_page_ranges(mut self, ranges: &str) -> Self {
        self.page_ranges = Some(ranges.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_overlay_precedence() {
        let defaults = ProcessingOptions::builtin_defaults();
        let caller = ProcessingOptions {
            math_inline_delimiters: Some(("\\(".to_string(), "\\)".to_string())),
            data_options: Some(DataOptions {
                include_mathml: Some(true),
                include_tsv: Some(false),
                ..Default::default()
            }),
            ..Default::default()
        }
        .with_page_ranges("2-4");

        let merged = defaults.overlay(&caller);
        assert_eq!(
            merged.math_inline_delimiters,
            Some(("\\(".to_string(), "\\)".to_string()))
        );
        assert_eq!(
            merged.math_display_delimiters,
            Some(("$$".to_string(), "$$".to_string()))
        );
        assert_eq!(merged.page_ranges.as_deref(), Some("2-4"));

        let data = merged.data_options.unwrap();
        assert_eq!(data.include_mathml, Some(true));
        assert_eq!(data.include_tsv, Some(false));
        assert_eq!(data.include_latex, Some(true));
    }

    #[test]
    fn test_serialization_omits_unset_fields() {
        let options = ProcessingOptions::default().with_format("docx");
        let value = serde_json::to_value(&options).unwrap();
        assert_eq!(value, json!({"conversion_formats": {"docx": true}}));
    }

    #[test]
    fn test_delimiters_serialize_as_pairs() {
        let value = serde_json::to_value(ProcessingOptions::builtin_defaults()).unwrap();
        assert_eq!(value["math_inline_delimiters"], json!(["$", "$"]));
    }

    #[test]
    fn test_requested_formats() {
        let mut options = ProcessingOptions::default()
            .with_format("docx")
            .with_format("tex.zip");
        options
            .conversion_formats
            .as_mut()
            .unwrap()
            .insert("pptx".to_string(), false);
        assert_eq!(options.requested_formats(), vec!["docx", "tex.zip"]);
    }
}
