//! Line-level structural data ("lines data") returned for a processed job.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{ConversionError, Result};

/// Bounding box of a line in page pixel coordinates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Region {
    #[serde(default, deserialize_with = "lenient::number_or_zero")]
    pub top_left_x: f64,
    #[serde(default, deserialize_with = "lenient::number_or_zero")]
    pub top_left_y: f64,
    #[serde(default, deserialize_with = "lenient::number_or_zero")]
    pub width: f64,
    #[serde(default, deserialize_with = "lenient::number_or_zero")]
    pub height: f64,
}

/// One recognized line of content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Line {
    /// Explicit content type (`text`, `math`, `table`, `diagram`, ...).
    #[serde(
        rename = "type",
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub line_type: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub subtype: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::string",
        skip_serializing_if = "Option::is_none"
    )]
    pub text: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub confidence: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient::flag",
        skip_serializing_if = "Option::is_none"
    )]
    pub is_printed: Option<bool>,
    #[serde(
        default,
        deserialize_with = "lenient::flag",
        skip_serializing_if = "Option::is_none"
    )]
    pub is_handwritten: Option<bool>,
    #[serde(
        default,
        deserialize_with = "lenient::region",
        skip_serializing_if = "Option::is_none"
    )]
    pub region: Option<Region>,
    /// Free-form layout hints; `geometry.table` marks tabular content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Value>,
}

impl Line {
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    pub fn printed(&self) -> bool {
        self.is_printed.unwrap_or(false)
    }

    pub fn handwritten(&self) -> bool {
        self.is_handwritten.unwrap_or(false)
    }

    /// Whether the layout hints flag this line as part of a table.
    pub fn has_table_hint(&self) -> bool {
        self.geometry
            .as_ref()
            .and_then(|g| g.get("table"))
            .is_some_and(|hint| match hint {
                Value::Bool(b) => *b,
                Value::Null => false,
                _ => true,
            })
    }
}

/// One page of lines data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    #[serde(alias = "page", default, deserialize_with = "lenient::page_number")]
    pub page_number: u32,
    #[serde(alias = "page_width", default, deserialize_with = "lenient::number")]
    pub width: Option<f64>,
    #[serde(alias = "page_height", default, deserialize_with = "lenient::number")]
    pub height: Option<f64>,
    /// Missing on malformed pages; treated as empty past the first page.
    #[serde(default, deserialize_with = "lenient::lines")]
    pub lines: Option<Vec<Line>>,
}

impl Page {
    pub fn lines(&self) -> &[Line] {
        self.lines.as_deref().unwrap_or(&[])
    }
}

/// The full structural breakdown of a processed document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinesDocument {
    #[serde(deserialize_with = "lenient::pages")]
    pub pages: Vec<Page>,
}

impl LinesDocument {
    /// Validate and parse raw lines data.
    ///
    /// The document must carry a non-empty `pages` array whose first page has
    /// a `lines` array.
    pub fn from_value(value: &Value) -> Result<Self> {
        validate_structure(value)?;
        serde_json::from_value(value.clone())
            .map_err(|e| ConversionError::Validation(format!("Malformed lines data: {}", e)))
    }

    /// Validate an already-typed document against the same rules.
    pub fn validate(&self) -> Result<()> {
        match self.pages.first() {
            None => Err(ConversionError::Validation(
                "Lines data contains no pages".to_string(),
            )),
            Some(page) if page.lines.is_none() => Err(ConversionError::Validation(
                "First page of lines data has no lines array".to_string(),
            )),
            Some(_) => Ok(()),
        }
    }
}

fn validate_structure(value: &Value) -> Result<()> {
    let pages = match value.get("pages") {
        None => {
            return Err(ConversionError::Validation(
                "Lines data is missing 'pages'".to_string(),
            ))
        }
        Some(Value::Array(pages)) => pages,
        Some(_) => {
            return Err(ConversionError::Validation(
                "Lines data 'pages' is not an array".to_string(),
            ))
        }
    };

    let first = pages.first().ok_or_else(|| {
        ConversionError::Validation("Lines data contains no pages".to_string())
    })?;

    if !first.get("lines").is_some_and(Value::is_array) {
        return Err(ConversionError::Validation(
            "First page of lines data has no lines array".to_string(),
        ));
    }

    Ok(())
}

/// Field parsers for the loosely typed service schema.
///
/// A null or wrongly typed value reads as absent instead of failing the
/// whole document.
mod lenient {
    use super::*;

    type Parsed<T, E> = std::result::Result<T, E>;

    fn as_f64(value: &Value) -> Option<f64> {
        let number: Option<f64> = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        number.filter(|n| n.is_finite())
    }

    pub fn number<'de, D: Deserializer<'de>>(d: D) -> Parsed<Option<f64>, D::Error> {
        Ok(as_f64(&Value::deserialize(d)?))
    }

    pub fn number_or_zero<'de, D: Deserializer<'de>>(d: D) -> Parsed<f64, D::Error> {
        Ok(as_f64(&Value::deserialize(d)?).unwrap_or(0.0))
    }

    pub fn page_number<'de, D: Deserializer<'de>>(d: D) -> Parsed<u32, D::Error> {
        Ok(as_f64(&Value::deserialize(d)?)
            .filter(|n| *n >= 0.0 && n.fract() == 0.0 && *n <= f64::from(u32::MAX))
            .map_or(0, |n| n as u32))
    }

    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Parsed<Option<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => Some(s),
            _ => None,
        })
    }

    pub fn flag<'de, D: Deserializer<'de>>(d: D) -> Parsed<Option<bool>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Bool(b) => Some(b),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
    }

    pub fn region<'de, D: Deserializer<'de>>(d: D) -> Parsed<Option<Region>, D::Error> {
        let value = Value::deserialize(d)?;
        if !value.is_object() {
            return Ok(None);
        }
        Ok(serde_json::from_value(value).ok())
    }

    pub fn lines<'de, D: Deserializer<'de>>(d: D) -> Parsed<Option<Vec<Line>>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Array(items) => Some(
                items
                    .into_iter()
                    .filter(Value::is_object)
                    .filter_map(|item| serde_json::from_value(item).ok())
                    .collect(),
            ),
            _ => None,
        })
    }

    pub fn pages<'de, D: Deserializer<'de>>(d: D) -> Parsed<Vec<Page>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Array(items) => items
                .into_iter()
                .map(|item| serde_json::from_value(item).unwrap_or_default())
                .collect(),
            _ => Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rejects_missing_pages() {
        let err = LinesDocument::from_value(&json!({})).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_rejects_non_array_pages() {
        let err = LinesDocument::from_value(&json!({"pages": {"lines": []}})).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_rejects_empty_pages() {
        let err = LinesDocument::from_value(&json!({"pages": []})).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_rejects_first_page_without_lines() {
        let err = LinesDocument::from_value(&json!({"pages": [{"page": 1}]})).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_parses_service_field_names() {
        let doc = LinesDocument::from_value(&json!({
            "pages": [
                {
                    "page": 1,
                    "page_width": 1200,
                    "page_height": 1600,
                    "lines": [
                        {
                            "type": "math",
                            "text": "\\( x^2 \\)",
                            "confidence": 0.97,
                            "is_printed": true,
                            "region": {"top_left_x": 10, "top_left_y": 20, "width": 300, "height": 40}
                        }
                    ]
                },
                {"page": 2}
            ]
        }))
        .unwrap();

        assert_eq!(doc.pages.len(), 2);
        assert_eq!(doc.pages[0].page_number, 1);
        assert_eq!(doc.pages[0].width, Some(1200.0));
        let line = &doc.pages[0].lines()[0];
        assert_eq!(line.line_type.as_deref(), Some("math"));
        assert!(line.printed());
        assert!(!line.handwritten());
        assert_eq!(line.region.as_ref().unwrap().width, 300.0);
        assert!(doc.pages[1].lines().is_empty());
    }

    #[test]
    fn test_wrongly_typed_fields_read_as_absent() {
        let doc = LinesDocument::from_value(&json!({
            "pages": [
                {
                    "page": null,
                    "page_width": null,
                    "page_height": "1600",
                    "lines": [
                        {"type": "math", "confidence": "0.9", "is_printed": "yes"},
                        {"text": 42, "confidence": null, "is_handwritten": "true", "region": "n/a"},
                        {"region": {"top_left_x": null, "top_left_y": "5", "width": 10, "height": 2}},
                        "stray"
                    ]
                },
                null,
                {"page": "3", "lines": {"not": "an array"}}
            ]
        }))
        .unwrap();

        assert_eq!(doc.pages.len(), 3);
        let first = &doc.pages[0];
        assert_eq!(first.page_number, 0);
        assert_eq!(first.width, None);
        assert_eq!(first.height, Some(1600.0));
        assert_eq!(first.lines().len(), 3);

        let lines = first.lines();
        assert_eq!(lines[0].line_type.as_deref(), Some("math"));
        assert_eq!(lines[0].confidence, Some(0.9));
        assert_eq!(lines[0].is_printed, None);
        assert_eq!(lines[1].text, None);
        assert_eq!(lines[1].confidence, None);
        assert!(lines[1].handwritten());
        assert_eq!(lines[1].region, None);
        let region = lines[2].region.as_ref().unwrap();
        assert_eq!((region.top_left_x, region.top_left_y), (0.0, 5.0));

        assert_eq!(doc.pages[1], Page::default());
        assert_eq!(doc.pages[2].page_number, 3);
        assert!(doc.pages[2].lines().is_empty());
    }

    #[test]
    fn test_table_hint() {
        let line: Line = serde_json::from_value(json!({"geometry": {"table": true}})).unwrap();
        assert!(line.has_table_hint());
        let line: Line = serde_json::from_value(json!({"geometry": {"table": false}})).unwrap();
        assert!(!line.has_table_hint());
    }
}
