//! Retrieval of job outputs by format.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use super::api::ConversionApi;
use crate::error::{ConversionError, Result};
use crate::models::LinesDocument;

/// Caller-facing format names and the service extension each maps to.
const FORMAT_EXTENSIONS: &[(&str, &str)] = &[
    ("mmd", "mmd"),
    ("md", "md"),
    ("markdown", "md"),
    ("html", "html"),
    ("docx", "docx"),
    ("latex", "tex.zip"),
    ("tex", "tex.zip"),
    ("pdf", "pdf"),
    ("latex_pdf", "tex.pdf"),
    ("pptx", "pptx"),
    ("lines", "lines.json"),
];

/// Extensions whose payload is handled as text; everything else is binary.
const TEXT_EXTENSIONS: &[&str] = &["mmd", "md", "html", "lines.json"];

/// Service extension for a caller format name.
pub fn extension_for(format: &str) -> Option<&'static str> {
    let format = format.trim().to_lowercase();
    FORMAT_EXTENSIONS
        .iter()
        .find(|(name, _)| *name == format)
        .map(|(_, ext)| *ext)
}

pub fn is_text_extension(extension: &str) -> bool {
    TEXT_EXTENSIONS.contains(&extension)
}

/// Format names accepted by [`ResultRetriever::download`].
pub fn supported_formats() -> impl Iterator<Item = &'static str> {
    FORMAT_EXTENSIONS.iter().map(|(name, _)| *name)
}

/// Downloaded output body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Text(String),
    Binary(Vec<u8>),
}

impl Payload {
    pub fn is_text(&self) -> bool {
        matches!(self, Payload::Text(_))
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Payload::Text(text) => text.as_bytes(),
            Payload::Binary(bytes) => bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One retrieved output.
#[derive(Debug, Clone)]
pub struct Download {
    pub job_id: String,
    pub format: String,
    pub extension: &'static str,
    pub payload: Payload,
}

impl Download {
    /// File name the output would naturally be saved under.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.job_id, self.extension)
    }
}

/// Fetches outputs of completed jobs.
pub struct ResultRetriever {
    api: Arc<dyn ConversionApi>,
}

impl ResultRetriever {
    pub fn new(api: Arc<dyn ConversionApi>) -> Self {
        Self { api }
    }

    /// Download one output format.
    ///
    /// Unknown formats fail validation without touching the network.
    pub async fn download(&self, job_id: &str, format: &str) -> Result<Download> {
        let extension = extension_for(format).ok_or_else(|| {
            ConversionError::Validation(format!(
                "Unknown output format '{}'. Supported formats: {}",
                format,
                supported_formats().collect::<Vec<_>>().join(", ")
            ))
        })?;

        let response = self
            .api
            .download(job_id, extension)
            .await
            .map_err(|e| ConversionError::Download {
                job_id: job_id.to_string(),
                format: format.to_string(),
                status: None,
                message: e.into_detail(),
            })?;

        if !response.is_success() {
            let status = response.status.as_u16();
            return Err(ConversionError::Download {
                job_id: job_id.to_string(),
                format: format.to_string(),
                status: Some(status),
                message: format!("HTTP {}: {}", status, response.body_preview()),
            });
        }

        let content_type = response.content_type().map(str::to_string);
        let bytes = response.into_bytes();
        debug!(
            job_id,
            extension,
            size = bytes.len(),
            content_type = content_type.as_deref().unwrap_or("unknown"),
            "Downloaded output"
        );

        let payload = if is_text_extension(extension) {
            Payload::Text(String::from_utf8(bytes).unwrap_or_else(|e| {
                tracing::warn!(job_id, extension, "Output is not valid UTF-8, decoding lossily");
                String::from_utf8_lossy(e.as_bytes()).into_owned()
            }))
        } else {
            Payload::Binary(bytes)
        };

        Ok(Download {
            job_id: job_id.to_string(),
            format: format.to_string(),
            extension,
            payload,
        })
    }

    /// Fetch the raw lines data for a job as JSON.
    pub async fn fetch_lines_value(&self, job_id: &str) -> Result<Value> {
        let download = self.download(job_id, "lines").await?;
        serde_json::from_slice(download.payload.as_bytes()).map_err(|e| {
            ConversionError::InvalidResponse(format!(
                "Lines data for job {} is not JSON: {}",
                job_id, e
            ))
        })
    }

    /// Fetch and validate the lines data for a job.
    pub async fn fetch_lines(&self, job_id: &str) -> Result<LinesDocument> {
        let value = self.fetch_lines_value(job_id).await?;
        LinesDocument::from_value(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_table() {
        assert_eq!(extension_for("docx"), Some("docx"));
        assert_eq!(extension_for("latex"), Some("tex.zip"));
        assert_eq!(extension_for("Markdown"), Some("md"));
        assert_eq!(extension_for("latex_pdf"), Some("tex.pdf"));
        assert_eq!(extension_for("rtf"), None);
    }

    #[test]
    fn test_text_classification() {
        assert!(is_text_extension("mmd"));
        assert!(is_text_extension("lines.json"));
        assert!(!is_text_extension("docx"));
        assert!(!is_text_extension("tex.zip"));
    }

    #[test]
    fn test_every_format_has_extension() {
        for format in supported_formats() {
            let ext = extension_for(format).unwrap();
            assert!(!ext.is_empty());
        }
    }

    #[test]
    fn test_download_file_name() {
        let download = Download {
            job_id: "abc".to_string(),
            format: "latex".to_string(),
            extension: "tex.zip",
            payload: Payload::Binary(vec![1, 2, 3]),
        };
        assert_eq!(download.file_name(), "abc.tex.zip");
        assert_eq!(download.payload.len(), 3);
        assert!(!download.payload.is_text());
    }
}
