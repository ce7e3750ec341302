//! MIME type detection and upload categorization.

use std::path::Path;

/// Upload categories with separate size limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MimeCategory {
    Images,
    Documents,
}

impl MimeCategory {
    /// Get the category ID as a string.
    pub fn id(&self) -> &'static str {
        match self {
            Self::Images => "images",
            Self::Documents => "documents",
        }
    }

    /// Get the display name for the category.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Images => "Images",
            Self::Documents => "Documents",
        }
    }
}

/// MIME types accepted by the conversion service, with their category.
const SUPPORTED_TYPES: &[(&str, MimeCategory)] = &[
    ("image/png", MimeCategory::Images),
    ("image/jpeg", MimeCategory::Images),
    ("image/gif", MimeCategory::Images),
    ("image/webp", MimeCategory::Images),
    ("image/bmp", MimeCategory::Images),
    ("image/tiff", MimeCategory::Images),
    ("application/pdf", MimeCategory::Documents),
    ("application/epub+zip", MimeCategory::Documents),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        MimeCategory::Documents,
    ),
    (
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        MimeCategory::Documents,
    ),
];

/// Categorize a MIME type, returning `None` for unsupported types.
pub fn mime_type_category(mime: &str) -> Option<MimeCategory> {
    let essence = mime
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase();
    let essence = match essence.as_str() {
        "image/jpg" | "image/pjpeg" => "image/jpeg".to_string(),
        _ => essence,
    };

    SUPPORTED_TYPES
        .iter()
        .find(|(supported, _)| *supported == essence)
        .map(|(_, category)| *category)
}

/// All supported MIME types, for error messages and help output.
pub fn supported_mime_types() -> impl Iterator<Item = &'static str> {
    SUPPORTED_TYPES.iter().map(|(mime, _)| *mime)
}

/// Detect a MIME type from content, falling back to the file extension.
pub fn detect_mime_type(content: &[u8], path: &Path) -> String {
    if let Some(kind) = infer::get(content) {
        let detected = kind.mime_type();
        // Office documents are zip containers; trust the extension over "application/zip".
        if detected != "application/zip" {
            return detected.to_string();
        }
    }

    mime_guess::from_path(path)
        .first()
        .map(|m| m.essence_str().to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string())
}
