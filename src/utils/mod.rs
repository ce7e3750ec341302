//! Shared utility functions.
//!
//! - `format`: Human-readable formatting (sizes, elapsed time)
//! - `mime`: MIME detection and upload categories

mod format;
mod mime;

pub use format::{format_elapsed, format_size};
pub use mime::{detect_mime_type, mime_type_category, supported_mime_types, MimeCategory};
