//! Error types for conversion jobs and their user-facing classification.

mod classifier;

pub use classifier::{ClassifiedError, ErrorClassifier, ErrorKind};

use thiserror::Error;

/// Errors produced while submitting, polling, downloading or analyzing a job.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// Bad input detected before any network call.
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Upload failed: {message}")]
    Upload {
        status: Option<u16>,
        message: String,
    },

    #[error("Status check for job {job_id} failed: {message}")]
    StatusCheck {
        job_id: String,
        status: Option<u16>,
        message: String,
    },

    /// The remote service reported `status = error`.
    #[error("Processing failed for job {job_id}: {message}")]
    Processing { job_id: String, message: String },

    #[error(
        "Job {job_id} did not complete after {attempts} status checks; \
         try reducing the input size or page range"
    )]
    Timeout { job_id: String, attempts: u32 },

    #[error("Download of '{format}' for job {job_id} failed: {message}")]
    Download {
        job_id: String,
        format: String,
        status: Option<u16>,
        message: String,
    },

    #[error("Polling for job {job_id} was cancelled")]
    Cancelled { job_id: String },

    #[error("Invalid response from service: {0}")]
    InvalidResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConversionError {
    /// HTTP status attached to transport-level failures, if any.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            ConversionError::Upload { status, .. }
            | ConversionError::StatusCheck { status, .. }
            | ConversionError::Download { status, .. } => *status,
            _ => None,
        }
    }

    /// Whether the error was raised before any network call was made.
    pub fn is_validation(&self) -> bool {
        matches!(self, ConversionError::Validation(_))
    }
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, ConversionError>;
