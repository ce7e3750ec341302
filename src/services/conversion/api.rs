//! Transport seam between the conversion services and the remote API.

use async_trait::async_trait;

use crate::http_client::{HttpResponse, TransportError};

/// A document upload ready to send.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file_name: String,
    pub mime_type: String,
    pub content: Vec<u8>,
    /// Fully merged options, serialized as JSON.
    pub options_json: String,
}

/// Raw access to the conversion service endpoints.
///
/// Implementations return buffered responses for any HTTP status and only
/// fail when no response was received. Interpreting status codes and bodies
/// is left to the callers.
#[async_trait]
pub trait ConversionApi: Send + Sync {
    /// Upload a document with its options.
    async fn submit(&self, request: UploadRequest) -> Result<HttpResponse, TransportError>;

    /// Query the status of a job.
    async fn status(&self, job_id: &str) -> Result<HttpResponse, TransportError>;

    /// Fetch a job output by service extension (`docx`, `tex.zip`, `lines.json`, ...).
    async fn download(&self, job_id: &str, extension: &str)
        -> Result<HttpResponse, TransportError>;

    /// Redacted credential suffix, for debug snapshots.
    fn credential_hint(&self) -> Option<String> {
        None
    }
}
