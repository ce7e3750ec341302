//! Conversion job and status snapshot models.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Processing state reported by the conversion service.
///
/// Unrecognized states are kept verbatim in `Other` and treated as transient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Error,
    Other(String),
}

impl JobStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Error => "error",
            Self::Other(s) => s,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "queued" => Self::Queued,
            "processing" => Self::Processing,
            "completed" => Self::Completed,
            "error" => Self::Error,
            _ => Self::Other(s.to_string()),
        }
    }

    /// Whether no further transition can follow this state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }

    fn rank(&self) -> Option<u8> {
        match self {
            Self::Queued => Some(0),
            Self::Processing => Some(1),
            Self::Completed | Self::Error => Some(2),
            Self::Other(_) => None,
        }
    }
}

impl From<String> for JobStatus {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document submitted for remote conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub status: JobStatus,
    pub submitted_at: DateTime<Utc>,
    pub requested_formats: Vec<String>,
    pub page_range: Option<String>,
    pub file_name: String,
    /// SHA-256 of the uploaded bytes (hex).
    pub file_sha256: String,
}

impl Job {
    pub fn new(
        id: String,
        file_name: String,
        file_sha256: String,
        requested_formats: Vec<String>,
        page_range: Option<String>,
    ) -> Self {
        Self {
            id,
            status: JobStatus::Queued,
            submitted_at: Utc::now(),
            requested_formats,
            page_range,
            file_name,
            file_sha256,
        }
    }

    /// Move to `next`, returning whether the status changed.
    ///
    /// Transitions only move forward: terminal states are final, a job never
    /// returns to `queued` once processing, and unrecognized states are not
    /// recorded.
    pub fn transition(&mut self, next: JobStatus) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        match (self.status.rank(), next.rank()) {
            (Some(current), Some(candidate)) if candidate > current => {
                self.status = next;
                true
            }
            _ => false,
        }
    }
}

/// One status query's view of a job.
#[derive(Debug, Clone)]
pub struct StatusRecord {
    pub status: JobStatus,
    /// Time since polling started.
    pub elapsed: Duration,
    pub results: Option<Value>,
    pub error_message: Option<String>,
    pub percent_done: Option<f64>,
    pub pages_completed: Option<u32>,
    pub total_pages: Option<u32>,
    /// The status body as returned by the service.
    pub raw: Value,
}

impl StatusRecord {
    /// Parse a status response body. Missing or non-string `status` values
    /// become an empty transient state.
    pub fn from_response(raw: Value, elapsed: Duration) -> Self {
        let status = raw
            .get("status")
            .and_then(Value::as_str)
            .map(JobStatus::parse)
            .unwrap_or_else(|| JobStatus::Other(String::new()));

        let error_message = raw
            .get("error")
            .and_then(|e| {
                e.as_str()
                    .map(str::to_string)
                    .or_else(|| e.get("message").and_then(Value::as_str).map(str::to_string))
            })
            .or_else(|| {
                raw.get("error_info")
                    .and_then(|info| info.get("message"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .filter(|m| !m.is_empty());

        let results = raw.get("results").filter(|r| r.is_object()).cloned();
        let percent_done = raw.get("percent_done").and_then(Value::as_f64);
        let pages_completed = raw
            .get("num_pages_completed")
            .and_then(Value::as_u64)
            .map(|n| n as u32);
        let total_pages = raw
            .get("num_pages")
            .and_then(Value::as_u64)
            .map(|n| n as u32);

        Self {
            status,
            elapsed,
            results,
            error_message,
            percent_done,
            pages_completed,
            total_pages,
            raw,
        }
    }
}
