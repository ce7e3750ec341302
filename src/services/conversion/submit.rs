//! Document submission: validation, option merging and job id extraction.

use std::path::Path;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use super::api::{ConversionApi, UploadRequest};
use crate::config::{Config, UploadLimits};
use crate::error::{ConversionError, Result};
use crate::http_client::{truncate_chars, BODY_PREVIEW_CHARS};
use crate::models::{Job, ProcessingOptions};
use crate::privacy::EnforcedPrivacy;
use crate::utils::{
    detect_mime_type, format_size, mime_type_category, supported_mime_types, MimeCategory,
};

/// A file loaded into memory for upload.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub file_name: String,
    pub mime_type: String,
    pub content: Vec<u8>,
    /// SHA-256 of `content` (hex).
    pub sha256: String,
}

impl SourceFile {
    /// Wrap in-memory content. The MIME type is detected when not given.
    pub fn from_bytes(file_name: &str, content: Vec<u8>, mime_type: Option<&str>) -> Self {
        let mime_type = mime_type
            .map(str::to_string)
            .unwrap_or_else(|| detect_mime_type(&content, Path::new(file_name)));
        let sha256 = hex::encode(Sha256::digest(&content));
        Self {
            file_name: file_name.to_string(),
            mime_type,
            content,
            sha256,
        }
    }

    /// Read a file from disk.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let content = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::from_bytes(&file_name, content, None))
    }

    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }
}

/// Redacted record of the last submission, kept when debug snapshots are on.
#[derive(Debug, Clone, Serialize)]
pub struct RequestSnapshot {
    pub captured_at: DateTime<Utc>,
    pub file_name: String,
    pub mime_type: String,
    pub size: u64,
    pub options: Value,
    /// Suffix of the app key; the full key is never stored.
    pub credential_hint: Option<String>,
    pub response_status: Option<u16>,
    pub response_body: Option<String>,
}

/// Validates documents and uploads them as conversion jobs.
pub struct JobSubmitter {
    api: Arc<dyn ConversionApi>,
    limits: UploadLimits,
    /// Built-in defaults overlaid with configured defaults.
    defaults: ProcessingOptions,
    job_id_fields: Vec<String>,
    debug_snapshots: bool,
    last_snapshot: RwLock<Option<RequestSnapshot>>,
}

impl JobSubmitter {
    pub fn new(api: Arc<dyn ConversionApi>, config: &Config) -> Self {
        Self {
            api,
            limits: config.limits.clone(),
            defaults: ProcessingOptions::builtin_defaults().overlay(&config.submission.defaults),
            job_id_fields: config.submission.job_id_fields.clone(),
            debug_snapshots: config.submission.debug_snapshots,
            last_snapshot: RwLock::new(None),
        }
    }

    /// Check type and size; returns the upload category.
    pub fn validate(&self, file: &SourceFile) -> Result<MimeCategory> {
        let category = mime_type_category(&file.mime_type).ok_or_else(|| {
            ConversionError::Validation(format!(
                "Unsupported file type '{}' for {}. Supported types: {}",
                file.mime_type,
                file.file_name,
                supported_mime_types().collect::<Vec<_>>().join(", ")
            ))
        })?;

        if file.content.is_empty() {
            return Err(ConversionError::Validation(format!(
                "{} is empty",
                file.file_name
            )));
        }

        let limit = self.limits.limit_for(category);
        if file.size() > limit {
            return Err(ConversionError::Validation(format!(
                "{} is {}, above the {} limit for {}",
                file.file_name,
                format_size(file.size()),
                format_size(limit),
                category.display_name().to_lowercase()
            )));
        }

        Ok(category)
    }

    /// Merge defaults, caller options and the enforced privacy settings.
    pub fn merge_options(&self, options: &ProcessingOptions) -> Result<Map<String, Value>> {
        let merged = self.defaults.overlay(options);
        let mut map = match serde_json::to_value(&merged) {
            Ok(Value::Object(map)) => map,
            Ok(_) => Map::new(),
            Err(e) => {
                return Err(ConversionError::Validation(format!(
                    "Options could not be serialized: {}",
                    e
                )))
            }
        };
        EnforcedPrivacy.apply(&mut map);
        Ok(map)
    }

    /// Read a file from disk for upload.
    ///
    /// Files larger than every configured limit are rejected from their
    /// metadata, before the content is read.
    pub async fn read_source(&self, path: &Path) -> Result<SourceFile> {
        let size = tokio::fs::metadata(path).await?.len();
        let ceiling = self.limits.image_max_bytes.max(self.limits.document_max_bytes);
        if size > ceiling {
            return Err(ConversionError::Validation(format!(
                "{} is {}, above the {} upload limit",
                path.display(),
                format_size(size),
                format_size(ceiling)
            )));
        }
        SourceFile::from_path(path).await
    }

    /// Read, validate and submit a file from disk.
    pub async fn submit_path(&self, path: &Path, options: &ProcessingOptions) -> Result<Job> {
        let file = self.read_source(path).await?;
        self.submit(&file, options).await
    }

    /// Validate and upload a file, returning the created job.
    pub async fn submit(&self, file: &SourceFile, options: &ProcessingOptions) -> Result<Job> {
        let category = self.validate(file)?;
        let merged = self.defaults.overlay(options);
        let options_map = self.merge_options(options)?;
        let options_value = Value::Object(options_map);

        info!(
            file = %file.file_name,
            mime = %file.mime_type,
            category = category.id(),
            size = file.size(),
            "Submitting document"
        );

        let request = UploadRequest {
            file_name: file.file_name.clone(),
            mime_type: file.mime_type.clone(),
            content: file.content.clone(),
            options_json: options_value.to_string(),
        };

        let response = match self.api.submit(request).await {
            Ok(response) => response,
            Err(e) => {
                self.record_snapshot(file, &options_value, None, None);
                return Err(ConversionError::Upload {
                    status: None,
                    message: e.into_detail(),
                });
            }
        };

        let status = response.status.as_u16();
        self.record_snapshot(
            file,
            &options_value,
            Some(status),
            Some(response.body_preview()),
        );

        if !response.is_success() {
            return Err(ConversionError::Upload {
                status: Some(status),
                message: format!("HTTP {}: {}", status, response.body_preview()),
            });
        }

        let body: Value = response.json().map_err(|e| ConversionError::Upload {
            status: None,
            message: format!(
                "Response is not JSON ({}): {}",
                e,
                response.body_preview()
            ),
        })?;

        if let Some(message) = reported_error(&body) {
            return Err(ConversionError::Upload {
                status: None,
                message,
            });
        }

        let job_id = extract_job_id(&body, &self.job_id_fields)?;
        info!(job_id = %job_id, "Document accepted");

        Ok(Job::new(
            job_id,
            file.file_name.clone(),
            file.sha256.clone(),
            merged.requested_formats(),
            merged.page_ranges.clone(),
        ))
    }

    /// The last recorded request/response, if debug snapshots are enabled.
    pub fn last_snapshot(&self) -> Option<RequestSnapshot> {
        self.last_snapshot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn record_snapshot(
        &self,
        file: &SourceFile,
        options: &Value,
        response_status: Option<u16>,
        response_body: Option<String>,
    ) {
        if !self.debug_snapshots {
            return;
        }
        let snapshot = RequestSnapshot {
            captured_at: Utc::now(),
            file_name: file.file_name.clone(),
            mime_type: file.mime_type.clone(),
            size: file.size(),
            options: options.clone(),
            credential_hint: self.api.credential_hint(),
            response_status,
            response_body,
        };
        debug!(file = %file.file_name, status = ?response_status, "Recorded request snapshot");
        *self.last_snapshot.write().unwrap_or_else(|e| e.into_inner()) = Some(snapshot);
    }
}

/// Pull the job id out of a submit response.
///
/// `fields` are probed in order and the first string or numeric value wins.
pub fn extract_job_id(body: &Value, fields: &[String]) -> Result<String> {
    for field in fields {
        match body.get(field) {
            Some(Value::String(id)) if !id.trim().is_empty() => return Ok(id.trim().to_string()),
            Some(Value::Number(id)) => return Ok(id.to_string()),
            _ => {}
        }
    }

    Err(ConversionError::Upload {
        status: None,
        message: format!(
            "Response did not contain a job id (checked fields: {}): {}",
            fields.join(", "),
            truncate_chars(&body.to_string(), BODY_PREVIEW_CHARS)
        ),
    })
}

/// Error message carried by an otherwise successful response.
fn reported_error(body: &Value) -> Option<String> {
    let error = body.get("error").filter(|e| !e.is_null())?;
    let message = match error {
        Value::String(s) => s.clone(),
        other => other
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| other.to_string()),
    };
    let detail = body
        .get("error_info")
        .and_then(|info| info.get("message"))
        .and_then(Value::as_str);
    Some(match detail {
        Some(detail) if detail != message => format!("{} ({})", message, detail),
        _ => message,
    })
}
