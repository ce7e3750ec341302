//! Configuration management for ocrbridge using the prefer crate.
//!
//! Config files (`ocrbridge.json`, `.toml`, `.yaml`) are discovered by prefer
//! and parsed with serde. `OCRBRIDGE_*` environment variables are applied
//! after the file is loaded and take precedence over it.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::models::ProcessingOptions;
use crate::privacy::{redact_secret, Credentials};
use crate::utils::MimeCategory;

/// Default conversion endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.mathpix.com/v3/pdf";

/// Default request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Field names probed, in order, for the job id in a submit response.
pub const DEFAULT_JOB_ID_FIELDS: &[&str] = &["pdf_id", "id", "job_id", "request_id"];

const MB: u64 = 1024 * 1024;

/// Remote service connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_key: Option<String>,
    /// Request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Proxy URL for all requests (`socks5://`, `http://`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            app_id: None,
            app_key: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT_SECS,
            user_agent: None,
            proxy: None,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Credentials, when both the app id and key are configured.
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.app_id, &self.app_key) {
            (Some(id), Some(key)) if !id.is_empty() && !key.is_empty() => {
                Some(Credentials::new(id, key))
            }
            _ => None,
        }
    }
}

/// Status polling cadence and ceiling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Wait between status queries, in milliseconds.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Attempt count after which the wait is multiplied.
    #[serde(default = "default_backoff_after")]
    pub backoff_after: u32,
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: u32,
    /// Hard ceiling on status queries per job.
    #[serde(default = "default_max_polls")]
    pub max_polls: u32,
}

fn default_interval_ms() -> u64 {
    2000
}

fn default_backoff_after() -> u32 {
    10
}

fn default_backoff_multiplier() -> u32 {
    2
}

fn default_max_polls() -> u32 {
    150
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            backoff_after: default_backoff_after(),
            backoff_multiplier: default_backoff_multiplier(),
            max_polls: default_max_polls(),
        }
    }
}

impl PollingConfig {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Maximum upload sizes per category, in bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadLimits {
    #[serde(default = "default_image_max_bytes")]
    pub image_max_bytes: u64,
    #[serde(default = "default_document_max_bytes")]
    pub document_max_bytes: u64,
}

fn default_image_max_bytes() -> u64 {
    20 * MB
}

fn default_document_max_bytes() -> u64 {
    500 * MB
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            image_max_bytes: default_image_max_bytes(),
            document_max_bytes: default_document_max_bytes(),
        }
    }
}

impl UploadLimits {
    pub fn limit_for(&self, category: MimeCategory) -> u64 {
        match category {
            MimeCategory::Images => self.image_max_bytes,
            MimeCategory::Documents => self.document_max_bytes,
        }
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Submission behavior and configured option defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionConfig {
    /// Candidate job id fields, probed in order.
    #[serde(default = "default_job_id_fields")]
    pub job_id_fields: Vec<String>,
    /// Keep a redacted copy of the last request and response.
    #[serde(default)]
    pub debug_snapshots: bool,
    /// Options layered over the built-in defaults for every submission.
    #[serde(default)]
    pub defaults: ProcessingOptions,
}

fn default_job_id_fields() -> Vec<String> {
    DEFAULT_JOB_ID_FIELDS.iter().map(|s| s.to_string()).collect()
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            job_id_fields: default_job_id_fields(),
            debug_snapshots: false,
            defaults: ProcessingOptions::default(),
        }
    }
}

impl SubmissionConfig {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default, skip_serializing_if = "PollingConfig::is_default")]
    pub polling: PollingConfig,
    #[serde(default, skip_serializing_if = "UploadLimits::is_default")]
    pub limits: UploadLimits,
    #[serde(default, skip_serializing_if = "SubmissionConfig::is_default")]
    pub submission: SubmissionConfig,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Automatically discovers ocrbridge config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("ocrbridge").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            tracing::warn!("Ignoring config file {}: {}", path.display(), e);
                            Self::default_with_env()
                        }
                    }
                } else {
                    Self::default_with_env()
                }
            }
            Err(_) => Self::default_with_env(),
        }
    }

    /// Create a default config with environment variable overrides applied.
    ///
    /// Invalid overrides are logged; the poll schedule clamps its limits to
    /// at least one attempt.
    pub fn default_with_env() -> Self {
        let config = Self::default().with_env_overrides();
        if let Err(e) = config.validate() {
            tracing::warn!("Environment overrides produced an invalid config: {}", e);
        }
        config
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let mut config = Self::parse(&contents, ext)?;
        config.source_path = Some(path.to_path_buf());
        let config = config.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse config text in the format named by `ext`.
    pub fn parse(contents: &str, ext: &str) -> Result<Self, String> {
        match ext {
            "toml" => toml::from_str(contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e)),
            "yaml" | "yml" => serde_yaml::from_str(contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e)),
            _ => serde_json::from_str(contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e)),
        }
    }

    /// Apply `OCRBRIDGE_*` environment variables.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(url) = get("OCRBRIDGE_API_URL") {
            tracing::debug!("Using OCRBRIDGE_API_URL from environment: {}", url);
            self.api.base_url = url;
        }
        if let Some(id) = get("OCRBRIDGE_APP_ID") {
            self.api.app_id = Some(id);
        }
        if let Some(key) = get("OCRBRIDGE_APP_KEY") {
            self.api.app_key = Some(key);
        }
        if let Some(proxy) = get("OCRBRIDGE_PROXY") {
            self.api.proxy = Some(proxy);
        }
        match get("OCRBRIDGE_POLL_INTERVAL_MS").map(|v| v.parse::<u64>()) {
            Some(Ok(ms)) => self.polling.interval_ms = ms,
            Some(Err(e)) => tracing::warn!("Ignoring OCRBRIDGE_POLL_INTERVAL_MS: {}", e),
            None => {}
        }
        match get("OCRBRIDGE_MAX_POLLS").map(|v| v.parse::<u32>()) {
            Some(Ok(n)) => self.polling.max_polls = n,
            Some(Err(e)) => tracing::warn!("Ignoring OCRBRIDGE_MAX_POLLS: {}", e),
            None => {}
        }
        self
    }

    /// Check values that would make polling or submission impossible.
    pub fn validate(&self) -> Result<(), String> {
        if self.polling.max_polls == 0 {
            return Err("polling.max_polls must be at least 1".to_string());
        }
        if self.polling.backoff_multiplier == 0 {
            return Err("polling.backoff_multiplier must be at least 1".to_string());
        }
        if self.submission.job_id_fields.is_empty() {
            return Err("submission.job_id_fields must not be empty".to_string());
        }
        url::Url::parse(&self.api.base_url)
            .map_err(|e| format!("Invalid api.base_url '{}': {}", self.api.base_url, e))?;
        Ok(())
    }

    /// Copy with the app key replaced by its redacted form.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        config.api.app_key = config.api.app_key.as_deref().map(redact_secret);
        config
    }

    /// Compute SHA-256 hash of the serialized config.
    pub fn hash(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.polling.max_polls, 150);
        assert_eq!(config.submission.job_id_fields[0], "pdf_id");
        assert!(config.api.credentials().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let config = Config::parse(
            r#"
            [api]
            app_id = "my-app"
            app_key = "abcdef123456"

            [polling]
            interval_ms = 500
            max_polls = 20

            [submission.defaults]
            page_ranges = "1-2"
            "#,
            "toml",
        )
        .unwrap();

        assert_eq!(config.polling.interval_ms, 500);
        assert_eq!(config.polling.backoff_after, 10);
        assert_eq!(config.submission.defaults.page_ranges.as_deref(), Some("1-2"));
        assert!(config.api.credentials().is_some());
    }

    #[test]
    fn test_parse_yaml() {
        let config = Config::parse("limits:\n  image_max_bytes: 1024\n", "yaml").unwrap();
        assert_eq!(config.limits.limit_for(MimeCategory::Images), 1024);
        assert_eq!(config.limits.document_max_bytes, 500 * MB);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("OCRBRIDGE_API_URL", "http://localhost:9000/v3/pdf"),
            ("OCRBRIDGE_MAX_POLLS", "7"),
            ("OCRBRIDGE_POLL_INTERVAL_MS", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let config =
            Config::default().with_overrides_from(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.api.base_url, "http://localhost:9000/v3/pdf");
        assert_eq!(config.polling.max_polls, 7);
        assert_eq!(config.polling.interval_ms, 2000);
    }

    #[test]
    fn test_validate_rejects_zero_polls() {
        let mut config = Config::default();
        config.polling.max_polls = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_redacted_hides_key() {
        let mut config = Config::default();
        config.api.app_key = Some("super-secret-9876".to_string());
        let json = serde_json::to_string(&config.redacted()).unwrap();
        assert!(!json.contains("super-secret"));
        assert!(json.contains("9876"));
    }

    #[tokio::test]
    async fn test_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ocrbridge.json");
        std::fs::write(&path, r#"{"api": {"request_timeout": 5}}"#).unwrap();

        let config = Config::load_from_path(&path).await.unwrap();
        assert_eq!(config.api.timeout(), Duration::from_secs(5));
        assert_eq!(config.source_path.as_deref(), Some(path.as_path()));
    }
}
