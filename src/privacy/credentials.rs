//! Service credentials and secret redaction.

use std::fmt;

/// Number of trailing characters of a secret that may be retained.
pub const REDACTED_SUFFIX_LEN: usize = 4;

/// Mask a secret, keeping only its last [`REDACTED_SUFFIX_LEN`] characters.
///
/// Secrets no longer than the suffix are masked completely.
pub fn redact_secret(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= REDACTED_SUFFIX_LEN {
        return "****".to_string();
    }
    let suffix: String = secret.chars().skip(count - REDACTED_SUFFIX_LEN).collect();
    format!("****{}", suffix)
}

/// Application id and key sent with every request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub app_id: String,
    pub app_key: String,
}

impl Credentials {
    pub fn new(app_id: impl Into<String>, app_key: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            app_key: app_key.into(),
        }
    }

    /// The key in redacted form.
    pub fn key_hint(&self) -> String {
        redact_secret(&self.app_key)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("app_id", &self.app_id)
            .field("app_key", &self.key_hint())
            .finish()
    }
}
