//! Submission settings that no configuration layer may override.

use serde_json::{Map, Value};

/// Key of the options object that carries the enforced settings.
pub const METADATA_KEY: &str = "metadata";

/// Privacy settings attached to every submission.
///
/// Applied last during option merging, so built-in defaults, configured
/// defaults and caller options can never re-enable training use or
/// indefinite retention.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnforcedPrivacy;

impl EnforcedPrivacy {
    /// The enforced key/value pairs.
    pub fn settings(&self) -> [(&'static str, Value); 2] {
        [
            ("allow_training", Value::Bool(false)),
            ("retain_indefinitely", Value::Bool(false)),
        ]
    }

    /// Write the enforced settings into a merged options object.
    ///
    /// A non-object `metadata` value supplied by a lower layer is replaced.
    pub fn apply(&self, options: &mut Map<String, Value>) {
        let metadata = options
            .entry(METADATA_KEY.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !metadata.is_object() {
            *metadata = Value::Object(Map::new());
        }
        if let Value::Object(map) = metadata {
            for (key, value) in self.settings() {
                map.insert(key.to_string(), value);
            }
        }
    }
}
