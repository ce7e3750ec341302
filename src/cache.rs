//! Write-once keyed store for per-job results.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Keyed store where the first insert for a key wins.
///
/// Values are shared as `Arc<T>` so readers never hold the lock while using
/// them. A poisoned lock is recovered, since entries are never mutated in
/// place.
#[derive(Debug)]
pub struct WriteOnceCache<T> {
    entries: RwLock<HashMap<String, Arc<T>>>,
}

impl<T> Default for WriteOnceCache<T> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<T> WriteOnceCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `value` unless `key` is already present.
    ///
    /// Returns the stored value, which is the existing one when the key was
    /// already taken.
    pub fn insert(&self, key: &str, value: T) -> Arc<T> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(value))
            .clone()
    }

    pub fn get(&self, key: &str) -> Option<Arc<T>> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }
}
