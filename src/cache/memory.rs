//! In-process record store

use std::collections::HashMap;
use std::sync::RwLock;

use super::{CacheError, RecordCache};

/// Thread-safe in-memory cache of records
///
/// Contents live as long as the store. Used when no cache directory is
/// available, when disk caching is turned off, and in tests.
#[derive(Debug)]
pub struct MemoryCache<R> {
    entries: RwLock<HashMap<String, R>>,
}

impl<R> Default for MemoryCache<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> MemoryCache<R> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of entries in the cache
    pub fn len(&self) -> usize {
        self.entries.read().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted list of keys currently present
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .entries
            .read()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }
}

impl<R: Clone> RecordCache<R> for MemoryCache<R> {
    fn get(&self, key: &str) -> Option<R> {
        self.entries.read().ok()?.get(key).cloned()
    }

    fn put(&self, key: &str, record: &R) -> Result<(), CacheError> {
        let mut map = self.entries.write().map_err(|_| CacheError::Poisoned)?;
        map.insert(key.to_string(), record.clone());
        Ok(())
    }
}
