//! Cache module for storing CPI records
//!
//! The retrieval layer talks to the cache through the [`RecordCache`]
//! capability: `get` a record by key, or `put` one. Two stores implement it:
//! [`CacheManager`] persists each record as a JSON file in the user's cache
//! directory, and [`MemoryCache`] keeps records in process memory.

mod manager;
mod memory;

pub use manager::{CacheManager, CachedData};
pub use memory::MemoryCache;

use thiserror::Error;

/// Errors that can occur when writing to a cache store
#[derive(Debug, Error)]
pub enum CacheError {
    /// Filesystem operation failed
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Record could not be serialized
    #[error("Cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// In-memory store lock was poisoned by a panicking writer
    #[error("Cache lock poisoned")]
    Poisoned,
}

/// Key-value store for records of type `R`
///
/// Records are opaque to the store. `get` returns `None` for missing keys and
/// for entries that cannot be read back. `put` overwrites any existing entry.
pub trait RecordCache<R> {
    fn get(&self, key: &str) -> Option<R>;

    fn put(&self, key: &str, record: &R) -> Result<(), CacheError>;
}

impl<R, C: RecordCache<R> + ?Sized> RecordCache<R> for &C {
    fn get(&self, key: &str) -> Option<R> {
        (**self).get(key)
    }

    fn put(&self, key: &str, record: &R) -> Result<(), CacheError> {
        (**self).put(key, record)
    }
}
