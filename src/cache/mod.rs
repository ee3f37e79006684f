//! Cache backends for translated attribute values.
//! A backend maps derived string keys to whole buckets; callers fetch, merge one
//! entry and write the bucket back. Last write wins per key.

pub mod memory;
pub mod sqlite;

use serde::{Deserialize, Serialize};

use crate::translate::key::LookupKey;

pub use memory::LruCacheBackend;
pub use sqlite::SqliteCacheBackend;

/// Key-value cache consulted before the attribute store.
pub trait CacheBackend: Send + Sync {
    /// Fetch the bucket stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<CacheBucket>, CacheError>;

    /// Replace the bucket stored under `key`.
    fn put(&self, key: &str, bucket: CacheBucket) -> Result<(), CacheError>;
}

/// One cached lookup and its translated result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketEntry {
    pub lookup: LookupKey,
    pub result: String,
}

/// All lookups stored under one derived cache key.
/// Usually a single entry; kept as a list so a digest collision degrades to a
/// linear scan instead of a wrong answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheBucket {
    entries: Vec<BucketEntry>,
}

impl CacheBucket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Result for the exact lookup, if cached.
    pub fn get(&self, lookup: &LookupKey) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| &e.lookup == lookup)
            .map(|e| e.result.as_str())
    }

    /// Insert or replace the result for `lookup`.
    pub fn insert(&mut self, lookup: LookupKey, result: String) {
        match self.entries.iter_mut().find(|e| e.lookup == lookup) {
            Some(entry) => entry.result = result,
            None => self.entries.push(BucketEntry { lookup, result }),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug)]
pub enum CacheError {
    Sqlite(rusqlite::Error),
    Serialization(serde_json::Error),
}

impl std::fmt::Display for CacheError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheError::Sqlite(e) => write!(f, "cache database error: {e}"),
            CacheError::Serialization(e) => write!(f, "cache bucket serialization error: {e}"),
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CacheError::Sqlite(e) => Some(e),
            CacheError::Serialization(e) => Some(e),
        }
    }
}

impl From<rusqlite::Error> for CacheError {
    fn from(e: rusqlite::Error) -> Self {
        CacheError::Sqlite(e)
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(e: serde_json::Error) -> Self {
        CacheError::Serialization(e)
    }
}
