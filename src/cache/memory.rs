//! In-memory LRU bucket cache with optional TTL.
//! Process-local; buckets are cloned in and out.

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;

use super::{CacheBackend, CacheBucket, CacheError};

/// Default number of buckets kept in memory.
pub const DEFAULT_CAPACITY: usize = 512;

struct Entry {
    bucket: CacheBucket,
    inserted_at: Instant,
}

pub struct LruCacheBackend {
    inner: Mutex<LruCache<String, Entry>>,
    ttl: Option<Duration>,
}

impl LruCacheBackend {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize, ttl: Option<Duration>) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Drop every cached bucket.
    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    fn is_expired(&self, entry: &Entry) -> bool {
        self.ttl
            .map(|ttl| entry.inserted_at.elapsed() >= ttl)
            .unwrap_or(false)
    }
}

impl Default for LruCacheBackend {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, None)
    }
}

impl CacheBackend for LruCacheBackend {
    fn get(&self, key: &str) -> Result<Option<CacheBucket>, CacheError> {
        let mut cache = self.inner.lock();
        let expired = match cache.get(key) {
            Some(entry) if !self.is_expired(entry) => return Ok(Some(entry.bucket.clone())),
            Some(_) => true,
            None => false,
        };
        if expired {
            cache.pop(key);
        }
        Ok(None)
    }

    fn put(&self, key: &str, bucket: CacheBucket) -> Result<(), CacheError> {
        self.inner.lock().put(
            key.to_owned(),
            Entry {
                bucket,
                inserted_at: Instant::now(),
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::key::LookupKey;

    fn bucket_with(value: &str, result: &str) -> CacheBucket {
        let mut bucket = CacheBucket::new();
        bucket.insert(LookupKey::forward("r", "de", "slug", value), result.into());
        bucket
    }

    #[test]
    fn test_put_then_get() {
        let cache = LruCacheBackend::default();
        cache.put("k", bucket_with("a", "b")).unwrap();

        assert_eq!(cache.get("k").unwrap(), Some(bucket_with("a", "b")));
        assert_eq!(cache.get("missing").unwrap(), None);
    }

    #[test]
    fn test_last_write_wins() {
        let cache = LruCacheBackend::default();
        cache.put("k", bucket_with("a", "b")).unwrap();
        cache.put("k", bucket_with("a", "c")).unwrap();

        assert_eq!(cache.get("k").unwrap(), Some(bucket_with("a", "c")));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_eviction() {
        let cache = LruCacheBackend::new(2, None);
        cache.put("k0", CacheBucket::new()).unwrap();
        cache.put("k1", CacheBucket::new()).unwrap();
        cache.put("k2", CacheBucket::new()).unwrap();

        assert_eq!(cache.len(), 2);
        assert!(cache.get("k0").unwrap().is_none());
        assert!(cache.get("k2").unwrap().is_some());
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let cache = LruCacheBackend::new(0, None);
        cache.put("k", CacheBucket::new()).unwrap();
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_ttl_expiry() {
        let cache = LruCacheBackend::new(8, Some(Duration::ZERO));
        cache.put("k", bucket_with("a", "b")).unwrap();

        assert!(cache.get("k").unwrap().is_none());
        // Expired entry is removed on read
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear() {
        let cache = LruCacheBackend::default();
        cache.put("k", CacheBucket::new()).unwrap();
        cache.clear();
        assert!(cache.is_empty());
    }
}
