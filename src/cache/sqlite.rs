//! Persistent bucket cache backed by SQLite.
//! Buckets are stored as JSON text under their derived key.
//! Survives restarts; optional TTL bounds how long stale pairs can be served.
//! Rows are stamped in whole seconds, so a TTL is rounded up to the next second.

use std::path::Path;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, warn};

use super::{CacheBackend, CacheBucket, CacheError};

pub struct SqliteCacheBackend {
    conn: Mutex<Connection>,
    ttl: Option<Duration>,
}

impl SqliteCacheBackend {
    /// Open (or create) the cache database at the given path.
    pub fn open(db_path: &Path, ttl: Option<Duration>) -> Result<Self, CacheError> {
        let conn = Connection::open(db_path)?;

        // WAL mode for better concurrent read performance
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let backend = Self::with_connection(conn, ttl)?;
        info!(path = %db_path.display(), "SQLite bucket cache opened");
        Ok(backend)
    }

    /// Cache living only as long as this value.
    pub fn open_in_memory(ttl: Option<Duration>) -> Result<Self, CacheError> {
        Self::with_connection(Connection::open_in_memory()?, ttl)
    }

    fn with_connection(conn: Connection, ttl: Option<Duration>) -> Result<Self, CacheError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS translation_buckets (
                cache_key TEXT PRIMARY KEY,
                bucket TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_buckets_created
                ON translation_buckets(created_at);",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
            ttl,
        })
    }

    /// Newest `created_at` already considered expired.
    fn cutoff(&self) -> i64 {
        match self.ttl {
            Some(ttl) => now_unix().saturating_sub(ttl_secs(ttl)),
            None => i64::MIN,
        }
    }

    /// Remove expired buckets. Returns the number removed.
    pub fn cleanup_expired(&self) -> Result<usize, CacheError> {
        if self.ttl.is_none() {
            return Ok(0);
        }
        let conn = self.conn.lock();
        let count = conn.execute(
            "DELETE FROM translation_buckets WHERE created_at <= ?1",
            params![self.cutoff()],
        )?;
        if count > 0 {
            info!(removed = count, "bucket cache cleanup");
        }
        Ok(count)
    }

    /// Drop every cached bucket.
    pub fn clear(&self) -> Result<(), CacheError> {
        self.conn.lock().execute("DELETE FROM translation_buckets", [])?;
        Ok(())
    }

    pub fn len(&self) -> Result<usize, CacheError> {
        let conn = self.conn.lock();
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM translation_buckets", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Start a background cleanup loop on a named thread.
    /// The thread holds only a weak handle and exits once the backend is dropped.
    pub fn start_cleanup_loop(
        cache: &Arc<Self>,
        interval: Duration,
    ) -> std::io::Result<std::thread::JoinHandle<()>> {
        let cache: Weak<Self> = Arc::downgrade(cache);
        std::thread::Builder::new()
            .name("bucket-cache-cleanup".into())
            .spawn(move || loop {
                std::thread::sleep(interval);
                let Some(cache) = cache.upgrade() else {
                    debug!("bucket cache dropped, cleanup loop exiting");
                    return;
                };
                if let Err(e) = cache.cleanup_expired() {
                    warn!(error = %e, "bucket cache cleanup failed");
                }
            })
    }
}

impl CacheBackend for SqliteCacheBackend {
    fn get(&self, key: &str) -> Result<Option<CacheBucket>, CacheError> {
        let conn = self.conn.lock();
        let stored: Option<String> = conn
            .query_row(
                "SELECT bucket FROM translation_buckets
                 WHERE cache_key = ?1 AND created_at > ?2",
                params![key, self.cutoff()],
                |row| row.get(0),
            )
            .optional()?;

        match stored {
            Some(json) => {
                debug!(key, "bucket cache hit");
                Ok(Some(serde_json::from_str(&json)?))
            }
            None => Ok(None),
        }
    }

    fn put(&self, key: &str, bucket: CacheBucket) -> Result<(), CacheError> {
        let json = serde_json::to_string(&bucket)?;
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR REPLACE INTO translation_buckets (cache_key, bucket, created_at)
             VALUES (?1, ?2, ?3)",
            params![key, json, now_unix()],
        )?;
        Ok(())
    }
}

/// TTL in whole seconds, rounded up and clamped to the timestamp range.
fn ttl_secs(ttl: Duration) -> i64 {
    let secs = ttl.as_secs().saturating_add(u64::from(ttl.subsec_nanos() > 0));
    i64::try_from(secs).unwrap_or(i64::MAX)
}

/// Current time as Unix timestamp (seconds).
fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
