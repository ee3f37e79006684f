//! Translator configuration.
//! Loaded from JSON; every field has a default so a partial file is valid.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cache::memory::DEFAULT_CAPACITY;
use crate::cache::{CacheBackend, CacheError, LruCacheBackend, SqliteCacheBackend};
use crate::store::{SqliteAttributeStore, StoreError};
use crate::translate::TranslationCache;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    /// `record_translation` also fills the forward cache bucket.
    pub prime_cache_on_write: bool,
    /// SQLite attribute store; `None` keeps it in memory.
    pub database_path: Option<PathBuf>,
    pub cache: CacheConfig,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            prime_cache_on_write: true,
            database_path: None,
            cache: CacheConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CacheConfig {
    Memory {
        #[serde(default = "default_capacity")]
        capacity: usize,
        #[serde(default)]
        ttl_secs: Option<u64>,
    },
    Sqlite {
        /// `None` keeps the bucket table in memory.
        #[serde(default)]
        path: Option<PathBuf>,
        #[serde(default)]
        ttl_secs: Option<u64>,
        /// Run `cleanup_expired` on a background thread at this period.
        #[serde(default)]
        cleanup_interval_secs: Option<u64>,
    },
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig::Memory {
            capacity: DEFAULT_CAPACITY,
            ttl_secs: None,
        }
    }
}

impl CacheConfig {
    fn open(&self) -> Result<Arc<dyn CacheBackend>, ConfigError> {
        let backend: Arc<dyn CacheBackend> = match self {
            CacheConfig::Memory { capacity, ttl_secs } => Arc::new(LruCacheBackend::new(
                *capacity,
                ttl_secs.map(Duration::from_secs),
            )),
            CacheConfig::Sqlite {
                path,
                ttl_secs,
                cleanup_interval_secs,
            } => {
                let ttl = ttl_secs.map(Duration::from_secs);
                let sqlite = Arc::new(match path {
                    Some(path) => SqliteCacheBackend::open(path, ttl)?,
                    None => SqliteCacheBackend::open_in_memory(ttl)?,
                });
                if let Some(secs) = cleanup_interval_secs {
                    // Detached; the thread exits once the backend is dropped
                    SqliteCacheBackend::start_cleanup_loop(&sqlite, Duration::from_secs(*secs))
                        .map_err(ConfigError::Io)?;
                }
                sqlite
            }
        };
        Ok(backend)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Store(StoreError),
    Cache(CacheError),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config IO error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
            ConfigError::Store(e) => write!(f, "failed to open attribute store: {e}"),
            ConfigError::Cache(e) => write!(f, "failed to open cache backend: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Store(e) => Some(e),
            ConfigError::Cache(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

impl From<StoreError> for ConfigError {
    fn from(e: StoreError) -> Self {
        ConfigError::Store(e)
    }
}

impl From<CacheError> for ConfigError {
    fn from(e: CacheError) -> Self {
        ConfigError::Cache(e)
    }
}

impl TranslatorConfig {
    /// Load configuration from a JSON file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Open the configured store and cache and wire them into a translator.
    pub fn build(&self) -> Result<TranslationCache, ConfigError> {
        let store = match &self.database_path {
            Some(path) => SqliteAttributeStore::open(path)?,
            None => SqliteAttributeStore::open_in_memory()?,
        };
        let cache = self.cache.open()?;

        info!(
            prime_cache_on_write = self.prime_cache_on_write,
            persistent = self.database_path.is_some(),
            "route translator ready"
        );

        Ok(TranslationCache::with_priming(
            Arc::new(store),
            cache,
            self.prime_cache_on_write,
        ))
    }
}
