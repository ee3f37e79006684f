//! route-translator: cached bidirectional translation of localized route attributes.
//! An attribute store holds (route, locale, attribute) -> (localized, original) tuples;
//! a cache backend in front of it answers repeated lookups without touching storage.

pub mod cache;
pub mod config;
pub mod store;
pub mod translate;

pub use cache::{CacheBackend, CacheBucket, CacheError, LruCacheBackend, SqliteCacheBackend};
pub use config::{CacheConfig, ConfigError, TranslatorConfig};
pub use store::{
    AttributeStore, MemoryAttributeStore, SqliteAttributeStore, StoreError, TranslationTuple,
};
pub use translate::key::{Direction, LookupKey};
pub use translate::{AttributeTranslator, TranslateError, TranslationCache};

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "route_translator=debug";

/// Install a global fmt subscriber filtered by `RUST_LOG` (or `default_filter`).
/// Returns false if a subscriber was already installed.
pub fn init_tracing(default_filter: &str) -> bool {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .try_init()
        .is_ok()
}
