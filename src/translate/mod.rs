//! Cached translation of route attribute values.
//! Read-through: derived key -> bucket hit, else attribute store -> bucket write-back.
//! Write-through: store upsert, then (optionally) prime the forward bucket.
//!
//! Stale entries are tolerated. After a tuple's values change, the bucket for the
//! old value keeps answering until it is overwritten or evicted by the backend.

pub mod key;

use std::sync::Arc;

use tracing::debug;

use crate::cache::{CacheBackend, CacheError};
use crate::store::{AttributeStore, StoreError, TranslationTuple};
use key::LookupKey;

/// Translator trait (adapter for URL matching and generation).
pub trait AttributeTranslator: Send + Sync {
    /// Localized value -> original value, or `value` unchanged when unknown.
    fn translate(
        &self,
        route: &str,
        locale: &str,
        attribute: &str,
        value: &str,
    ) -> Result<String, TranslateError>;

    /// Original value -> localized value, or `value` unchanged when unknown.
    fn reverse_translate(
        &self,
        route: &str,
        locale: &str,
        attribute: &str,
        value: &str,
    ) -> Result<String, TranslateError>;
}

#[derive(Debug)]
pub enum TranslateError {
    Store(StoreError),
    Cache(CacheError),
}

impl std::fmt::Display for TranslateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranslateError::Store(e) => write!(f, "attribute store failed: {e}"),
            TranslateError::Cache(e) => write!(f, "translation cache failed: {e}"),
        }
    }
}

impl std::error::Error for TranslateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TranslateError::Store(e) => Some(e),
            TranslateError::Cache(e) => Some(e),
        }
    }
}

impl From<StoreError> for TranslateError {
    fn from(e: StoreError) -> Self {
        TranslateError::Store(e)
    }
}

impl From<CacheError> for TranslateError {
    fn from(e: CacheError) -> Self {
        TranslateError::Cache(e)
    }
}

/// Attribute store with a mandatory cache in front of it.
pub struct TranslationCache {
    store: Arc<dyn AttributeStore>,
    cache: Arc<dyn CacheBackend>,
    /// Populate the forward bucket on `record_translation`.
    prime_cache_on_write: bool,
}

impl TranslationCache {
    /// Create a translator that primes the cache on write.
    pub fn new(store: Arc<dyn AttributeStore>, cache: Arc<dyn CacheBackend>) -> Self {
        Self::with_priming(store, cache, true)
    }

    pub fn with_priming(
        store: Arc<dyn AttributeStore>,
        cache: Arc<dyn CacheBackend>,
        prime_cache_on_write: bool,
    ) -> Self {
        Self {
            store,
            cache,
            prime_cache_on_write,
        }
    }

    pub fn primes_cache_on_write(&self) -> bool {
        self.prime_cache_on_write
    }

    /// Localized value -> original value. Unknown values pass through unchanged.
    pub fn translate(
        &self,
        route: &str,
        locale: &str,
        attribute: &str,
        value: &str,
    ) -> Result<String, TranslateError> {
        let lookup = LookupKey::forward(route, locale, attribute, value);
        self.read_through(lookup, |store| {
            store.find_original(route, locale, attribute, value)
        })
    }

    /// Original value -> localized value. Unknown values pass through unchanged.
    pub fn reverse_translate(
        &self,
        route: &str,
        locale: &str,
        attribute: &str,
        value: &str,
    ) -> Result<String, TranslateError> {
        let lookup = LookupKey::reverse(route, locale, attribute, value);
        self.read_through(lookup, |store| {
            store.find_localized(route, locale, attribute, value)
        })
    }

    /// Store (or overwrite) the pair for the triple, then prime the forward bucket.
    /// The reverse direction is populated on its own first miss.
    pub fn record_translation(
        &self,
        route: &str,
        locale: &str,
        attribute: &str,
        localized_value: &str,
        original_value: &str,
    ) -> Result<(), TranslateError> {
        let tuple =
            TranslationTuple::new(route, locale, attribute, localized_value, original_value);
        self.store.upsert(&tuple)?;

        if self.prime_cache_on_write {
            let lookup = LookupKey::forward(route, locale, attribute, localized_value);
            debug!(route, locale, attribute, "priming forward translation");
            self.write_back(&lookup.cache_key(), lookup, original_value.to_owned())?;
        }
        Ok(())
    }

    fn read_through<F>(&self, lookup: LookupKey, query: F) -> Result<String, TranslateError>
    where
        F: FnOnce(&dyn AttributeStore) -> Result<Option<String>, StoreError>,
    {
        let cache_key = lookup.cache_key();
        let bucket = self.cache.get(&cache_key)?;
        if let Some(hit) = bucket.as_ref().and_then(|b| b.get(&lookup)) {
            debug!(direction = %lookup.direction, route = %lookup.route, "translation cache hit");
            return Ok(hit.to_owned());
        }

        debug!(direction = %lookup.direction, route = %lookup.route, "translation cache miss");
        let result = match query(self.store.as_ref())? {
            Some(translated) => translated,
            None => lookup.value.clone(),
        };

        let mut bucket = bucket.unwrap_or_default();
        bucket.insert(lookup, result.clone());
        self.cache.put(&cache_key, bucket)?;
        Ok(result)
    }

    /// Merge one pair into the bucket under `cache_key` and store it.
    fn write_back(
        &self,
        cache_key: &str,
        lookup: LookupKey,
        result: String,
    ) -> Result<(), TranslateError> {
        let mut bucket = self.cache.get(cache_key)?.unwrap_or_default();
        bucket.insert(lookup, result);
        self.cache.put(cache_key, bucket)?;
        Ok(())
    }
}

impl AttributeTranslator for TranslationCache {
    fn translate(
        &self,
        route: &str,
        locale: &str,
        attribute: &str,
        value: &str,
    ) -> Result<String, TranslateError> {
        TranslationCache::translate(self, route, locale, attribute, value)
    }

    fn reverse_translate(
        &self,
        route: &str,
        locale: &str,
        attribute: &str,
        value: &str,
    ) -> Result<String, TranslateError> {
        TranslationCache::reverse_translate(self, route, locale, attribute, value)
    }
}
