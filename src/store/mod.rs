//! Persistent attribute translations.
//! One tuple per (route, locale, attribute); the store is the only
//! authoritative copy, caches in front of it are advisory.

pub mod memory;
pub mod sqlite;

use serde::{Deserialize, Serialize};

pub use memory::MemoryAttributeStore;
pub use sqlite::SqliteAttributeStore;

/// Synthetic row identifier of a stored tuple.
pub type TupleId = i64;

/// A localized attribute value and its canonical original.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationTuple {
    pub route: String,
    pub locale: String,
    pub attribute: String,
    pub localized_value: String,
    pub original_value: String,
}

impl TranslationTuple {
    pub fn new(
        route: &str,
        locale: &str,
        attribute: &str,
        localized_value: &str,
        original_value: &str,
    ) -> Self {
        Self {
            route: route.to_owned(),
            locale: locale.to_owned(),
            attribute: attribute.to_owned(),
            localized_value: localized_value.to_owned(),
            original_value: original_value.to_owned(),
        }
    }
}

/// Lookup and storage of translation tuples.
/// `None` from a finder means "no such tuple", never a failure.
pub trait AttributeStore: Send + Sync {
    fn find_original(
        &self,
        route: &str,
        locale: &str,
        attribute: &str,
        localized_value: &str,
    ) -> Result<Option<String>, StoreError>;

    fn find_localized(
        &self,
        route: &str,
        locale: &str,
        attribute: &str,
        original_value: &str,
    ) -> Result<Option<String>, StoreError>;

    fn find_id(
        &self,
        route: &str,
        locale: &str,
        attribute: &str,
    ) -> Result<Option<TupleId>, StoreError>;

    /// Replace the values of an existing tuple, keeping its identity.
    fn update(
        &self,
        id: TupleId,
        localized_value: &str,
        original_value: &str,
    ) -> Result<(), StoreError>;

    fn insert(&self, tuple: &TranslationTuple) -> Result<TupleId, StoreError>;

    /// Update the tuple for the triple if one exists, insert it otherwise.
    fn upsert(&self, tuple: &TranslationTuple) -> Result<(), StoreError> {
        match self.find_id(&tuple.route, &tuple.locale, &tuple.attribute)? {
            Some(id) => self.update(id, &tuple.localized_value, &tuple.original_value),
            None => self.insert(tuple).map(|_| ()),
        }
    }
}

#[derive(Debug)]
pub enum StoreError {
    Sqlite(rusqlite::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Sqlite(e) => write!(f, "attribute store database error: {e}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Sqlite(e) => Some(e),
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Sqlite(e)
    }
}
