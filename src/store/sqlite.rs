//! SQLite-backed attribute store.
//! Table `routing_translations`: synthetic id, unique (route, locale, attribute),
//! secondary index on localized_value for the reverse-heavy lookups.

use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use super::{AttributeStore, StoreError, TranslationTuple, TupleId};

/// Schema for the translation table. Idempotent.
pub const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS routing_translations (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        route TEXT NOT NULL,
        locale TEXT NOT NULL,
        attribute TEXT NOT NULL,
        localized_value TEXT NOT NULL,
        original_value TEXT NOT NULL,
        UNIQUE (route, locale, attribute)
    );
    CREATE INDEX IF NOT EXISTS idx_routing_translations_localized
        ON routing_translations(localized_value);";

pub struct SqliteAttributeStore {
    conn: Mutex<Connection>,
}

impl SqliteAttributeStore {
    /// Open (or create) the database at the given path and provision the schema.
    pub fn open(db_path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(db_path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let store = Self::with_connection(conn)?;
        info!(path = %db_path.display(), "attribute store opened");
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    /// Wrap an existing connection, provisioning the schema on it.
    pub fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        provision_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// All tuples ordered by id.
    pub fn tuples(&self) -> Result<Vec<TranslationTuple>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT route, locale, attribute, localized_value, original_value
             FROM routing_translations ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(TranslationTuple {
                route: row.get(0)?,
                locale: row.get(1)?,
                attribute: row.get(2)?,
                localized_value: row.get(3)?,
                original_value: row.get(4)?,
            })
        })?;
        let tuples = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(tuples)
    }

    fn find_column(
        &self,
        query: &str,
        route: &str,
        locale: &str,
        attribute: &str,
        value: &str,
    ) -> Result<Option<String>, StoreError> {
        let conn = self.conn.lock();
        let found = conn
            .query_row(query, params![route, locale, attribute, value], |row| row.get(0))
            .optional()?;
        Ok(found)
    }
}

/// Create the translation table and its indexes if they are missing.
pub fn provision_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

impl AttributeStore for SqliteAttributeStore {
    fn find_original(
        &self,
        route: &str,
        locale: &str,
        attribute: &str,
        localized_value: &str,
    ) -> Result<Option<String>, StoreError> {
        self.find_column(
            "SELECT original_value FROM routing_translations
             WHERE route = ?1 AND locale = ?2 AND attribute = ?3 AND localized_value = ?4",
            route,
            locale,
            attribute,
            localized_value,
        )
    }

    fn find_localized(
        &self,
        route: &str,
        locale: &str,
        attribute: &str,
        original_value: &str,
    ) -> Result<Option<String>, StoreError> {
        self.find_column(
            "SELECT localized_value FROM routing_translations
             WHERE route = ?1 AND locale = ?2 AND attribute = ?3 AND original_value = ?4",
            route,
            locale,
            attribute,
            original_value,
        )
    }

    fn find_id(
        &self,
        route: &str,
        locale: &str,
        attribute: &str,
    ) -> Result<Option<TupleId>, StoreError> {
        let conn = self.conn.lock();
        let id = conn
            .query_row(
                "SELECT id FROM routing_translations
                 WHERE route = ?1 AND locale = ?2 AND attribute = ?3",
                params![route, locale, attribute],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    fn update(
        &self,
        id: TupleId,
        localized_value: &str,
        original_value: &str,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE routing_translations SET localized_value = ?1, original_value = ?2
             WHERE id = ?3",
            params![localized_value, original_value, id],
        )?;
        Ok(())
    }

    fn insert(&self, tuple: &TranslationTuple) -> Result<TupleId, StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO routing_translations
             (route, locale, attribute, localized_value, original_value)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                tuple.route,
                tuple.locale,
                tuple.attribute,
                tuple.localized_value,
                tuple.original_value,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Single statement, so writers in other processes cannot race the
    /// uniqueness constraint between the id lookup and the insert.
    fn upsert(&self, tuple: &TranslationTuple) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO routing_translations
             (route, locale, attribute, localized_value, original_value)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (route, locale, attribute) DO UPDATE SET
                localized_value = excluded.localized_value,
                original_value = excluded.original_value",
            params![
                tuple.route,
                tuple.locale,
                tuple.attribute,
                tuple.localized_value,
                tuple.original_value,
            ],
        )?;
        debug!(
            route = %tuple.route,
            locale = %tuple.locale,
            attribute = %tuple.attribute,
            "tuple upserted"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn scenario_tuple() -> TranslationTuple {
        TranslationTuple::new("product_show", "de", "slug", "mein-produkt", "my-product")
    }

    #[test]
    fn test_insert_and_find_both_directions() {
        let store = SqliteAttributeStore::open_in_memory().unwrap();
        store.insert(&scenario_tuple()).unwrap();

        assert_eq!(
            store.find_original("product_show", "de", "slug", "mein-produkt").unwrap(),
            Some("my-product".to_string())
        );
        assert_eq!(
            store.find_localized("product_show", "de", "slug", "my-product").unwrap(),
            Some("mein-produkt".to_string())
        );
        assert_eq!(store.find_original("product_show", "de", "slug", "unknown").unwrap(), None);
    }

    #[test]
    fn test_unique_triple_enforced() {
        let store = SqliteAttributeStore::open_in_memory().unwrap();
        store.insert(&scenario_tuple()).unwrap();

        let duplicate = TranslationTuple::new("product_show", "de", "slug", "x", "y");
        assert!(matches!(store.insert(&duplicate), Err(StoreError::Sqlite(_))));
    }

    #[test]
    fn test_upsert_updates_in_place() {
        let store = SqliteAttributeStore::open_in_memory().unwrap();
        store.upsert(&TranslationTuple::new("r", "de", "slug", "l1", "o1")).unwrap();
        let id = store.find_id("r", "de", "slug").unwrap();
        assert!(id.is_some());

        store.upsert(&TranslationTuple::new("r", "de", "slug", "l2", "o2")).unwrap();

        assert_eq!(store.find_id("r", "de", "slug").unwrap(), id);
        assert_eq!(
            store.tuples().unwrap(),
            vec![TranslationTuple::new("r", "de", "slug", "l2", "o2")]
        );
    }

    #[test]
    fn test_update_by_id() {
        let store = SqliteAttributeStore::open_in_memory().unwrap();
        let id = store.insert(&scenario_tuple()).unwrap();
        store.update(id, "neues-produkt", "new-product").unwrap();

        assert_eq!(
            store.find_original("product_show", "de", "slug", "neues-produkt").unwrap(),
            Some("new-product".to_string())
        );
        assert_eq!(
            store.find_original("product_show", "de", "slug", "mein-produkt").unwrap(),
            None
        );
    }

    #[test]
    fn test_schema_provisioning_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("routing.db");

        {
            let store = SqliteAttributeStore::open(&path).unwrap();
            store.insert(&scenario_tuple()).unwrap();
        }

        // Reopening re-runs provisioning without touching existing rows
        let store = SqliteAttributeStore::open(&path).unwrap();
        assert_eq!(store.tuples().unwrap(), vec![scenario_tuple()]);
    }

    #[test]
    fn test_localized_value_index_exists() {
        let store = SqliteAttributeStore::open_in_memory().unwrap();
        let conn = store.conn.lock();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master
                 WHERE type = 'index' AND name = 'idx_routing_translations_localized'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }
}
