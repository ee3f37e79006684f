//! Process-local attribute store.
//! Useful for tests and for routes whose translations are registered at startup.

use parking_lot::RwLock;

use super::{AttributeStore, StoreError, TranslationTuple, TupleId};

#[derive(Default)]
struct Rows {
    next_id: TupleId,
    rows: Vec<(TupleId, TranslationTuple)>,
}

#[derive(Default)]
pub struct MemoryAttributeStore {
    inner: RwLock<Rows>,
}

impl MemoryAttributeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().rows.is_empty()
    }

    /// Snapshot of all tuples in insertion order.
    pub fn tuples(&self) -> Vec<TranslationTuple> {
        self.inner.read().rows.iter().map(|(_, t)| t.clone()).collect()
    }

    fn find_by<F>(&self, pred: F) -> Option<(TupleId, TranslationTuple)>
    where
        F: Fn(&TranslationTuple) -> bool,
    {
        self.inner
            .read()
            .rows
            .iter()
            .find(|(_, t)| pred(t))
            .cloned()
    }
}

fn same_triple(t: &TranslationTuple, route: &str, locale: &str, attribute: &str) -> bool {
    t.route == route && t.locale == locale && t.attribute == attribute
}

impl AttributeStore for MemoryAttributeStore {
    fn find_original(
        &self,
        route: &str,
        locale: &str,
        attribute: &str,
        localized_value: &str,
    ) -> Result<Option<String>, StoreError> {
        Ok(self
            .find_by(|t| {
                same_triple(t, route, locale, attribute) && t.localized_value == localized_value
            })
            .map(|(_, t)| t.original_value))
    }

    fn find_localized(
        &self,
        route: &str,
        locale: &str,
        attribute: &str,
        original_value: &str,
    ) -> Result<Option<String>, StoreError> {
        Ok(self
            .find_by(|t| {
                same_triple(t, route, locale, attribute) && t.original_value == original_value
            })
            .map(|(_, t)| t.localized_value))
    }

    fn find_id(
        &self,
        route: &str,
        locale: &str,
        attribute: &str,
    ) -> Result<Option<TupleId>, StoreError> {
        Ok(self
            .find_by(|t| same_triple(t, route, locale, attribute))
            .map(|(id, _)| id))
    }

    fn update(
        &self,
        id: TupleId,
        localized_value: &str,
        original_value: &str,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        if let Some((_, tuple)) = inner.rows.iter_mut().find(|(row_id, _)| *row_id == id) {
            tuple.localized_value = localized_value.to_owned();
            tuple.original_value = original_value.to_owned();
        }
        Ok(())
    }

    fn insert(&self, tuple: &TranslationTuple) -> Result<TupleId, StoreError> {
        let mut inner = self.inner.write();
        // Keep the one-tuple-per-triple constraint the SQL schema enforces
        if let Some((id, existing)) = inner
            .rows
            .iter_mut()
            .find(|(_, t)| same_triple(t, &tuple.route, &tuple.locale, &tuple.attribute))
        {
            *existing = tuple.clone();
            return Ok(*id);
        }
        inner.next_id += 1;
        let id = inner.next_id;
        inner.rows.push((id, tuple.clone()));
        Ok(id)
    }
}
