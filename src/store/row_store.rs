use crate::model::{EntityId, EntityRecord};
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::sync::Arc;

/// In-memory rows of one list view, in server order.
///
/// Cloning shares the same rows. Ids are unique: inserting a row whose id is
/// already present replaces that row in place.
#[derive(Debug, Clone, Default)]
pub struct RowStore {
    rows: Arc<RwLock<Vec<EntityRecord>>>,
}

impl RowStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<EntityRecord>) -> Self {
        let store = Self::new();
        store.replace_all(records);
        store
    }

    /// Replace every row, e.g. after a list fetch
    pub fn replace_all(&self, records: Vec<EntityRecord>) {
        let mut deduped: Vec<EntityRecord> = Vec::with_capacity(records.len());
        for record in records {
            match deduped.iter_mut().find(|r| r.id == record.id) {
                Some(existing) => *existing = record,
                None => deduped.push(record),
            }
        }
        *self.rows.write() = deduped;
    }

    pub fn snapshot(&self) -> Vec<EntityRecord> {
        self.rows.read().clone()
    }

    pub fn get(&self, id: &EntityId) -> Option<EntityRecord> {
        self.rows.read().iter().find(|r| &r.id == id).cloned()
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.rows.read().iter().any(|r| &r.id == id)
    }

    /// Insert or replace a row, returns true if it was new
    pub fn upsert(&self, record: EntityRecord) -> bool {
        let mut rows = self.rows.write();
        match rows.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => {
                *existing = record;
                false
            }
            None => {
                rows.push(record);
                true
            }
        }
    }

    /// Field-level merge into the row with `id`; false if no such row
    pub fn merge_fields(&self, id: &EntityId, patch: &Map<String, Value>) -> bool {
        self.update(id, |record| record.merge(patch))
    }

    /// Run `f` against the row with `id` under the write lock
    pub fn update<F>(&self, id: &EntityId, f: F) -> bool
    where
        F: FnOnce(&mut EntityRecord),
    {
        let mut rows = self.rows.write();
        match rows.iter_mut().find(|r| &r.id == id) {
            Some(record) => {
                f(record);
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, id: &EntityId) -> Option<EntityRecord> {
        let mut rows = self.rows.write();
        let index = rows.iter().position(|r| &r.id == id)?;
        Some(rows.remove(index))
    }

    pub fn clear(&self) {
        self.rows.write().clear();
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_replace_all_dedupes_in_place() {
        let store = RowStore::from_records(vec![
            EntityRecord::new(1).with_field("name", "first"),
            EntityRecord::new(2).with_field("name", "second"),
            EntityRecord::new(1).with_field("name", "first again"),
        ]);

        assert_eq!(store.len(), 2);
        let rows = store.snapshot();
        assert_eq!(rows[0].text("name"), Some("first again"));
        assert_eq!(rows[1].id, EntityId::Num(2));
    }

    #[test]
    fn test_merge_fields_only_touches_matching_row() {
        let store = RowStore::from_records(vec![
            EntityRecord::new(1).with_field("active", true),
            EntityRecord::new(2).with_field("active", true),
        ]);

        let patch = json!({"active": false});
        assert!(store.merge_fields(&EntityId::Num(2), patch.as_object().unwrap()));
        assert!(!store.merge_fields(&EntityId::Num(3), patch.as_object().unwrap()));

        assert_eq!(store.get(&EntityId::Num(1)).unwrap().field("active"), Some(&json!(true)));
        assert_eq!(store.get(&EntityId::Num(2)).unwrap().field("active"), Some(&json!(false)));
    }

    #[test]
    fn test_upsert_and_remove() {
        let store = RowStore::new();
        assert!(store.upsert(EntityRecord::new("x")));
        assert!(!store.upsert(EntityRecord::new("x").with_field("name", "X")));
        assert_eq!(store.len(), 1);

        let shared = store.clone();
        assert!(shared.remove(&EntityId::from("x")).is_some());
        assert!(store.is_empty());
        assert!(store.remove(&EntityId::from("x")).is_none());
    }
}
