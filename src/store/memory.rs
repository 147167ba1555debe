//! In-memory record store
//!
//! Rows live in a sequence-keyed map (insertion order) with an id index on top.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use serde_json::{Map, Value};

use super::errors::{StoreError, StoreResult};
use super::{apply_patch, RecordStore};
use crate::entity::{Entity, Record, RecordId};

#[derive(Debug)]
struct Collection<E> {
    next_slot: u64,
    rows: BTreeMap<u64, Record<E>>,
    by_id: HashMap<RecordId, u64>,
}

impl<E> Default for Collection<E> {
    fn default() -> Self {
        Self {
            next_slot: 0,
            rows: BTreeMap::new(),
            by_id: HashMap::new(),
        }
    }
}

/// In-memory store for one entity kind
#[derive(Debug)]
pub struct MemoryRecordStore<E> {
    collection: RwLock<Collection<E>>,
}

impl<E> Default for MemoryRecordStore<E> {
    fn default() -> Self {
        Self {
            collection: RwLock::new(Collection::default()),
        }
    }
}

impl<E: Entity> MemoryRecordStore<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with existing rows, keeping their identifiers.
    pub fn with_records(records: impl IntoIterator<Item = Record<E>>) -> Self {
        let store = Self::new();
        if let Ok(mut col) = store.collection.write() {
            for record in records {
                let slot = col.next_slot;
                col.next_slot += 1;
                col.by_id.insert(record.id, slot);
                col.rows.insert(slot, record);
            }
        }
        store
    }

    /// Row count
    pub fn len(&self) -> usize {
        self.collection.read().map(|c| c.rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E: Entity> RecordStore<E> for MemoryRecordStore<E> {
    async fn insert(&self, fields: E, owner_id: Option<String>) -> StoreResult<RecordId> {
        let mut col = self.collection.write().map_err(|_| StoreError::lock_poisoned())?;

        let record = Record::new(fields, owner_id);
        let id = record.id;
        let slot = col.next_slot;
        col.next_slot += 1;
        col.by_id.insert(id, slot);
        col.rows.insert(slot, record);

        Ok(id)
    }

    async fn get(&self, id: RecordId) -> StoreResult<Option<Record<E>>> {
        let col = self.collection.read().map_err(|_| StoreError::lock_poisoned())?;
        Ok(col.by_id.get(&id).and_then(|slot| col.rows.get(slot)).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<Record<E>>> {
        let col = self.collection.read().map_err(|_| StoreError::lock_poisoned())?;
        Ok(col.rows.values().cloned().collect())
    }

    async fn patch(&self, id: RecordId, partial: Map<String, Value>) -> StoreResult<Record<E>> {
        let mut col = self.collection.write().map_err(|_| StoreError::lock_poisoned())?;

        let slot = *col
            .by_id
            .get(&id)
            .ok_or_else(|| StoreError::not_found(E::COLLECTION, id))?;
        let current = col
            .rows
            .get(&slot)
            .ok_or_else(|| StoreError::not_found(E::COLLECTION, id))?;

        let updated = apply_patch(current, partial)?;
        col.rows.insert(slot, updated.clone());

        Ok(updated)
    }

    async fn delete(&self, id: RecordId) -> StoreResult<()> {
        let mut col = self.collection.write().map_err(|_| StoreError::lock_poisoned())?;

        let slot = col
            .by_id
            .remove(&id)
            .ok_or_else(|| StoreError::not_found(E::COLLECTION, id))?;
        col.rows.remove(&slot);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Department, Specialty, Teacher};
    use serde_json::json;

    fn teacher(name: &str) -> Teacher {
        Teacher {
            employee_number: "EMP-0001".into(),
            full_name: name.into(),
            email: "docente@uni.edu".into(),
            department: Department::Sciences,
            specialty: Specialty::Mathematics,
        }
    }

    #[tokio::test]
    async fn test_insert_then_get() {
        let store = MemoryRecordStore::new();
        let id = store.insert(teacher("Luis Pérez"), None).await.unwrap();

        let record = store.get(id).await.unwrap().unwrap();
        assert_eq!(record.id, id);
        assert_eq!(record.fields, teacher("Luis Pérez"));
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let store: MemoryRecordStore<Teacher> = MemoryRecordStore::new();
        assert!(store.get(RecordId::generate()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_keeps_insertion_order() {
        let store = MemoryRecordStore::new();
        for name in ["Ana", "Beto", "Caro"] {
            store.insert(teacher(name), None).await.unwrap();
        }

        let names: Vec<_> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.fields.full_name)
            .collect();
        assert_eq!(names, vec!["Ana", "Beto", "Caro"]);
    }

    #[tokio::test]
    async fn test_patch_partial_fields() {
        let store = MemoryRecordStore::new();
        let id = store.insert(teacher("Luis Pérez"), Some("user_1".into())).await.unwrap();

        let mut partial = Map::new();
        partial.insert("especialidad".into(), json!("Historia"));
        let updated = store.patch(id, partial).await.unwrap();

        assert_eq!(updated.id, id);
        assert_eq!(updated.owner_id.as_deref(), Some("user_1"));
        assert_eq!(updated.fields.specialty, Specialty::History);
        assert_eq!(updated.fields.full_name, "Luis Pérez");
        assert_eq!(store.get(id).await.unwrap().unwrap(), updated);
    }

    #[tokio::test]
    async fn test_patch_cannot_touch_identifier() {
        let store = MemoryRecordStore::new();
        let id = store.insert(teacher("Luis Pérez"), None).await.unwrap();

        let mut partial = Map::new();
        partial.insert("_id".into(), json!(RecordId::generate().to_string()));
        let err = store.patch(id, partial).await.unwrap_err();

        assert!(matches!(err, StoreError::MalformedDocument(_)));
        assert_eq!(store.get(id).await.unwrap().unwrap().id, id);
    }

    #[tokio::test]
    async fn test_patch_missing_is_not_found() {
        let store: MemoryRecordStore<Teacher> = MemoryRecordStore::new();
        let err = store.patch(RecordId::generate(), Map::new()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let store = MemoryRecordStore::new();
        let id = store.insert(teacher("Luis Pérez"), None).await.unwrap();

        store.delete(id).await.unwrap();
        assert!(store.get(id).await.unwrap().is_none());
        assert!(store.delete(id).await.unwrap_err().is_not_found());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_business_keys_allowed() {
        let store = MemoryRecordStore::new();
        store.insert(teacher("Ana"), None).await.unwrap();
        store.insert(teacher("Beto"), None).await.unwrap();
        assert_eq!(store.len(), 2);
    }
}
