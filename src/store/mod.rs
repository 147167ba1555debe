//! # Record Store
//!
//! One document collection per entity kind, keyed by [`RecordId`].
//!
//! Each operation is atomic for its single target record; nothing spans
//! records. `get` on a missing id is `Ok(None)`, while `patch` and `delete`
//! on a missing id fail with [`StoreError::NotFound`]. Concurrent patches of
//! the same record resolve last-write-wins.

mod errors;
mod file;
mod memory;

pub use errors::{StoreError, StoreResult};
pub use file::FileRecordStore;
pub use memory::MemoryRecordStore;

use std::future::Future;

use serde_json::{Map, Value};

use crate::entity::{Entity, Record, RecordId};

/// Persistence collaborator for entity `E`
pub trait RecordStore<E: Entity>: Send + Sync {
    /// Stores a new row and returns its fresh identifier.
    fn insert(
        &self,
        fields: E,
        owner_id: Option<String>,
    ) -> impl Future<Output = StoreResult<RecordId>> + Send;

    /// Looks up a row; absence is not an error.
    fn get(&self, id: RecordId) -> impl Future<Output = StoreResult<Option<Record<E>>>> + Send;

    /// All rows. Callers must not rely on the order.
    fn list(&self) -> impl Future<Output = StoreResult<Vec<Record<E>>>> + Send;

    /// Overlays `partial` onto the row's fields and returns the updated row.
    fn patch(
        &self,
        id: RecordId,
        partial: Map<String, Value>,
    ) -> impl Future<Output = StoreResult<Record<E>>> + Send;

    /// Removes a row.
    fn delete(&self, id: RecordId) -> impl Future<Output = StoreResult<()>> + Send;
}

/// Applies a partial field map to a row, keeping identifier and metadata.
pub(crate) fn apply_patch<E: Entity>(
    record: &Record<E>,
    partial: Map<String, Value>,
) -> StoreResult<Record<E>> {
    let mut fields = record.fields.to_fields();
    for (key, value) in partial {
        if !fields.contains_key(&key) {
            return Err(StoreError::MalformedDocument(format!(
                "unknown field '{}' for {}",
                key,
                E::COLLECTION
            )));
        }
        fields.insert(key, value);
    }

    let fields = E::from_fields(fields).map_err(|e| StoreError::MalformedDocument(e.to_string()))?;

    Ok(Record {
        id: record.id,
        created_at: record.created_at,
        owner_id: record.owner_id.clone(),
        fields,
    })
}
