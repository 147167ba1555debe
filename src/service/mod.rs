//! # CRUD Service
//!
//! Per-entity orchestration over a [`RecordStore`]. The service assumes its
//! input was validated upstream and never re-validates; it persists, publishes
//! one [`ChangeEvent`] per committed mutation, and returns.
//!
//! A failed change publication never undoes a committed mutation; it is logged
//! and the operation still succeeds.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::entity::{Entity, Record, RecordId, Student, Teacher};
use crate::observability::{log_event_with_fields, Event, Logger};
use crate::realtime::{ChangeEvent, ChangeFeed};
use crate::schema::FieldErrors;
use crate::store::{FileRecordStore, RecordStore, StoreResult};

/// The capability set every administered entity kind exposes
pub trait ValidatedEntity<E: Entity>: Send + Sync {
    /// Checks raw field input against the entity schema.
    fn validate(&self, input: &Map<String, Value>) -> Result<E, FieldErrors>;

    /// Persists a new row and returns its identifier.
    fn create(&self, fields: E) -> impl Future<Output = StoreResult<RecordId>> + Send;

    /// Replaces every field of an existing row, keeping its identifier.
    fn update(&self, id: RecordId, fields: E) -> impl Future<Output = StoreResult<Record<E>>> + Send;

    fn remove(&self, id: RecordId) -> impl Future<Output = StoreResult<()>> + Send;

    fn list(&self) -> impl Future<Output = StoreResult<Vec<Record<E>>>> + Send;

    /// Absence is `Ok(None)`.
    fn get_by_id(&self, id: RecordId) -> impl Future<Output = StoreResult<Option<Record<E>>>> + Send;
}

/// Store-backed [`ValidatedEntity`] implementation
pub struct CrudService<E, S> {
    store: Arc<S>,
    feed: Arc<ChangeFeed>,
    owner_id: Option<String>,
    _entity: PhantomData<fn() -> E>,
}

/// Student service over the file store
pub type StudentService = CrudService<Student, FileRecordStore<Student>>;

/// Teacher service over the file store
pub type TeacherService = CrudService<Teacher, FileRecordStore<Teacher>>;

impl<E: Entity, S: RecordStore<E>> CrudService<E, S> {
    pub fn new(store: Arc<S>, feed: Arc<ChangeFeed>) -> Self {
        Self {
            store,
            feed,
            owner_id: None,
            _entity: PhantomData,
        }
    }

    /// Tags rows created through this service with `owner_id`.
    pub fn with_owner(mut self, owner_id: Option<String>) -> Self {
        self.owner_id = owner_id;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn feed(&self) -> &Arc<ChangeFeed> {
        &self.feed
    }

    pub fn owner_id(&self) -> Option<&str> {
        self.owner_id.as_deref()
    }

    fn announce(&self, event: ChangeEvent, log: Event) {
        let record_id = event.record_id.to_string();
        match self.feed.publish(event) {
            Ok(event) => {
                let sequence = event.sequence.to_string();
                log_event_with_fields(
                    log,
                    &[
                        ("collection", E::COLLECTION),
                        ("record_id", record_id.as_str()),
                        ("sequence", sequence.as_str()),
                    ],
                );
            }
            Err(err) => {
                let error = err.to_string();
                Logger::warn(
                    log.as_str(),
                    &[
                        ("collection", E::COLLECTION),
                        ("record_id", record_id.as_str()),
                        ("publish_error", error.as_str()),
                    ],
                );
            }
        }
    }

    /// Row as it was before a mutation; a failed lookup only costs `old_data`.
    async fn previous(&self, id: RecordId, log: Event) -> Option<Record<E>> {
        match self.store.get(id).await {
            Ok(row) => row,
            Err(err) => {
                let record_id = id.to_string();
                let error = err.to_string();
                Logger::warn(
                    log.as_str(),
                    &[
                        ("collection", E::COLLECTION),
                        ("record_id", record_id.as_str()),
                        ("lookup_error", error.as_str()),
                    ],
                );
                None
            }
        }
    }
}

fn as_value<E: Entity>(fields: &E) -> Value {
    Value::Object(fields.to_fields())
}

impl<E: Entity, S: RecordStore<E>> ValidatedEntity<E> for CrudService<E, S> {
    fn validate(&self, input: &Map<String, Value>) -> Result<E, FieldErrors> {
        E::validate(input)
    }

    async fn create(&self, fields: E) -> StoreResult<RecordId> {
        let data = as_value(&fields);
        let id = self.store.insert(fields, self.owner_id.clone()).await?;

        self.announce(
            ChangeEvent::insert(E::COLLECTION, id, data, self.owner_id.clone()),
            Event::RecordCreated,
        );
        Ok(id)
    }

    async fn update(&self, id: RecordId, fields: E) -> StoreResult<Record<E>> {
        let previous = self.previous(id, Event::RecordUpdated).await;
        let updated = self.store.patch(id, fields.to_fields()).await?;

        self.announce(
            ChangeEvent::update(
                E::COLLECTION,
                id,
                previous.map(|r| as_value(&r.fields)),
                as_value(&updated.fields),
                updated.owner_id.clone(),
            ),
            Event::RecordUpdated,
        );
        Ok(updated)
    }

    async fn remove(&self, id: RecordId) -> StoreResult<()> {
        let previous = self.previous(id, Event::RecordDeleted).await;
        self.store.delete(id).await?;

        self.announce(
            ChangeEvent::delete(E::COLLECTION, id, previous.map(|r| as_value(&r.fields))),
            Event::RecordDeleted,
        );
        Ok(())
    }

    async fn list(&self) -> StoreResult<Vec<Record<E>>> {
        self.store.list().await
    }

    async fn get_by_id(&self, id: RecordId) -> StoreResult<Option<Record<E>>> {
        self.store.get(id).await
    }
}
