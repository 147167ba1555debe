//! # Change Events
//!
//! One event per committed mutation of a record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::RecordId;

/// Kind of committed mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventType {
    /// New record inserted
    Insert,
    /// Existing record patched
    Update,
    /// Record deleted
    Delete,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventType::Insert => write!(f, "INSERT"),
            EventType::Update => write!(f, "UPDATE"),
            EventType::Delete => write!(f, "DELETE"),
        }
    }
}

/// A committed mutation
///
/// `sequence` is 0 until [`ChangeFeed::publish`](super::ChangeFeed::publish)
/// assigns it; published sequences start at 1 and strictly increase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub sequence: u64,

    pub event_type: EventType,

    /// Collection name
    pub collection: String,

    pub record_id: RecordId,

    /// Fields after the mutation (INSERT/UPDATE)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_data: Option<Value>,

    /// Fields before the mutation (UPDATE/DELETE), when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_data: Option<Value>,

    /// Commit time
    pub timestamp: DateTime<Utc>,

    /// Owner tag of the mutated row
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
}

impl ChangeEvent {
    fn new(event_type: EventType, collection: &str, record_id: RecordId) -> Self {
        Self {
            sequence: 0,
            event_type,
            collection: collection.to_string(),
            record_id,
            new_data: None,
            old_data: None,
            timestamp: Utc::now(),
            owner_id: None,
        }
    }

    /// Create an INSERT event
    pub fn insert(collection: &str, record_id: RecordId, data: Value, owner_id: Option<String>) -> Self {
        Self {
            new_data: Some(data),
            owner_id,
            ..Self::new(EventType::Insert, collection, record_id)
        }
    }

    /// Create an UPDATE event
    pub fn update(
        collection: &str,
        record_id: RecordId,
        old_data: Option<Value>,
        new_data: Value,
        owner_id: Option<String>,
    ) -> Self {
        Self {
            new_data: Some(new_data),
            old_data,
            owner_id,
            ..Self::new(EventType::Update, collection, record_id)
        }
    }

    /// Create a DELETE event
    pub fn delete(collection: &str, record_id: RecordId, old_data: Option<Value>) -> Self {
        Self {
            old_data,
            ..Self::new(EventType::Delete, collection, record_id)
        }
    }
}
