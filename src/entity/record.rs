//! Stored row: system identifier plus the entity's fields

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// System-assigned record identifier.
///
/// Assigned exactly once, on insert; never part of an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

impl From<Uuid> for RecordId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

/// A persisted row of entity `E`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<E> {
    /// Identifier
    #[serde(rename = "_id")]
    pub id: RecordId,

    /// Insert time
    #[serde(rename = "_creationTime")]
    pub created_at: DateTime<Utc>,

    /// Signed-in user that created the row, when known. Informational only.
    #[serde(rename = "ownerId", default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,

    /// Entity fields
    #[serde(flatten)]
    pub fields: E,
}

impl<E> Record<E> {
    /// New row with a fresh identifier
    pub fn new(fields: E, owner_id: Option<String>) -> Self {
        Self {
            id: RecordId::generate(),
            created_at: Utc::now(),
            owner_id,
            fields,
        }
    }
}
