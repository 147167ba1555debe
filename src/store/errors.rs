//! # Store Errors
//!
//! Error types for record persistence.

use thiserror::Error;

use crate::entity::RecordId;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Store errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Target record missing for patch/delete
    #[error("Record not found: {collection}/{id}")]
    NotFound {
        collection: &'static str,
        id: RecordId,
    },

    /// Backend could not complete the operation (I/O, lock poisoning, serialization)
    #[error("Persistence failure: {0}")]
    Persistence(String),

    /// Stored or patched document does not fit the entity shape
    #[error("Malformed document: {0}")]
    MalformedDocument(String),
}

impl StoreError {
    pub fn not_found(collection: &'static str, id: RecordId) -> Self {
        StoreError::NotFound { collection, id }
    }

    pub fn lock_poisoned() -> Self {
        StoreError::Persistence("Lock poisoned".into())
    }

    /// Stable code for wire responses
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::NotFound { .. } => "REG_NOT_FOUND",
            StoreError::Persistence(_) => "REG_PERSISTENCE_FAILURE",
            StoreError::MalformedDocument(_) => "REG_MALFORMED_DOCUMENT",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}
