//! # Form Errors
//!
//! Errors raised while editing form values. Submission outcomes are not
//! errors; see [`SubmitOutcome`](super::SubmitOutcome).

use thiserror::Error;

/// Form errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    /// Field is not part of the entity schema
    #[error("Unknown field '{field}' for {collection}")]
    UnknownField {
        collection: &'static str,
        field: String,
    },

    /// Edit form opened for a row that does not exist
    #[error("Record not found: {0}")]
    RecordMissing(String),

    /// Edit form could not load the existing row
    #[error("Failed to load record: {0}")]
    LoadFailed(String),
}

impl FormError {
    /// Stable code for wire responses
    pub fn code(&self) -> &'static str {
        match self {
            FormError::UnknownField { .. } => "REG_UNKNOWN_FIELD",
            FormError::RecordMissing(_) => "REG_NOT_FOUND",
            FormError::LoadFailed(_) => "REG_PERSISTENCE_FAILURE",
        }
    }
}
