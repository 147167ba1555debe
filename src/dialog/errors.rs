//! # Dialog Errors

use thiserror::Error;

/// Delete confirmation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DialogError {
    /// Confirm or cancel outside the `Open` state
    #[error("Dialog is not open (state: {0})")]
    NotOpen(String),

    /// The confirmed delete failed; the dialog stays open with this message.
    #[error("{0}")]
    DeleteFailed(String),
}

impl DialogError {
    /// Stable code for wire responses
    pub fn code(&self) -> &'static str {
        match self {
            DialogError::NotOpen(_) => "REG_DIALOG_NOT_OPEN",
            DialogError::DeleteFailed(_) => "REG_DELETE_FAILED",
        }
    }
}
