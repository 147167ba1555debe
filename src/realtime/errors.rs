//! # Real-Time Errors
//!
//! Error types for the change feed and live queries.

use thiserror::Error;

/// Result type for real-time operations
pub type RealtimeResult<T> = Result<T, RealtimeError>;

/// Real-time errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RealtimeError {
    /// Query evaluation against the store failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Internal error (lock poisoning)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RealtimeError {
    pub fn lock_poisoned() -> Self {
        RealtimeError::Internal("Lock poisoned".into())
    }

    /// Stable code for wire responses
    pub fn code(&self) -> &'static str {
        match self {
            RealtimeError::QueryFailed(_) => "REG_QUERY_FAILED",
            RealtimeError::Internal(_) => "REG_REALTIME_INTERNAL",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(RealtimeError::lock_poisoned().code(), "REG_REALTIME_INTERNAL");
        assert_eq!(
            RealtimeError::QueryFailed("x".into()).code(),
            "REG_QUERY_FAILED"
        );
    }
}
