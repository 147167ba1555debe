//! Observable lifecycle events
//!
//! Events are explicit and typed; the string form is what lands in the log line.

use std::fmt;

/// Observable events in the record console
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Console command starting
    ConsoleStart,
    /// Configuration loaded
    ConfigLoaded,
    /// Data directory initialized
    DataDirInitialized,

    // Writes
    /// Row inserted
    RecordCreated,
    /// Row replaced
    RecordUpdated,
    /// Row removed
    RecordDeleted,

    // Forms and dialogs
    /// Submission blocked by field validation
    FormValidationFailed,
    /// Submission reached the store and failed
    FormSubmitFailed,
    /// Delete confirmed and failed
    DeleteFailed,

    // Live queries
    /// New subscriber attached to a live query
    QuerySubscribed,
    /// Live query re-evaluation failed
    QueryRefreshFailed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConsoleStart => "CONSOLE_START",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::DataDirInitialized => "DATA_DIR_INITIALIZED",

            Event::RecordCreated => "RECORD_CREATED",
            Event::RecordUpdated => "RECORD_UPDATED",
            Event::RecordDeleted => "RECORD_DELETED",

            Event::FormValidationFailed => "FORM_VALIDATION_FAILED",
            Event::FormSubmitFailed => "FORM_SUBMIT_FAILED",
            Event::DeleteFailed => "DELETE_FAILED",

            Event::QuerySubscribed => "QUERY_SUBSCRIBED",
            Event::QueryRefreshFailed => "QUERY_REFRESH_FAILED",
        }
    }

    /// Returns true if this event reports a failed operation
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Event::FormSubmitFailed | Event::DeleteFailed | Event::QueryRefreshFailed
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_are_screaming_snake_case() {
        let events = [
            Event::ConsoleStart,
            Event::ConfigLoaded,
            Event::DataDirInitialized,
            Event::RecordCreated,
            Event::RecordUpdated,
            Event::RecordDeleted,
            Event::FormValidationFailed,
            Event::FormSubmitFailed,
            Event::DeleteFailed,
            Event::QuerySubscribed,
            Event::QueryRefreshFailed,
        ];

        for event in events {
            let s = event.as_str();
            assert!(!s.is_empty());
            assert!(s.chars().all(|c| c.is_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_failure_events() {
        assert!(Event::DeleteFailed.is_failure());
        assert!(!Event::RecordDeleted.is_failure());
        // Validation failures are expected user input, not operation failures
        assert!(!Event::FormValidationFailed.is_failure());
    }
}
