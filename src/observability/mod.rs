//! Observability for the record console
//!
//! - Structured logging (JSON lines)
//! - Typed lifecycle events
//!
//! Observability is read-only: it never changes the outcome of an operation.
//!
//! ```ignore
//! use registrar::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::RecordCreated, &[("collection", "students")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{LogTarget, Logger, Severity};

/// Log a lifecycle event
pub fn log_event(event: Event) {
    log_event_with_fields(event, &[]);
}

/// Log a lifecycle event with fields
///
/// Failure events are logged at ERROR, everything else at INFO.
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    if event.is_failure() {
        Logger::error(event.as_str(), fields);
    } else {
        Logger::info(event.as_str(), fields);
    }
}
