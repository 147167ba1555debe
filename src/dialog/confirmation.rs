//! Two-step delete confirmation
//!
//! ```text
//! Closed ──open──▶ Open ──confirm──▶ Confirming ──ok──▶ Closed (callback)
//!                   ▲  │                  │
//!                   │  └──cancel──▶ Closed └──err──▶ Open { error }
//! ```
//!
//! Nothing reaches the service unless the dialog is `Open` when `confirm` is
//! called.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use super::errors::DialogError;
use crate::entity::{Entity, RecordId};
use crate::observability::{log_event_with_fields, Event};
use crate::service::ValidatedEntity;

/// Dialog state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogState {
    Closed,
    /// Awaiting confirm or cancel; `error` holds the last failed attempt.
    Open { error: Option<String> },
    /// Delete in flight
    Confirming,
}

impl fmt::Display for DialogState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DialogState::Closed => write!(f, "CLOSED"),
            DialogState::Open { error: None } => write!(f, "OPEN"),
            DialogState::Open { error: Some(_) } => write!(f, "OPEN_WITH_ERROR"),
            DialogState::Confirming => write!(f, "CONFIRMING"),
        }
    }
}

/// Delete callback, receives the removed row's identifier
pub type OnDeleted = Box<dyn FnMut(RecordId) + Send>;

/// Guarded delete of one row
pub struct DeleteConfirmation<E, V> {
    service: Arc<V>,
    target: RecordId,
    state: DialogState,
    on_deleted: Option<OnDeleted>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity, V: ValidatedEntity<E>> DeleteConfirmation<E, V> {
    /// Closed dialog targeting row `target`
    pub fn new(service: Arc<V>, target: RecordId) -> Self {
        Self {
            service,
            target,
            state: DialogState::Closed,
            on_deleted: None,
            _entity: PhantomData,
        }
    }

    /// Registers the callback run after a successful delete.
    pub fn on_deleted(mut self, callback: impl FnMut(RecordId) + Send + 'static) -> Self {
        self.on_deleted = Some(Box::new(callback));
        self
    }

    pub fn target(&self) -> RecordId {
        self.target
    }

    pub fn state(&self) -> &DialogState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, DialogState::Open { .. })
    }

    /// Inline error of the last failed confirm
    pub fn error(&self) -> Option<&str> {
        match &self.state {
            DialogState::Open { error } => error.as_deref(),
            _ => None,
        }
    }

    /// Opens the dialog. No effect unless closed.
    pub fn open(&mut self) {
        if self.state == DialogState::Closed {
            self.state = DialogState::Open { error: None };
        }
    }

    /// Closes an open dialog without touching the row.
    pub fn cancel(&mut self) -> Result<(), DialogError> {
        if !self.is_open() {
            return Err(DialogError::NotOpen(self.state.to_string()));
        }
        self.state = DialogState::Closed;
        Ok(())
    }

    /// Deletes the target row.
    ///
    /// On success the dialog closes and the callback runs. On failure it
    /// stays open with an inline error, ready for retry or cancel.
    pub async fn confirm(&mut self) -> Result<(), DialogError> {
        if !self.is_open() {
            return Err(DialogError::NotOpen(self.state.to_string()));
        }
        let service = Arc::clone(&self.service);
        let target = self.target;
        let result = {
            let guard = ConfirmingGuard::enter(&mut self.state);
            let result = service.remove(target).await.map_err(|err| {
                let error = err.to_string();
                let record_id = target.to_string();
                log_event_with_fields(
                    Event::DeleteFailed,
                    &[
                        ("collection", E::COLLECTION),
                        ("record_id", record_id.as_str()),
                        ("code", err.code()),
                        ("error", error.as_str()),
                    ],
                );
                format!("No se pudo eliminar el {}: {}", E::NOUN, error)
            });
            guard.finish(match &result {
                Ok(()) => DialogState::Closed,
                Err(message) => DialogState::Open {
                    error: Some(message.clone()),
                },
            });
            result
        };

        match result {
            Ok(()) => {
                if let Some(callback) = self.on_deleted.as_mut() {
                    callback(target);
                }
                Ok(())
            }
            Err(message) => Err(DialogError::DeleteFailed(message)),
        }
    }
}

/// Holds `Confirming`; an abandoned confirm falls back to `Open`.
struct ConfirmingGuard<'a> {
    state: &'a mut DialogState,
}

impl<'a> ConfirmingGuard<'a> {
    fn enter(state: &'a mut DialogState) -> Self {
        *state = DialogState::Confirming;
        Self { state }
    }

    fn finish(self, outcome: DialogState) {
        *self.state = outcome;
    }
}

impl Drop for ConfirmingGuard<'_> {
    fn drop(&mut self) {
        if *self.state == DialogState::Confirming {
            *self.state = DialogState::Open { error: None };
        }
    }
}
