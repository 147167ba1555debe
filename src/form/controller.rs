//! Create/edit form state machine
//!
//! ```text
//! Idle ──submit──▶ Validating ──invalid──▶ Idle (field errors shown)
//!                      │
//!                      └──valid──▶ Submitting ──▶ Success
//!                                       └──────▶ Failed ──submit/reset──▶ Idle
//! ```
//!
//! `Submitting` is held by a guard, so every exit path out of a submission
//! leaves that state.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::errors::FormError;
use crate::entity::{Entity, Record, RecordId};
use crate::observability::{log_event_with_fields, Event, Logger};
use crate::schema::FieldErrors;
use crate::service::ValidatedEntity;

/// User-facing prefix for any failed submission
pub const SUBMIT_FAILED_MESSAGE: &str =
    "Ocurrió un error al procesar la solicitud. Por favor intenta de nuevo.";

/// Form lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    Idle,
    Validating,
    Submitting,
    Success,
    Failed,
}

impl fmt::Display for FormState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormState::Idle => write!(f, "IDLE"),
            FormState::Validating => write!(f, "VALIDATING"),
            FormState::Submitting => write!(f, "SUBMITTING"),
            FormState::Success => write!(f, "SUCCESS"),
            FormState::Failed => write!(f, "FAILED"),
        }
    }
}

/// Whether the form creates a row or replaces an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(RecordId),
}

/// Result of one submit attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blocked by field validation; the service was not called.
    Invalid(FieldErrors),
    /// Persisted; the success callback has run.
    Saved(RecordId),
    /// The service call failed; carries the general error message.
    Failed(String),
}

/// Success callback, receives the saved row's identifier
pub type OnSuccess = Box<dyn FnMut(RecordId) + Send>;

struct SubmitGuard<'a> {
    state: &'a mut FormState,
}

impl<'a> SubmitGuard<'a> {
    fn enter(state: &'a mut FormState) -> Self {
        *state = FormState::Submitting;
        Self { state }
    }

    fn finish(self, outcome: FormState) {
        *self.state = outcome;
    }
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        if *self.state == FormState::Submitting {
            *self.state = FormState::Idle;
        }
    }
}

/// Form bound to one entity's service
pub struct FormController<E, V> {
    service: Arc<V>,
    mode: FormMode,
    values: Map<String, Value>,
    state: FormState,
    field_errors: FieldErrors,
    general_error: Option<String>,
    error_in_view: bool,
    on_success: Option<OnSuccess>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity, V: ValidatedEntity<E>> FormController<E, V> {
    fn with_values(service: Arc<V>, mode: FormMode, values: Map<String, Value>) -> Self {
        Self {
            service,
            mode,
            values,
            state: FormState::Idle,
            field_errors: FieldErrors::new(),
            general_error: None,
            error_in_view: false,
            on_success: None,
            _entity: PhantomData,
        }
    }

    /// Blank create form; every field starts at its schema default.
    pub fn create(service: Arc<V>) -> Self {
        Self::with_values(service, FormMode::Create, E::schema().defaults())
    }

    /// Edit form pre-populated from `record`.
    pub fn edit(service: Arc<V>, record: &Record<E>) -> Self {
        Self::with_values(service, FormMode::Edit(record.id), record.fields.to_fields())
    }

    /// Loads row `id` and opens an edit form for it.
    pub async fn open_edit(service: Arc<V>, id: RecordId) -> Result<Self, FormError> {
        match service.get_by_id(id).await {
            Ok(Some(record)) => Ok(Self::edit(service, &record)),
            Ok(None) => Err(FormError::RecordMissing(id.to_string())),
            Err(err) => Err(FormError::LoadFailed(err.to_string())),
        }
    }

    /// Registers the callback run after a successful save.
    pub fn on_success(mut self, callback: impl FnMut(RecordId) + Send + 'static) -> Self {
        self.on_success = Some(Box::new(callback));
        self
    }

    /// Sets one field's raw value.
    pub fn set_field(&mut self, name: &str, value: Value) -> Result<(), FormError> {
        if E::schema().field(name).is_none() {
            return Err(FormError::UnknownField {
                collection: E::COLLECTION,
                field: name.to_string(),
            });
        }
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    /// Overlays several raw values; stops at the first undeclared field.
    pub fn set_fields(&mut self, values: Map<String, Value>) -> Result<(), FormError> {
        for (name, value) in values {
            self.set_field(&name, value)?;
        }
        Ok(())
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn is_submitting(&self) -> bool {
        self.state == FormState::Submitting
    }

    pub fn field_errors(&self) -> &FieldErrors {
        &self.field_errors
    }

    pub fn general_error(&self) -> Option<&str> {
        self.general_error.as_deref()
    }

    /// Set when a general error appeared that the view should bring into sight.
    pub fn error_in_view(&self) -> bool {
        self.error_in_view
    }

    pub fn acknowledge_error_in_view(&mut self) {
        self.error_in_view = false;
    }

    /// Back to `Idle` with errors cleared; values are kept.
    pub fn reset(&mut self) {
        self.state = FormState::Idle;
        self.field_errors.clear();
        self.general_error = None;
        self.error_in_view = false;
    }

    /// Validates the current values and, if they pass, saves them.
    pub async fn submit(&mut self) -> SubmitOutcome {
        if self.state == FormState::Failed {
            self.state = FormState::Idle;
        }

        self.state = FormState::Validating;
        self.general_error = None;
        self.error_in_view = false;

        let fields = match self.service.validate(&self.values) {
            Ok(fields) => fields,
            Err(errors) => {
                let count = errors.len().to_string();
                Logger::trace(
                    Event::FormValidationFailed.as_str(),
                    &[("collection", E::COLLECTION), ("fields", count.as_str())],
                );
                self.field_errors = errors.clone();
                self.state = FormState::Idle;
                return SubmitOutcome::Invalid(errors);
            }
        };
        self.field_errors.clear();

        let service = Arc::clone(&self.service);
        let mode = self.mode;
        let result = {
            let guard = SubmitGuard::enter(&mut self.state);
            let result = match mode {
                FormMode::Create => service.create(fields).await,
                FormMode::Edit(id) => service.update(id, fields).await.map(|r| r.id),
            };
            guard.finish(if result.is_ok() {
                FormState::Success
            } else {
                FormState::Failed
            });
            result
        };

        match result {
            Ok(id) => {
                if let Some(callback) = self.on_success.as_mut() {
                    callback(id);
                }
                SubmitOutcome::Saved(id)
            }
            Err(err) => {
                let error = err.to_string();
                let message = format!("{} ({})", SUBMIT_FAILED_MESSAGE, error);
                log_event_with_fields(
                    Event::FormSubmitFailed,
                    &[
                        ("collection", E::COLLECTION),
                        ("code", err.code()),
                        ("error", error.as_str()),
                    ],
                );
                self.general_error = Some(message.clone());
                self.error_in_view = true;
                SubmitOutcome::Failed(message)
            }
        }
    }
}
