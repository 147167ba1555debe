//! # Entities
//!
//! The record kinds the console administers. Each kind is a typed struct whose
//! serde form is the wire/storage form, plus one declarative [`Schema`].
//! Validation produces the typed struct or field errors, never a half-built value.

mod record;
mod student;
mod teacher;

pub use record::{Record, RecordId};
pub use student::{Program, Student, Term};
pub use teacher::{Department, Specialty, Teacher};

use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::schema::{FieldError, FieldErrors, Schema, SchemaValidator};

/// A record kind with a collection and a validation schema.
pub trait Entity:
    Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Collection name in the store
    const COLLECTION: &'static str;

    /// Singular noun used in user-facing messages
    const NOUN: &'static str;

    /// Field rules for this kind
    fn schema() -> &'static Schema;

    /// Validates raw input into a typed value.
    fn validate(input: &Map<String, Value>) -> Result<Self, FieldErrors> {
        let normalized = SchemaValidator::new(Self::schema()).validate(input)?;
        Self::from_fields(normalized)
            .map_err(|e| FieldErrors::from(FieldError::new("$root", e.to_string())))
    }

    /// Builds the typed value from a field map without validating it.
    fn from_fields(fields: Map<String, Value>) -> serde_json::Result<Self> {
        serde_json::from_value(Value::Object(fields))
    }

    /// Field map of this value (everything but the identifier)
    fn to_fields(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

/// Enumerated select values; `ALL` holds every option in display order.
pub trait Choice: Sized + Copy + 'static {
    const ALL: &'static [Self];

    fn label(&self) -> &'static str;

    fn labels() -> Vec<&'static str> {
        Self::ALL.iter().map(|c| c.label()).collect()
    }
}
