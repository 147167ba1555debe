//! Schema validation for console records
//!
//! Every entity declares its field rules once; forms validate against them
//! before anything is sent to the store.
//!
//! # Design Principles
//!
//! - Declarative rules, one per field
//! - All violated fields reported, one message each
//! - Numeric text coerced before range checks
//! - Never partially applied
//! - Deterministic

mod errors;
mod types;
mod validator;

pub use errors::{FieldError, FieldErrors, VALIDATION_FAILED_CODE};
pub use types::{FieldDef, FieldRule, Schema};
pub use validator::{coerce_integer, is_valid_email, NormalizedFields, SchemaValidator};
