//! # Forms
//!
//! Create and edit forms over a [`ValidatedEntity`](crate::service::ValidatedEntity):
//! raw field values in, validated save out, with pending and error state kept
//! explicit.

mod controller;
mod errors;

pub use controller::{
    FormController, FormMode, FormState, OnSuccess, SubmitOutcome, SUBMIT_FAILED_MESSAGE,
};
pub use errors::FormError;
