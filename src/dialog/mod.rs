//! # Dialogs
//!
//! Guarded destructive actions. A delete needs an explicit open, then an
//! explicit confirm; cancel in between leaves the row untouched.

mod confirmation;
mod errors;

pub use confirmation::{DeleteConfirmation, DialogState, OnDeleted};
pub use errors::DialogError;
