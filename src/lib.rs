//! registrar - validated CRUD and live queries for school records
//!
//! Student and teacher rows flow from raw form input through schema
//! validation into a record store; every committed change is published to
//! live queries watching the affected collection.

pub mod cli;
pub mod config;
pub mod dialog;
pub mod entity;
pub mod form;
pub mod observability;
pub mod realtime;
pub mod schema;
pub mod service;
pub mod store;
