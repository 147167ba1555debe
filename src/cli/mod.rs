//! CLI module for registrar
//!
//! Provides command-line interface for:
//! - init: Create the data directory and empty collections
//! - students/teachers: list, get, create, edit, delete

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, EntityAction};
pub use commands::{execute, init, run, run_command, run_entity, SUBMIT_FAILED_CODE};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{error_response, ok_response, read_request, validation_response, write_response};
