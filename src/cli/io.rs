//! JSON I/O handling for CLI
//!
//! - Input: one JSON object on stdin (create/edit)
//! - Output: exactly one JSON response object on stdout
//! - UTF-8 only

use std::io::{self, Read, Write};

use serde_json::{json, Map, Value};

use super::errors::{CliError, CliResult};
use crate::schema::FieldErrors;

/// Read one JSON object from stdin
pub fn read_request() -> CliResult<Map<String, Value>> {
    let mut input = String::new();
    io::stdin().lock().read_to_string(&mut input)?;
    parse_request(&input)
}

fn parse_request(input: &str) -> CliResult<Map<String, Value>> {
    if input.trim().is_empty() {
        return Err(CliError::invalid_input("Empty input"));
    }

    match serde_json::from_str(input)? {
        Value::Object(map) => Ok(map),
        other => Err(CliError::invalid_input(format!(
            "Expected a JSON object, got {}",
            kind_of(&other)
        ))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Success response carrying `data`
pub fn ok_response(data: Value) -> Value {
    json!({
        "status": "ok",
        "data": data
    })
}

/// Error response with a stable code
pub fn error_response(code: &str, message: &str) -> Value {
    json!({
        "status": "error",
        "code": code,
        "message": message
    })
}

/// Validation failure with one message per field
pub fn validation_response(errors: &FieldErrors) -> Value {
    let fields: Map<String, Value> = errors
        .iter()
        .map(|e| (e.field.clone(), Value::String(e.message.clone())))
        .collect();

    json!({
        "status": "error",
        "code": errors.code(),
        "message": errors.to_string(),
        "fields": fields
    })
}

/// Write one response line to stdout
pub fn write_response(response: &Value) -> CliResult<()> {
    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, response)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}
