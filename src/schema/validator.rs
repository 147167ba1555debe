//! Record validation against a declarative schema
//!
//! Semantics:
//! - Every declared field is checked; all violations are reported, one per field
//! - A missing or null field is checked as its blank default ("" or 0)
//! - Undeclared input fields are violations
//! - Integer fields accept text: "" becomes 0, otherwise the trimmed text must parse
//! - Output is a normalized map holding exactly the declared fields
//!
//! Validation never partially applies: the caller gets either the full
//! normalized map or the errors.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

use super::errors::{FieldError, FieldErrors};
use super::types::{FieldDef, FieldRule, Schema};

const EXPECTED_TEXT: &str = "se esperaba texto";

/// Validated field map, ready to persist
pub type NormalizedFields = Map<String, Value>;

/// Stateless validator over one schema
pub struct SchemaValidator<'a> {
    schema: &'a Schema,
}

impl<'a> SchemaValidator<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    /// Validates a raw JSON value; anything but an object fails at `$root`.
    pub fn validate_value(&self, input: &Value) -> Result<NormalizedFields, FieldErrors> {
        match input.as_object() {
            Some(obj) => self.validate(obj),
            None => Err(FieldError::new("$root", "se esperaba un objeto").into()),
        }
    }

    /// Validates a candidate record.
    pub fn validate(&self, input: &Map<String, Value>) -> Result<NormalizedFields, FieldErrors> {
        let mut errors = FieldErrors::new();
        let mut normalized = Map::new();

        for field in &self.schema.fields {
            let raw = match input.get(&field.name) {
                None | Some(Value::Null) => field.rule.default_value(),
                Some(value) => value.clone(),
            };

            match check_field(field, raw) {
                Ok(value) => {
                    normalized.insert(field.name.clone(), value);
                }
                Err(message) => errors.push(FieldError::new(&field.name, message)),
            }
        }

        for key in input.keys() {
            if self.schema.field(key).is_none() {
                errors.push(FieldError::undeclared(key));
            }
        }

        if errors.is_empty() {
            Ok(normalized)
        } else {
            Err(errors)
        }
    }
}

/// Checks one value against its rule, returning the normalized value or the message.
fn check_field(field: &FieldDef, value: Value) -> Result<Value, String> {
    match &field.rule {
        FieldRule::Text {
            min,
            max,
            min_message,
            max_message,
        } => {
            let text = value.as_str().ok_or_else(|| EXPECTED_TEXT.to_string())?;
            let len = text.chars().count();
            if len < *min {
                return Err(min_message.clone());
            }
            if len > *max {
                return Err(max_message.clone());
            }
            Ok(value)
        }
        FieldRule::Email {
            min,
            format_message,
            min_message,
        } => {
            let text = value.as_str().ok_or_else(|| EXPECTED_TEXT.to_string())?;
            if !is_valid_email(text) {
                return Err(format_message.clone());
            }
            if text.chars().count() < *min {
                return Err(min_message.clone());
            }
            Ok(value)
        }
        FieldRule::OneOf { options, message } => {
            let text = value.as_str().ok_or_else(|| message.clone())?;
            if options.iter().any(|o| o == text) {
                Ok(value)
            } else {
                Err(message.clone())
            }
        }
        FieldRule::Integer {
            min,
            max,
            type_message,
            min_message,
            max_message,
        } => {
            let n = coerce_integer(&value).ok_or_else(|| type_message.clone())?;
            if n < *min {
                return Err(min_message.clone());
            }
            if n > *max {
                return Err(max_message.clone());
            }
            Ok(Value::from(n))
        }
    }
}

/// Numeric input coercion: `""` is 0, other text must parse as a whole number.
///
/// JSON numbers are accepted when they carry no fractional part.
pub fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i)
            } else {
                let f = n.as_f64()?;
                if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
                    Some(f as i64)
                } else {
                    None
                }
            }
        }
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                Some(0)
            } else {
                s.parse::<i64>().ok()
            }
        }
        _ => None,
    }
}

/// Email format check: local part of letters, digits and `_'+-.`, not starting
/// with a dot, no consecutive dots, and a dotted domain ending in a 2+ letter TLD.
pub fn is_valid_email(text: &str) -> bool {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    let pattern = EMAIL.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_'+\-.]*[A-Za-z0-9_+\-]@([A-Za-z0-9][A-Za-z0-9\-]*\.)+[A-Za-z]{2,}$")
            .ok()
    });

    match pattern {
        Some(re) => !text.starts_with('.') && !text.contains("..") && re.is_match(text),
        None => false,
    }
}
