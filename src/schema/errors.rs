//! Field-level validation errors
//!
//! A failed validation yields every violated field with one message each.
//! These errors block submission and never reach the store.

use std::fmt;

/// Error code carried by every validation failure
pub const VALIDATION_FAILED_CODE: &str = "REG_VALIDATION_FAILED";

/// One violated field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Field name (`$root` when the input is not an object)
    pub field: String,
    /// User-facing message
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn undeclared(field: impl Into<String>) -> Self {
        Self::new(field, "campo no declarado")
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// All field errors of one validation pass, in schema order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    errors: Vec<FieldError>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: FieldError) {
        self.errors.push(error);
    }

    /// Message for a field, if it failed
    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn clear(&mut self) {
        self.errors.clear();
    }

    /// Error code for wire responses
    pub fn code(&self) -> &'static str {
        VALIDATION_FAILED_CODE
    }
}

impl From<FieldError> for FieldErrors {
    fn from(error: FieldError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", VALIDATION_FAILED_CODE)?;
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_field() {
        let mut errors = FieldErrors::new();
        errors.push(FieldError::new("nombre", "muy corto"));
        errors.push(FieldError::undeclared("apodo"));

        assert_eq!(errors.get("nombre"), Some("muy corto"));
        assert_eq!(errors.get("apodo"), Some("campo no declarado"));
        assert!(!errors.contains("correo"));
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_display_includes_code_and_fields() {
        let mut errors = FieldErrors::new();
        errors.push(FieldError::new("edad", "La edad mínima es 5 años"));
        errors.push(FieldError::new("nombre", "muy corto"));

        let display = errors.to_string();
        assert!(display.starts_with("REG_VALIDATION_FAILED"));
        assert!(display.contains("edad: La edad mínima es 5 años; nombre"));
    }
}
