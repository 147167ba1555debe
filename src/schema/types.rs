//! Declarative field rules
//!
//! A schema is an ordered list of field definitions. Each field carries exactly
//! one rule plus the user-facing message for every way the rule can fail.
//!
//! Supported rules:
//! - text: length bounds in characters
//! - email: address format plus a minimum length
//! - one_of: membership in an enumerated option set (select inputs)
//! - integer: inclusive numeric range, text input coerced first

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single field constraint with its failure messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum FieldRule {
    /// Free text with inclusive length bounds
    Text {
        min: usize,
        max: usize,
        min_message: String,
        max_message: String,
    },
    /// Email address
    Email {
        min: usize,
        format_message: String,
        min_message: String,
    },
    /// Value must be one of `options`; anything else (including empty) fails with `message`
    OneOf {
        options: Vec<String>,
        message: String,
    },
    /// Whole number in `min..=max`
    Integer {
        min: i64,
        max: i64,
        type_message: String,
        min_message: String,
        max_message: String,
    },
}

impl FieldRule {
    /// Returns the rule name for diagnostics
    pub fn rule_name(&self) -> &'static str {
        match self {
            FieldRule::Text { .. } => "text",
            FieldRule::Email { .. } => "email",
            FieldRule::OneOf { .. } => "one_of",
            FieldRule::Integer { .. } => "integer",
        }
    }

    /// Value a blank form starts with for this rule
    pub fn default_value(&self) -> Value {
        match self {
            FieldRule::Integer { .. } => Value::from(0),
            _ => Value::String(String::new()),
        }
    }
}

/// Field definition: wire name plus rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field name as stored and submitted
    pub name: String,
    /// Constraint
    #[serde(flatten)]
    pub rule: FieldRule,
}

impl FieldDef {
    /// Text field with length bounds
    pub fn text(
        name: impl Into<String>,
        min: usize,
        max: usize,
        min_message: impl Into<String>,
        max_message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            rule: FieldRule::Text {
                min,
                max,
                min_message: min_message.into(),
                max_message: max_message.into(),
            },
        }
    }

    /// Email field with a minimum length
    pub fn email(
        name: impl Into<String>,
        min: usize,
        format_message: impl Into<String>,
        min_message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            rule: FieldRule::Email {
                min,
                format_message: format_message.into(),
                min_message: min_message.into(),
            },
        }
    }

    /// Enumerated select field
    pub fn one_of<I, S>(name: impl Into<String>, options: I, message: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            rule: FieldRule::OneOf {
                options: options.into_iter().map(Into::into).collect(),
                message: message.into(),
            },
        }
    }

    /// Integer field with an inclusive range
    pub fn integer(
        name: impl Into<String>,
        min: i64,
        max: i64,
        type_message: impl Into<String>,
        min_message: impl Into<String>,
        max_message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            rule: FieldRule::Integer {
                min,
                max,
                type_message: type_message.into(),
                min_message: min_message.into(),
                max_message: max_message.into(),
            },
        }
    }
}

/// Complete schema for one collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Collection this schema guards
    pub collection: String,
    /// Field definitions in declaration (and error reporting) order
    pub fields: Vec<FieldDef>,
}

impl Schema {
    /// Create a new schema
    pub fn new(collection: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        Self {
            collection: collection.into(),
            fields,
        }
    }

    /// Looks up a field definition by name
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Declared field names, in order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Validates the schema definition itself (not a record)
    pub fn validate_structure(&self) -> Result<(), String> {
        for (i, field) in self.fields.iter().enumerate() {
            if field.name.is_empty() || field.name.starts_with('_') {
                return Err(format!("Invalid field name '{}'", field.name));
            }
            if self.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(format!("Field '{}' declared twice", field.name));
            }
            match &field.rule {
                FieldRule::Text { min, max, .. } if min > max => {
                    return Err(format!("Field '{}': min length exceeds max", field.name));
                }
                FieldRule::Integer { min, max, .. } if min > max => {
                    return Err(format!("Field '{}': min exceeds max", field.name));
                }
                FieldRule::OneOf { options, .. } if options.is_empty() => {
                    return Err(format!("Field '{}' has no options", field.name));
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// A blank input map with every field at its default
    pub fn defaults(&self) -> serde_json::Map<String, Value> {
        self.fields
            .iter()
            .map(|f| (f.name.clone(), f.rule.default_value()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schema() -> Schema {
        Schema::new(
            "people",
            vec![
                FieldDef::text("nombre", 3, 100, "muy corto", "muy largo"),
                FieldDef::integer("edad", 5, 18, "entero", "mínimo", "máximo"),
            ],
        )
    }

    #[test]
    fn test_schema_structure_valid() {
        assert!(sample_schema().validate_structure().is_ok());
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let mut schema = sample_schema();
        schema.fields.push(FieldDef::text("nombre", 1, 2, "a", "b"));
        let err = schema.validate_structure().unwrap_err();
        assert!(err.contains("twice"));
    }

    #[test]
    fn test_system_prefixed_field_rejected() {
        let schema = Schema::new("people", vec![FieldDef::text("_id", 1, 2, "a", "b")]);
        assert!(schema.validate_structure().is_err());
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let schema = Schema::new("people", vec![FieldDef::text("nombre", 10, 2, "a", "b")]);
        assert!(schema.validate_structure().is_err());

        let schema = Schema::new(
            "people",
            vec![FieldDef::one_of("carrera", Vec::<String>::new(), "elige")],
        );
        assert!(schema.validate_structure().is_err());
    }

    #[test]
    fn test_defaults_follow_rule_kind() {
        let defaults = sample_schema().defaults();
        assert_eq!(defaults["nombre"], Value::String(String::new()));
        assert_eq!(defaults["edad"], Value::from(0));
    }

    #[test]
    fn test_rule_serialization_is_tagged() {
        let field = FieldDef::one_of("carrera", ["Medicina", "Derecho"], "elige");
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(json["rule"], "one_of");
        assert_eq!(json["name"], "carrera");
        assert_eq!(json["options"][1], "Derecho");
    }
}
