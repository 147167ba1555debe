//! Student rows (`students` collection)

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use super::{Choice, Entity};
use crate::schema::{FieldDef, Schema};

/// Degree program a student is enrolled in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Program {
    #[serde(rename = "Ingeniería")]
    Engineering,
    #[serde(rename = "Medicina")]
    Medicine,
    #[serde(rename = "Derecho")]
    Law,
}

impl Choice for Program {
    const ALL: &'static [Self] = &[Program::Engineering, Program::Medicine, Program::Law];

    fn label(&self) -> &'static str {
        match self {
            Program::Engineering => "Ingeniería",
            Program::Medicine => "Medicina",
            Program::Law => "Derecho",
        }
    }
}

/// Academic term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Term {
    #[serde(rename = "1er Semestre")]
    First,
    #[serde(rename = "2do Semestre")]
    Second,
    #[serde(rename = "3er Semestre")]
    Third,
}

impl Choice for Term {
    const ALL: &'static [Self] = &[Term::First, Term::Second, Term::Third];

    fn label(&self) -> &'static str {
        match self {
            Term::First => "1er Semestre",
            Term::Second => "2do Semestre",
            Term::Third => "3er Semestre",
        }
    }
}

/// A student row's fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    /// Enrollment number (business key, not enforced unique)
    #[serde(rename = "numeroMatricula")]
    pub enrollment_number: String,
    #[serde(rename = "nombre")]
    pub full_name: String,
    #[serde(rename = "correo")]
    pub email: String,
    #[serde(rename = "carrera")]
    pub program: Program,
    #[serde(rename = "grado")]
    pub term: Term,
    #[serde(rename = "edad")]
    pub age: u8,
}

impl Entity for Student {
    const COLLECTION: &'static str = "students";
    const NOUN: &'static str = "estudiante";

    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::new(
                Self::COLLECTION,
                vec![
                    FieldDef::text(
                        "numeroMatricula",
                        5,
                        15,
                        "La matrícula debe tener al menos 5 caracteres",
                        "La matrícula no puede exceder 15 caracteres",
                    ),
                    FieldDef::text(
                        "nombre",
                        3,
                        100,
                        "El nombre debe tener al menos 3 caracteres",
                        "El nombre no puede exceder 100 caracteres",
                    ),
                    FieldDef::email(
                        "correo",
                        5,
                        "Correo electrónico inválido",
                        "El correo debe tener al menos 5 caracteres",
                    ),
                    FieldDef::one_of("carrera", Program::labels(), "Debes seleccionar una carrera"),
                    FieldDef::one_of("grado", Term::labels(), "Debes seleccionar un grado académico"),
                    FieldDef::integer(
                        "edad",
                        5,
                        18,
                        "La edad debe ser un número entero",
                        "La edad mínima es 5 años",
                        "La edad máxima es 18 años",
                    ),
                ],
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn input(value: Value) -> serde_json::Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_schema_is_well_formed() {
        assert!(Student::schema().validate_structure().is_ok());
        let names: Vec<_> = Student::schema().field_names().collect();
        assert_eq!(
            names,
            vec!["numeroMatricula", "nombre", "correo", "carrera", "grado", "edad"]
        );
    }

    #[test]
    fn test_valid_student_becomes_typed() {
        let student = Student::validate(&input(json!({
            "numeroMatricula": "A12345",
            "nombre": "Ana Ruiz",
            "correo": "ana@uni.edu",
            "carrera": "Medicina",
            "grado": "1er Semestre",
            "edad": 17
        })))
        .unwrap();

        assert_eq!(student.program, Program::Medicine);
        assert_eq!(student.term, Term::First);
        assert_eq!(student.age, 17);
    }

    #[test]
    fn test_short_enrollment_number_message() {
        let errors = Student::validate(&input(json!({
            "numeroMatricula": "A1",
            "nombre": "Ana Ruiz",
            "correo": "ana@uni.edu",
            "carrera": "Medicina",
            "grado": "1er Semestre",
            "edad": 17
        })))
        .unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.get("numeroMatricula"),
            Some("La matrícula debe tener al menos 5 caracteres")
        );
    }

    #[test]
    fn test_unknown_program_rejected() {
        let errors = Student::validate(&input(json!({
            "numeroMatricula": "A12345",
            "nombre": "Ana Ruiz",
            "correo": "ana@uni.edu",
            "carrera": "Astrología",
            "grado": "1er Semestre",
            "edad": 17
        })))
        .unwrap_err();

        assert_eq!(errors.get("carrera"), Some("Debes seleccionar una carrera"));
    }

    #[test]
    fn test_age_bounds_inclusive() {
        for (age, ok) in [(4, false), (5, true), (18, true), (19, false)] {
            let result = Student::validate(&input(json!({
                "numeroMatricula": "A12345",
                "nombre": "Ana Ruiz",
                "correo": "ana@uni.edu",
                "carrera": "Derecho",
                "grado": "3er Semestre",
                "edad": age
            })));
            assert_eq!(result.is_ok(), ok, "age {}", age);
        }
    }

    #[test]
    fn test_text_upper_bounds_inclusive() {
        let cases = [
            ("numeroMatricula", 15, None),
            (
                "numeroMatricula",
                16,
                Some("La matrícula no puede exceder 15 caracteres"),
            ),
            ("nombre", 100, None),
            ("nombre", 101, Some("El nombre no puede exceder 100 caracteres")),
        ];

        for (field, len, expected) in cases {
            let mut fields = input(json!({
                "numeroMatricula": "A12345",
                "nombre": "Ana Ruiz",
                "correo": "ana@uni.edu",
                "carrera": "Medicina",
                "grado": "1er Semestre",
                "edad": 17
            }));
            fields.insert(field.into(), json!("ñ".repeat(len)));

            match (Student::validate(&fields), expected) {
                (Ok(_), None) => {}
                (Err(errors), Some(message)) => {
                    assert_eq!(errors.len(), 1, "{} x{}", field, len);
                    assert_eq!(errors.get(field), Some(message));
                }
                (other, _) => panic!("{} x{}: unexpected {:?}", field, len, other),
            }
        }
    }

    #[test]
    fn test_to_fields_uses_wire_names() {
        let student = Student {
            enrollment_number: "A12345".into(),
            full_name: "Ana Ruiz".into(),
            email: "ana@uni.edu".into(),
            program: Program::Engineering,
            term: Term::Second,
            age: 12,
        };

        let fields = student.to_fields();
        assert_eq!(fields["carrera"], "Ingeniería");
        assert_eq!(fields["grado"], "2do Semestre");
        assert_eq!(fields["edad"], 12);
        assert_eq!(Student::from_fields(fields).unwrap(), student);
    }
}
