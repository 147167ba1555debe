//! Teacher rows (`teachers` collection)

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use super::{Choice, Entity};
use crate::schema::{FieldDef, Schema};

/// Academic department
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Department {
    #[serde(rename = "Ciencias")]
    Sciences,
    #[serde(rename = "Humanidades")]
    Humanities,
    #[serde(rename = "Ingeniería")]
    Engineering,
    #[serde(rename = "Medicina")]
    Medicine,
    #[serde(rename = "Derecho")]
    Law,
}

impl Choice for Department {
    const ALL: &'static [Self] = &[
        Department::Sciences,
        Department::Humanities,
        Department::Engineering,
        Department::Medicine,
        Department::Law,
    ];

    fn label(&self) -> &'static str {
        match self {
            Department::Sciences => "Ciencias",
            Department::Humanities => "Humanidades",
            Department::Engineering => "Ingeniería",
            Department::Medicine => "Medicina",
            Department::Law => "Derecho",
        }
    }
}

/// Teaching specialty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Specialty {
    #[serde(rename = "Matemáticas")]
    Mathematics,
    #[serde(rename = "Física")]
    Physics,
    #[serde(rename = "Química")]
    Chemistry,
    #[serde(rename = "Literatura")]
    Literature,
    #[serde(rename = "Historia")]
    History,
    #[serde(rename = "Sistemas")]
    Systems,
    #[serde(rename = "Civil")]
    Civil,
}

impl Choice for Specialty {
    const ALL: &'static [Self] = &[
        Specialty::Mathematics,
        Specialty::Physics,
        Specialty::Chemistry,
        Specialty::Literature,
        Specialty::History,
        Specialty::Systems,
        Specialty::Civil,
    ];

    fn label(&self) -> &'static str {
        match self {
            Specialty::Mathematics => "Matemáticas",
            Specialty::Physics => "Física",
            Specialty::Chemistry => "Química",
            Specialty::Literature => "Literatura",
            Specialty::History => "Historia",
            Specialty::Systems => "Sistemas",
            Specialty::Civil => "Civil",
        }
    }
}

/// A teacher row's fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teacher {
    /// Employee number (business key, not enforced unique)
    #[serde(rename = "numeroEmpleado")]
    pub employee_number: String,
    #[serde(rename = "nombre")]
    pub full_name: String,
    #[serde(rename = "correo")]
    pub email: String,
    #[serde(rename = "departamento")]
    pub department: Department,
    #[serde(rename = "especialidad")]
    pub specialty: Specialty,
}

impl Entity for Teacher {
    const COLLECTION: &'static str = "teachers";
    const NOUN: &'static str = "maestro";

    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::new(
                Self::COLLECTION,
                vec![
                    FieldDef::text(
                        "numeroEmpleado",
                        5,
                        15,
                        "El número de empleado debe tener al menos 5 caracteres",
                        "El número de empleado no puede exceder 15 caracteres",
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
                    FieldDef::one_of(
                        "departamento",
                        Department::labels(),
                        "Debes seleccionar un departamento",
                    ),
                    FieldDef::one_of(
                        "especialidad",
                        Specialty::labels(),
                        "Debes seleccionar una especialidad",
                    ),
                ],
            )
        })
    }
}
