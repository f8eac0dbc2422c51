//! Ready-made rule sets for the fields the app asks for most.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::{Result, ValidateError};
use crate::rules::{FieldKind, FieldRules, Values, Verdict};

static NOMBRE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-ZáéíóúÁÉÍÓÚñÑüÜ\s]+$").unwrap());

/// Names accepted by [`by_name`].
pub const NAMES: &[&str] = &[
    "required", "email", "password", "radicado", "cedula", "telefono", "nombre",
];

pub fn required() -> FieldRules {
    FieldRules::new().required()
}

pub fn email() -> FieldRules {
    FieldRules::new().required().kind(FieldKind::Email)
}

/// At least 8 characters with a lowercase letter, an uppercase letter and a
/// digit.
pub fn password() -> FieldRules {
    FieldRules::new()
        .required()
        .min_length(8)
        .validate(|value: &Value, _: &Values| {
            let text = value.as_str().unwrap_or_default();
            let mixed = text.chars().any(char::is_lowercase)
                && text.chars().any(char::is_uppercase)
                && text.chars().any(|c| c.is_ascii_digit());
            if mixed {
                Verdict::Valid
            } else {
                Verdict::from("Must contain uppercase, lowercase and numbers")
            }
        })
}

pub fn radicado() -> FieldRules {
    FieldRules::new().required().kind(FieldKind::Radicado)
}

pub fn cedula() -> FieldRules {
    FieldRules::new().required().kind(FieldKind::Cedula)
}

pub fn telefono() -> FieldRules {
    FieldRules::new().kind(FieldKind::Phone)
}

/// A person's name: 2 to 50 letters or spaces, Spanish accents allowed.
pub fn nombre() -> FieldRules {
    FieldRules::new()
        .required()
        .min_length(2)
        .max_length(50)
        .pattern_regex(NOMBRE.clone(), Some("Only letters and spaces".to_string()))
}

/// Looks up a preset by name.
pub fn by_name(name: &str) -> Result<FieldRules> {
    let rules = match name {
        "required" => required(),
        "email" => email(),
        "password" => password(),
        "radicado" => radicado(),
        "cedula" => cedula(),
        "telefono" => telefono(),
        "nombre" => nombre(),
        other => {
            return Err(ValidateError::UnknownPreset(
                other.to_string(),
                NAMES.join(", "),
            ))
        }
    };
    Ok(rules)
}
