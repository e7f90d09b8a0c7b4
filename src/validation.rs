//! Form validation
//!
//! Client-side field checks. Failures are resolved locally: the page sets
//! per-field errors and an error notification, and nothing is sent.

use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

/// Maximum length of free-text messages
pub const MAX_MESSAGE_LEN: usize = 500;

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("valid regex")
    })
}

fn name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-zÁÉÍÓÚáéíóúÑñÜü ]{2,50}$").expect("valid regex"))
}

fn phone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{10}$").expect("valid regex"))
}

fn code_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{6}$").expect("valid regex"))
}

/// Per-field error messages, keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of a field check
    pub fn check(&mut self, field: &'static str, result: Result<(), String>) {
        match result {
            Ok(()) => {
                self.0.remove(field);
            }
            Err(message) => {
                self.0.insert(field, message);
            }
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// Turn a non-empty set into an error
    pub fn into_result(self) -> Result<(), ValidationError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ValidationError(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.0.keys().copied().collect();
        write!(f, "{}", fields.join(", "))
    }
}

/// One or more fields failed validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid fields: {0}")]
pub struct ValidationError(pub FieldErrors);

pub fn email(value: &str) -> Result<(), String> {
    let value = value.trim();
    if value.is_empty() {
        return Err("El correo electrónico es obligatorio.".to_string());
    }
    if !email_re().is_match(value) {
        return Err("Ingresa un correo electrónico válido.".to_string());
    }
    Ok(())
}

pub fn name(value: &str) -> Result<(), String> {
    if !name_re().is_match(value.trim()) {
        return Err("El nombre solo puede contener letras y espacios (2 a 50 caracteres).".to_string());
    }
    Ok(())
}

pub fn phone(value: &str) -> Result<(), String> {
    if !phone_re().is_match(value.trim()) {
        return Err("El teléfono debe tener 10 dígitos.".to_string());
    }
    Ok(())
}

pub fn message(value: &str) -> Result<(), String> {
    let value = value.trim();
    if value.is_empty() {
        return Err("El mensaje es obligatorio.".to_string());
    }
    if value.chars().count() > MAX_MESSAGE_LEN {
        return Err(format!(
            "El mensaje no puede superar {} caracteres.",
            MAX_MESSAGE_LEN
        ));
    }
    Ok(())
}

pub fn password(value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err("La contraseña es obligatoria.".to_string());
    }
    Ok(())
}

pub fn verification_code(value: &str) -> Result<(), String> {
    if !code_re().is_match(value.trim()) {
        return Err("El código debe tener 6 dígitos.".to_string());
    }
    Ok(())
}

pub fn required(value: &str, label: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} es obligatorio.", label));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email() {
        assert!(email("ana.ruiz@clinica.mx").is_ok());
        assert!(email(" ana@x.com ").is_ok());
        assert!(email("not-an-email").is_err());
        assert!(email("a@b").is_err());
        assert!(email("").is_err());
    }

    #[test]
    fn test_name_accepts_accents() {
        assert!(name("José Núñez").is_ok());
        assert!(name("A").is_err());
        assert!(name("R2D2").is_err());
    }

    #[test]
    fn test_phone_and_code() {
        assert!(phone("7711234567").is_ok());
        assert!(phone("771-123-4567").is_err());
        assert!(verification_code("123456").is_ok());
        assert!(verification_code("12345").is_err());
    }

    #[test]
    fn test_message_length() {
        assert!(message("Hola").is_ok());
        assert!(message("   ").is_err());
        assert!(message(&"x".repeat(MAX_MESSAGE_LEN + 1)).is_err());
    }

    #[test]
    fn test_field_errors_check_replaces_entries() {
        let mut errors = FieldErrors::new();
        errors.check("email", email("bad"));
        errors.check("nombre", name("Ana"));
        assert_eq!(errors.len(), 1);
        assert!(errors.get("email").is_some());

        errors.check("email", email("ana@x.com"));
        assert!(errors.is_empty());
        assert!(errors.into_result().is_ok());
    }

    #[test]
    fn test_validation_error_display() {
        let mut errors = FieldErrors::new();
        errors.check("telefono", phone("1"));
        errors.check("email", email("x"));
        let err = errors.into_result().unwrap_err();
        assert_eq!(err.to_string(), "Invalid fields: email, telefono");
    }
}
