// Validation utilities module
// Custom rules for account fields that the validator derive cannot express

use lazy_static::lazy_static;
use regex::Regex;
use std::borrow::Cow;
use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

lazy_static! {
    /// Letters (including Latin-1 accented ones), spaces, hyphens and apostrophes
    static ref PERSON_NAME: Regex = Regex::new(r"^[a-zA-ZÀ-ÿ' \-]+$").expect("valid name regex");
}

const NAME_MIN_CHARS: usize = 2;
const NAME_MAX_CHARS: usize = 50;

fn error_with_message(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

/// Passwords need at least one lowercase letter, one uppercase letter and one digit
pub fn validate_password_complexity(password: &str) -> Result<(), ValidationError> {
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if has_lower && has_upper && has_digit {
        Ok(())
    } else {
        Err(error_with_message(
            "password_complexity",
            "Password must contain at least one lowercase letter, one uppercase letter and one digit",
        ))
    }
}

/// Names are stored trimmed, so both rules apply to the trimmed value
pub fn validate_person_name(name: &str) -> Result<(), ValidationError> {
    let name = name.trim();
    let length = name.chars().count();
    if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&length) {
        return Err(error_with_message(
            "name_length",
            "Names must be between 2 and 50 characters long",
        ));
    }
    if PERSON_NAME.is_match(name) {
        Ok(())
    } else {
        Err(error_with_message(
            "invalid_name",
            "Names may only contain letters, spaces, hyphens and apostrophes",
        ))
    }
}

/// A confirmation, when supplied, must repeat the password exactly
pub fn validate_register_confirmation(
    password: &str,
    confirmation: Option<&str>,
) -> Result<(), ValidationError> {
    match confirmation {
        Some(confirm) if confirm != password => Err(error_with_message(
            "password_mismatch",
            "Passwords do not match",
        )),
        _ => Ok(()),
    }
}

/// Flattens validator output into one human readable line
pub fn summarize_errors(errors: &ValidationErrors) -> String {
    let mut messages = Vec::new();
    collect_messages(errors, &mut messages);
    if messages.is_empty() {
        "Invalid input data".to_string()
    } else {
        messages.sort();
        messages.dedup();
        messages.join(", ")
    }
}

fn collect_messages(errors: &ValidationErrors, out: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field));
                    out.push(message);
                }
            }
            ValidationErrorsKind::Struct(nested) => collect_messages(nested, out),
            ValidationErrorsKind::List(items) => {
                for nested in items.values() {
                    collect_messages(nested, out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_complexity_requires_all_three_classes() {
        assert!(validate_password_complexity("Secret1").is_ok());
        assert!(validate_password_complexity("secret1").is_err());
        assert!(validate_password_complexity("SECRET1").is_err());
        assert!(validate_password_complexity("Secretpw").is_err());
    }

    #[test]
    fn person_names_accept_accents_and_hyphens() {
        assert!(validate_person_name("Éloïse").is_ok());
        assert!(validate_person_name("Jean-Luc").is_ok());
        assert!(validate_person_name("O'Brien").is_ok());
        assert!(validate_person_name("R2D2").is_err());
        assert!(validate_person_name("<script>").is_err());
    }

    #[test]
    fn name_length_counts_trimmed_characters() {
        assert!(validate_person_name("  J  ").is_err());
        assert!(validate_person_name("   ").is_err());
        assert!(validate_person_name(" Jo ").is_ok());
        assert!(validate_person_name("Élo").is_ok());
        assert!(validate_person_name(&"a".repeat(50)).is_ok());
        assert!(validate_person_name(&format!(" {} ", "a".repeat(51))).is_err());
    }

    #[test]
    fn confirmation_is_optional_but_must_match() {
        assert!(validate_register_confirmation("Secret1", None).is_ok());
        assert!(validate_register_confirmation("Secret1", Some("Secret1")).is_ok());
        assert!(validate_register_confirmation("Secret1", Some("Secret2")).is_err());
    }

    #[test]
    fn summary_uses_custom_messages() {
        let mut errors = ValidationErrors::new();
        errors.add("password", validate_password_complexity("weak").unwrap_err());
        errors.add("email", ValidationError::new("email"));

        let summary = summarize_errors(&errors);
        assert!(summary.contains("one uppercase letter"));
        assert!(summary.contains("email is invalid"));
    }
}
