//! Field-level validation shared by request DTOs and the multi-step forms.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

pub const MIN_PASSWORD_LEN: usize = 8;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// A rejected input. The `Display` text is what the user sees in the form banner.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please fill in all required fields")]
    MissingFields(Vec<&'static str>),
    #[error("Please enter a valid email address")]
    InvalidEmail,
    #[error("Please complete all payment information")]
    IncompletePayment,
    #[error("Please enter a valid card number")]
    InvalidCardNumber,
    #[error("Please enter a valid CVV")]
    InvalidCvv,
    #[error("Please agree to the terms and conditions")]
    TermsNotAccepted,
    #[error("Password must be at least {MIN_PASSWORD_LEN} characters")]
    PasswordTooShort,
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("{0}")]
    Invalid(String),
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Fails with every blank field name when any `(name, value)` pair is empty
/// after trimming.
pub fn require<S: AsRef<str>>(fields: &[(&'static str, S)]) -> Result<(), ValidationError> {
    let missing: Vec<&'static str> = fields
        .iter()
        .filter(|(_, value)| value.as_ref().trim().is_empty())
        .map(|(name, _)| *name)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::MissingFields(missing))
    }
}

pub fn check_email(email: &str) -> Result<(), ValidationError> {
    if is_valid_email(email.trim()) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail)
    }
}

pub fn check_new_password(password: &str, confirmation: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort);
    }
    if password != confirmation {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_requires_local_part_domain_and_tld() {
        assert!(is_valid_email("parent@example.com"));
        assert!(is_valid_email("a.b+c@school.co.uk"));
        assert!(!is_valid_email("parent@example"));
        assert!(!is_valid_email("parent example@x.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn require_reports_every_blank_field() {
        let err = require(&[("first_name", "Ada"), ("city", "  "), ("zip_code", "")]).unwrap_err();
        assert_eq!(err, ValidationError::MissingFields(vec!["city", "zip_code"]));
        assert_eq!(err.to_string(), "Please fill in all required fields");
        assert!(require(&[("first_name", "Ada")]).is_ok());
    }

    #[test]
    fn new_password_rules() {
        assert_eq!(check_new_password("short", "short"), Err(ValidationError::PasswordTooShort));
        assert_eq!(
            check_new_password("longenough", "different1"),
            Err(ValidationError::PasswordMismatch)
        );
        assert!(check_new_password("longenough", "longenough").is_ok());
    }
}
