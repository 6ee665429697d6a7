//! Input validation for request bodies and path parameters.
//!
//! Account fields (email, password, name) fail with field-level
//! `Validation` errors. Record fields fail with `MissingField` when absent and
//! `InvalidParameter` when present but unusable.

use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use crate::error::{Error, Result, ValidationErrors};

fn invalid(field: &str, message: impl Into<String>) -> Error {
    Error::Validation(ValidationErrors::Single {
        field: field.to_string(),
        message: message.into(),
    })
}

/// Validates email format using structural checks
///
/// # Examples
/// ```
/// use tutor_attendance::validation::validate_email;
///
/// validate_email("user@example.com").unwrap();
/// assert!(validate_email("invalid-email").is_err());
/// ```
pub fn validate_email(email: &str) -> Result<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(invalid("email", "Email cannot be empty"));
    }

    if email.len() > 254 {
        return Err(invalid("email", "Email address is too long (max 254 characters)"));
    }

    let Some((local_part, domain)) = email.split_once('@') else {
        return Err(invalid("email", "Invalid email format: must contain @ symbol"));
    };

    if domain.contains('@') {
        return Err(invalid("email", "Invalid email format: must contain exactly one @ symbol"));
    }

    if local_part.is_empty() || local_part.len() > 64 {
        return Err(invalid("email", "Invalid email format: local part must be 1-64 characters"));
    }

    if domain.is_empty() || domain.len() > 253 || !domain.contains('.') {
        return Err(invalid("email", "Invalid email format: domain must contain at least one dot"));
    }

    if email.contains("..") {
        return Err(invalid("email", "Invalid email format: cannot contain consecutive dots"));
    }

    let invalid_chars = ['<', '>', '(', ')', '[', ']', '\\', ',', ';', ':', '"', ' '];
    if let Some(c) = email.chars().find(|c| invalid_chars.contains(c)) {
        return Err(invalid("email", format!("Invalid email format: cannot contain '{}'", c)));
    }

    Ok(())
}

/// Validates password strength and format
pub fn validate_password(password: &str) -> Result<()> {
    if password.len() < 8 {
        return Err(invalid("password", "Password must be at least 8 characters long"));
    }

    if password.len() > 128 {
        return Err(invalid("password", "Password is too long (max 128 characters)"));
    }

    let lowered = password.to_lowercase();
    if ["password", "12345678", "qwerty123", "admin123"].contains(&lowered.as_str()) {
        return Err(invalid("password", "Password is too common and weak"));
    }

    if password.contains(' ') {
        return Err(invalid("password", "Password cannot contain spaces"));
    }

    Ok(())
}

/// Validates a display name, returning it trimmed.
pub fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(invalid("name", "Name cannot be empty"));
    }

    if name.chars().count() > 100 {
        return Err(invalid("name", "Name must be less than 100 characters"));
    }

    if name.chars().any(char::is_control) {
        return Err(invalid("name", "Name cannot contain control characters"));
    }

    Ok(name.to_string())
}

/// Returns the trimmed value of a required field.
pub fn require_field(value: Option<String>, field: &str) -> Result<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::MissingField(format!("{} is required", field)))
}

/// Value of a non-nullable field in a partial update.
///
/// An explicit `null` or a blank string is rejected.
pub fn require_non_null(value: Option<String>, field: &str) -> Result<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::InvalidParameter(format!("{} cannot be null or empty", field)))
}

/// Accepts `YYYY-MM-DD`.
pub fn validate_tutoring_date(value: &str) -> Result<()> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| Error::InvalidParameter(format!("Invalid tutoring_date '{}': expected YYYY-MM-DD", value)))
}

/// Accepts `HH:MM` or `HH:MM:SS`.
pub fn validate_tutoring_time(value: &str) -> Result<()> {
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .map(|_| ())
        .map_err(|_| Error::InvalidParameter(format!("Invalid tutoring_time '{}': expected HH:MM or HH:MM:SS", value)))
}

/// Parses a path id. An id that cannot be a UUID matches no row, so it
/// fails the same way a missing row does, with `not_found` as the message.
pub fn parse_path_id(value: &str, not_found: &str) -> Result<Uuid> {
    Uuid::parse_str(value.trim()).map_err(|_| Error::NotFound(not_found.to_string()))
}
