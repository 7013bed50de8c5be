//! Input validation for API requests.
//!
//! For collecting multiple validation errors and returning them as an ApiError,
//! use the `ValidationErrorBuilder` from the `error` module.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for validating email addresses (pragmatic, not RFC-complete)
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();

    /// Regex for validating hex color values like #1a2b3c
    static ref HEX_COLOR_REGEX: Regex = Regex::new(r"^#[0-9a-fA-F]{6}$").unwrap();
}

/// Validate a required text field
pub fn validate_required_text(value: &str, field_name: &str, max_len: usize) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} is required", field_name));
    }

    if value.len() > max_len {
        return Err(format!(
            "{} is too long (max {} characters)",
            field_name, max_len
        ));
    }

    Ok(())
}

/// Validate an email address
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email is too long (max 254 characters)".to_string());
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate an optional email address (empty string treated as absent)
pub fn validate_optional_email(email: &Option<String>) -> Result<(), String> {
    if let Some(e) = email {
        if e.is_empty() {
            return Ok(());
        }
        return validate_email(e);
    }

    Ok(())
}

/// Validate an optional hex color (empty string treated as absent)
pub fn validate_hex_color(color: &Option<String>) -> Result<(), String> {
    if let Some(c) = color {
        if c.is_empty() {
            return Ok(());
        }

        if !HEX_COLOR_REGEX.is_match(c) {
            return Err("Invalid color format. Use hex like '#1a2b3c'".to_string());
        }
    }

    Ok(())
}

/// Validate a UUID string
pub fn validate_uuid(id: &str, field_name: &str) -> Result<(), String> {
    if id.is_empty() {
        return Err(format!("{} is required", field_name));
    }

    if uuid::Uuid::parse_str(id).is_err() {
        return Err(format!("Invalid {} format", field_name));
    }

    Ok(())
}

/// Normalize an optional text field: trims whitespace and maps empty strings
/// to None, so the row stores NULL rather than ''.
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    match value {
        Some(v) => {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        None => None,
    }
}
