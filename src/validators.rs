/// Input validators for the account lifecycle endpoints.
///
/// Each validator returns the normalized value (trimmed, and lowercased for
/// usernames) so handlers never store raw request input.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MIN_EMAIL_LENGTH: usize = 5;
const MIN_USERNAME_LENGTH: usize = 3;
const MAX_USERNAME_LENGTH: usize = 20;
const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 100;
const MAX_MESSAGE_LENGTH: usize = 300;

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();

    // Usernames are stored lowercase and double as URL path segments.
    static ref USERNAME_REGEX: Regex = Regex::new(r"^[a-z0-9]+$").unwrap();

    static ref CODE_REGEX: Regex = Regex::new(r"^[0-9]{6}$").unwrap();
}

pub fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("email"));
    }
    if trimmed.len() < MIN_EMAIL_LENGTH {
        return Err(ValidationError::TooShort("email", MIN_EMAIL_LENGTH));
    }
    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email", MAX_EMAIL_LENGTH));
    }
    if !EMAIL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat(
            "Please enter a valid email address".to_string(),
        ));
    }

    Ok(trimmed.to_string())
}

/// Validates and normalizes a username to its stored (lowercase) form.
pub fn is_valid_username(username: &str) -> Result<String, ValidationError> {
    let normalized = username.trim().to_lowercase();

    if normalized.is_empty() {
        return Err(ValidationError::EmptyField("username"));
    }
    if normalized.len() < MIN_USERNAME_LENGTH {
        return Err(ValidationError::TooShort("username", MIN_USERNAME_LENGTH));
    }
    if normalized.len() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::TooLong("username", MAX_USERNAME_LENGTH));
    }
    if !USERNAME_REGEX.is_match(&normalized) {
        return Err(ValidationError::InvalidFormat(
            "Username must contain only lowercase letters and numbers".to_string(),
        ));
    }

    Ok(normalized)
}

pub fn is_valid_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::EmptyField("password"));
    }
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort("password", MIN_PASSWORD_LENGTH));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::TooLong("password", MAX_PASSWORD_LENGTH));
    }

    Ok(())
}

/// A submitted verification code must look like a code before it is compared
/// against the stored one.
pub fn is_valid_code(code: &str) -> Result<String, ValidationError> {
    let trimmed = code.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("code"));
    }
    if !CODE_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat(
            "Verification code must be exactly 6 digits".to_string(),
        ));
    }

    Ok(trimmed.to_string())
}

pub fn is_valid_message(content: &str) -> Result<String, ValidationError> {
    let trimmed = content.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("content"));
    }
    if trimmed.len() > MAX_MESSAGE_LENGTH {
        return Err(ValidationError::TooLong("content", MAX_MESSAGE_LENGTH));
    }
    if trimmed.contains('\0') || trimmed.chars().any(|c| c.is_control() && c != '\n') {
        return Err(ValidationError::InvalidFormat(
            "Message contains invalid characters".to_string(),
        ));
    }

    Ok(trimmed.to_string())
}
