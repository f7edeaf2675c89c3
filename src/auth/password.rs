/// Password hashing and verification with bcrypt.

use bcrypt::{hash, verify, DEFAULT_COST};

use crate::error::AppError;
use crate::validators::is_valid_password;

/// Hash a password after length validation.
///
/// # Errors
/// Returns a validation error for out-of-range lengths, or an internal
/// error if bcrypt fails.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    is_valid_password(password)?;

    hash(password, DEFAULT_COST).map_err(|e| {
        AppError::Store(crate::error::StoreError::Unexpected(format!(
            "Password hashing failed: {}",
            e
        )))
    })
}

/// Verify a password against its stored hash.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    verify(password, password_hash).map_err(|e| {
        AppError::Store(crate::error::StoreError::Unexpected(format!(
            "Password verification failed: {}",
            e
        )))
    })
}
