/// Unified error handling for the service.
///
/// Domain-specific error types are folded into a single `AppError` that
/// implements actix's `ResponseError`. Every handler failure crosses the
/// request boundary as a uniform `{success: false, message}` JSON body with
/// the mapped status code.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::error::Error as StdError;
use std::fmt;

/// Validation errors for request input
#[derive(Debug, Clone)]
pub enum ValidationError {
    EmptyField(&'static str),
    TooShort(&'static str, usize),
    TooLong(&'static str, usize),
    InvalidFormat(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyField(field) => write!(f, "{} is required", field),
            ValidationError::TooShort(field, min) => {
                write!(f, "{} is too short (minimum {} characters)", field, min)
            }
            ValidationError::TooLong(field, max) => {
                write!(f, "{} is too long (maximum {} characters)", field, max)
            }
            ValidationError::InvalidFormat(msg) => write!(f, "{}", msg),
        }
    }
}

impl StdError for ValidationError {}

/// Store-level failures that are not part of the account state machine
#[derive(Debug)]
pub enum StoreError {
    Connection(String),
    Unexpected(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Connection(msg) => write!(f, "Database connection error: {}", msg),
            StoreError::Unexpected(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl StdError for StoreError {}

/// Failures of external collaborators (email dispatch, AI service)
#[derive(Debug, Clone)]
pub enum UpstreamError {
    EmailDispatch(String),
    AiService(String),
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamError::EmailDispatch(msg) => write!(f, "Email dispatch failed: {}", msg),
            UpstreamError::AiService(msg) => write!(f, "AI service request failed: {}", msg),
        }
    }
}

impl StdError for UpstreamError {}

/// Central error type for the account lifecycle and its collaborators.
///
/// `InvalidCredentials` and `InvalidToken` carry deliberately generic
/// messages so responses never reveal which part of the input was wrong.
#[derive(Debug)]
pub enum AppError {
    Validation(ValidationError),
    DuplicateAccount,
    InvalidCredentials,
    InvalidToken,
    InvalidCode,
    ExpiredCode,
    AlreadyVerified,
    NotAccepting,
    NotFound(&'static str),
    Upstream(UpstreamError),
    Store(StoreError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(e) => write!(f, "{}", e),
            AppError::DuplicateAccount => write!(f, "User already exists"),
            AppError::InvalidCredentials => write!(f, "Invalid credentials"),
            AppError::InvalidToken => write!(f, "Invalid or expired token"),
            AppError::InvalidCode => write!(f, "Invalid verification code"),
            AppError::ExpiredCode => write!(f, "Verification code has expired"),
            AppError::AlreadyVerified => write!(f, "User is already verified"),
            AppError::NotAccepting => write!(f, "User is not accepting messages"),
            AppError::NotFound(what) => write!(f, "{} not found", what),
            AppError::Upstream(e) => write!(f, "{}", e),
            AppError::Store(e) => write!(f, "{}", e),
        }
    }
}

impl StdError for AppError {}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<UpstreamError> for AppError {
    fn from(err: UpstreamError) -> Self {
        AppError::Upstream(err)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if matches!(err, sqlx::Error::RowNotFound) {
            return AppError::NotFound("Record");
        }

        let error_msg = err.to_string();
        if error_msg.contains("duplicate key") || error_msg.contains("unique constraint") {
            // The unique indexes on username/email are the single source of
            // truth for duplicate accounts.
            AppError::DuplicateAccount
        } else if error_msg.contains("pool") || error_msg.contains("connect") {
            AppError::Store(StoreError::Connection(error_msg))
        } else {
            AppError::Store(StoreError::Unexpected(error_msg))
        }
    }
}

impl AppError {
    /// Message placed in the response body. Internal failure detail stays in
    /// the logs; clients get a stable, non-leaking sentence.
    fn public_message(&self) -> String {
        match self {
            AppError::Store(_) => "Internal server error".to_string(),
            AppError::Upstream(UpstreamError::EmailDispatch(_)) => {
                "Failed to send verification email".to_string()
            }
            AppError::Upstream(UpstreamError::AiService(_)) => {
                "AI service is temporarily unavailable".to_string()
            }
            other => other.to_string(),
        }
    }

    fn log(&self) {
        match self {
            AppError::Validation(e) => {
                tracing::warn!(error = %e, "Validation error");
            }
            AppError::DuplicateAccount => {
                tracing::warn!("Duplicate account attempt");
            }
            AppError::InvalidCredentials | AppError::InvalidToken => {
                tracing::warn!(error = %self, "Authentication failure");
            }
            AppError::InvalidCode | AppError::ExpiredCode | AppError::AlreadyVerified => {
                tracing::warn!(error = %self, "Verification rejected");
            }
            AppError::NotAccepting | AppError::NotFound(_) => {
                tracing::warn!(error = %self, "Request rejected");
            }
            AppError::Upstream(e) => {
                tracing::error!(error = %e, "Upstream failure");
            }
            AppError::Store(e) => {
                tracing::error!(error = %e, "Store failure");
            }
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::DuplicateAccount
            | AppError::InvalidCode
            | AppError::ExpiredCode
            | AppError::AlreadyVerified => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::NotAccepting => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Upstream(_) | AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        self.log();

        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "success": false,
            "message": self.public_message(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::EmptyField("email");
        assert_eq!(err.to_string(), "email is required");

        let err = ValidationError::TooShort("username", 3);
        assert_eq!(err.to_string(), "username is too short (minimum 3 characters)");
    }

    #[test]
    fn test_credential_errors_share_no_detail() {
        // Neither variant names the failing field.
        assert_eq!(AppError::InvalidCredentials.to_string(), "Invalid credentials");
        assert_eq!(AppError::InvalidToken.to_string(), "Invalid or expired token");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::DuplicateAccount.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::InvalidCode.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::ExpiredCode.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::InvalidCredentials.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::NotAccepting.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::NotFound("User").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::Upstream(UpstreamError::EmailDispatch("timeout".to_string())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: AppError = sqlx::Error::RowNotFound.into();
        match err {
            AppError::NotFound(_) => (),
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_store_errors_do_not_leak_detail() {
        let err = AppError::Store(StoreError::Unexpected("relation accounts".to_string()));
        assert_eq!(err.public_message(), "Internal server error");
    }
}
