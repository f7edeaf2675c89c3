/// Email verification handler
///
/// The one-way Unverified -> Verified transition: an exact, unexpired code
/// match flips the flag and signs the caller in with a verified session.

use actix_web::{web, HttpResponse};
use chrono::Utc;
use sqlx::PgPool;

use crate::auth::{issue_session_token, session_cookie};
use crate::configuration::{ApplicationSettings, JwtSettings};
use crate::error::AppError;
use crate::store;
use crate::validators::{is_valid_code, is_valid_email};

#[derive(serde::Deserialize)]
pub struct VerifyRequest {
    pub email: String,
    pub code: String,
}

/// POST /api/verify
///
/// Check order matters: unknown email (404), already verified (400), code
/// mismatch (400), then expiry (400). A wrong or expired code changes
/// nothing; the stored code stays until a new registration call replaces
/// it. The code is retained after success as well.
///
/// On success the session cookie is set with `verified=true` claims.
pub async fn verify_email(
    form: web::Json<VerifyRequest>,
    pool: web::Data<PgPool>,
    jwt_config: web::Data<JwtSettings>,
    app_settings: web::Data<ApplicationSettings>,
) -> Result<HttpResponse, AppError> {
    let email = is_valid_email(&form.email)?;
    let code = is_valid_code(&form.code)?;

    let account = store::find_by_email(pool.get_ref(), &email)
        .await?
        .ok_or(AppError::NotFound("User"))?;

    if account.is_verified {
        return Err(AppError::AlreadyVerified);
    }
    if account.verification_code != code {
        return Err(AppError::InvalidCode);
    }
    if Utc::now() > account.code_expires_at {
        return Err(AppError::ExpiredCode);
    }

    store::mark_verified(pool.get_ref(), account.id).await?;

    let token = issue_session_token(
        account.id,
        &account.email,
        &account.username,
        true,
        jwt_config.get_ref(),
    )?;

    tracing::info!(account_id = %account.id, "Email verified");

    Ok(HttpResponse::Ok()
        .cookie(session_cookie(
            token,
            app_settings.is_production(),
            jwt_config.token_expiry_seconds,
        ))
        .json(serde_json::json!({
            "success": true,
            "message": "Email verified successfully",
            "user": {
                "id": account.id,
                "username": account.username,
                "email": account.email,
                "isVerified": true,
                "isAccepting": account.is_accepting,
            }
        })))
}
