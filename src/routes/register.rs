/// Registration handlers
///
/// Creates an unverified account with a fresh verification code, or
/// refreshes an unverified one in place, then dispatches the code by email.

use actix_web::{web, HttpResponse};
use sqlx::PgPool;

use crate::auth::hash_password;
use crate::email_client::EmailClient;
use crate::error::AppError;
use crate::store;
use crate::validators::{is_valid_email, is_valid_username};
use crate::verification_code::VerificationCode;

#[derive(serde::Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(serde::Deserialize)]
pub struct CheckUsernameQuery {
    username: String,
}

/// POST /api/register
///
/// Registration is the only path that issues a verification code: calling
/// it again for a still-unverified email re-issues code, expiry, and
/// password in place instead of creating a second account.
///
/// # Errors
/// - 400: invalid input, or the email/username belongs to a verified account
/// - 500: email dispatch failure (the account row is already persisted and
///   is NOT rolled back; a later registration call reissues the code)
pub async fn register(
    form: web::Json<RegisterRequest>,
    pool: web::Data<PgPool>,
    email_client: web::Data<EmailClient>,
) -> Result<HttpResponse, AppError> {
    let username = is_valid_username(&form.username)?;
    let email = is_valid_email(&form.email)?;
    let password_hash = hash_password(&form.password)?;

    let code = VerificationCode::generate();
    let account_id = store::upsert_unverified(
        pool.get_ref(),
        &username,
        &email,
        &password_hash,
        code.code(),
        code.expires_at(),
    )
    .await?;

    tracing::info!(
        account_id = %account_id,
        username = %username,
        "Account awaiting verification"
    );

    email_client
        .send_verification_code(&email, &username, code.code())
        .await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "message": "User registered successfully. Please check your email for verification."
    })))
}

/// GET /api/check-username?username=
pub async fn check_username(
    query: web::Query<CheckUsernameQuery>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let username = is_valid_username(&query.username)?;
    let taken = store::username_taken(pool.get_ref(), &username).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": if taken { "Username is already taken" } else { "Username is available" },
        "isUnique": !taken,
    })))
}
