/// Sign-in and sign-out handlers

use actix_web::{web, HttpRequest, HttpResponse};
use sqlx::PgPool;

use crate::auth::{
    clear_session_cookie, issue_session_token, revoke_session_token, session_cookie,
    verify_password, verify_session_token, SESSION_COOKIE,
};
use crate::configuration::{ApplicationSettings, JwtSettings};
use crate::error::{AppError, ValidationError};
use crate::store;

#[derive(serde::Deserialize)]
pub struct SignInRequest {
    pub identifier: String,
    pub password: String,
}

/// POST /api/sign-in
///
/// Looks the account up by username or email. An unknown identifier and a
/// wrong password produce byte-identical responses, so the endpoint cannot
/// be used to enumerate accounts. An unverified account signs in fine; the
/// route guard walks it to the verification page.
pub async fn sign_in(
    form: web::Json<SignInRequest>,
    pool: web::Data<PgPool>,
    jwt_config: web::Data<JwtSettings>,
    app_settings: web::Data<ApplicationSettings>,
) -> Result<HttpResponse, AppError> {
    let identifier = form.identifier.trim();
    if identifier.is_empty() {
        return Err(ValidationError::EmptyField("identifier").into());
    }
    if form.password.is_empty() {
        return Err(ValidationError::EmptyField("password").into());
    }

    let account = store::find_by_username_or_email(pool.get_ref(), identifier)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !verify_password(&form.password, &account.password_hash)? {
        return Err(AppError::InvalidCredentials);
    }

    let token = issue_session_token(
        account.id,
        &account.email,
        &account.username,
        account.is_verified,
        jwt_config.get_ref(),
    )?;

    tracing::info!(account_id = %account.id, "Signed in");

    Ok(HttpResponse::Ok()
        .cookie(session_cookie(
            token,
            app_settings.is_production(),
            jwt_config.token_expiry_seconds,
        ))
        .json(serde_json::json!({
            "success": true,
            "message": "Sign in successful",
            "user": {
                "id": account.id,
                "username": account.username,
                "email": account.email,
                "isVerified": account.is_verified,
                "isAccepting": account.is_accepting,
            }
        })))
}

/// POST /api/sign-out
///
/// Revokes the presented token and clears the cookie. Always succeeds: a
/// missing or already-invalid cookie still gets the clearing response.
pub async fn sign_out(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    jwt_config: web::Data<JwtSettings>,
    app_settings: web::Data<ApplicationSettings>,
) -> Result<HttpResponse, AppError> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        if let Ok(claims) = verify_session_token(cookie.value(), jwt_config.get_ref()) {
            revoke_session_token(pool.get_ref(), &claims).await?;
        }
    }

    Ok(HttpResponse::Ok()
        .cookie(clear_session_cookie(app_settings.is_production()))
        .json(serde_json::json!({
            "success": true,
            "message": "Signed out successfully"
        })))
}
