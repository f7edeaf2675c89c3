/// Account profile handlers

use actix_web::{web, HttpRequest, HttpResponse};
use sqlx::PgPool;

use crate::auth::authenticated_claims;
use crate::configuration::JwtSettings;
use crate::error::AppError;
use crate::store;

#[derive(serde::Deserialize)]
pub struct ToggleAcceptanceRequest {
    #[serde(rename = "isAccepting")]
    pub is_accepting: bool,
}

/// GET /api/user
pub async fn current_user(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let claims = authenticated_claims(&req, pool.get_ref(), jwt_config.get_ref()).await?;

    let account = store::find_by_id(pool.get_ref(), claims.account_id()?)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    let message_count = store::message_count(pool.get_ref(), account.id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "User data retrieved successfully",
        "user": {
            "id": account.id,
            "username": account.username,
            "email": account.email,
            "isVerified": account.is_verified,
            "isAccepting": account.is_accepting,
            "messageCount": message_count,
        }
    })))
}

/// POST /api/toggle-acceptance
///
/// Flips whether the account accepts new anonymous messages.
pub async fn toggle_acceptance(
    req: HttpRequest,
    form: web::Json<ToggleAcceptanceRequest>,
    pool: web::Data<PgPool>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let claims = authenticated_claims(&req, pool.get_ref(), jwt_config.get_ref()).await?;
    let account_id = claims.account_id()?;

    store::set_acceptance(pool.get_ref(), account_id, form.is_accepting).await?;

    tracing::info!(
        account_id = %account_id,
        is_accepting = form.is_accepting,
        "Message acceptance updated"
    );

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": if form.is_accepting {
            "Now accepting messages"
        } else {
            "No longer accepting messages"
        },
        "isAccepting": form.is_accepting,
    })))
}
