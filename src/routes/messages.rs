/// Message handlers
///
/// Sending is anonymous and public: anyone with the recipient's link can
/// post. Reading and deleting require the owner's session.

use actix_web::{web, HttpRequest, HttpResponse};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::authenticated_claims;
use crate::configuration::JwtSettings;
use crate::error::AppError;
use crate::store;
use crate::validators::{is_valid_message, is_valid_username};

#[derive(serde::Deserialize)]
pub struct SendMessageRequest {
    pub username: String,
    pub content: String,
}

/// POST /api/send-message
///
/// # Errors
/// - 404: unknown recipient
/// - 400: recipient has not verified their email
/// - 403: recipient is not accepting messages
pub async fn send_message(
    form: web::Json<SendMessageRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let username = is_valid_username(&form.username)?;
    let content = is_valid_message(&form.content)?;

    let account = store::find_by_username(pool.get_ref(), &username)
        .await?
        .ok_or(AppError::NotFound("User"))?;

    if !account.is_verified {
        return Err(AppError::Validation(
            crate::error::ValidationError::InvalidFormat("User is not verified".to_string()),
        ));
    }
    if !account.is_accepting {
        return Err(AppError::NotAccepting);
    }

    let message_id = store::append_message(pool.get_ref(), account.id, &content).await?;

    tracing::info!(
        account_id = %account.id,
        message_id = %message_id,
        "Anonymous message delivered"
    );

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "message": "Message sent successfully"
    })))
}

/// GET /api/messages
///
/// The caller's own messages, newest first.
pub async fn get_messages(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let claims = authenticated_claims(&req, pool.get_ref(), jwt_config.get_ref()).await?;
    let messages = store::messages_for(pool.get_ref(), claims.account_id()?).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Messages retrieved successfully",
        "messages": messages,
    })))
}

/// DELETE /api/messages/{message_id}
pub async fn delete_message(
    req: HttpRequest,
    path: web::Path<Uuid>,
    pool: web::Data<PgPool>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let claims = authenticated_claims(&req, pool.get_ref(), jwt_config.get_ref()).await?;
    let message_id = path.into_inner();

    store::remove_message(pool.get_ref(), claims.account_id()?, message_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Message deleted successfully"
    })))
}
