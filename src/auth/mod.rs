/// Authentication module
///
/// Session token issuance/verification, password hashing, the sign-out
/// revocation set, and the session cookie contract.

mod claims;
mod jwt;
mod password;
mod revocation;
mod session_cookie;

pub use claims::Claims;
pub use jwt::issue_session_token;
pub use jwt::verify_session_token;
pub use password::hash_password;
pub use password::verify_password;
pub use revocation::is_token_revoked;
pub use revocation::revoke_session_token;
pub use session_cookie::clear_session_cookie;
pub use session_cookie::session_cookie;
pub use session_cookie::SESSION_COOKIE;

use actix_web::HttpRequest;
use sqlx::PgPool;

use crate::configuration::JwtSettings;
use crate::error::AppError;

/// Authenticate an API request from its session cookie.
///
/// API routes bypass the route guard's redirects, so each handler calls
/// this instead: missing cookie, bad signature, expiry, and revocation all
/// collapse into the same `InvalidToken` response.
pub async fn authenticated_claims(
    req: &HttpRequest,
    pool: &PgPool,
    config: &JwtSettings,
) -> Result<Claims, AppError> {
    let cookie = req.cookie(SESSION_COOKIE).ok_or(AppError::InvalidToken)?;
    let claims = verify_session_token(cookie.value(), config)?;

    if is_token_revoked(pool, &claims.jti).await? {
        tracing::warn!(account_id = %claims.sub, "Revoked token presented");
        return Err(AppError::InvalidToken);
    }

    Ok(claims)
}
