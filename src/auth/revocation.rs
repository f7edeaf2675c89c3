/// Session token revocation set
///
/// Sign-out records the token's hashed `jti` so the token stops working
/// before its natural expiry. Entries are keyed by SHA-256 hash (never the
/// raw id) and carry the token's own expiry, after which the row is inert.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use sqlx::PgPool;

use crate::auth::claims::Claims;
use crate::error::AppError;

fn hash_token_id(jti: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(jti.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Add a token to the revocation set. Idempotent: revoking twice is a no-op.
pub async fn revoke_session_token(pool: &PgPool, claims: &Claims) -> Result<(), AppError> {
    let token_hash = hash_token_id(&claims.jti);
    let expires_at =
        DateTime::<Utc>::from_timestamp(claims.exp, 0).unwrap_or_else(Utc::now);

    sqlx::query(
        r#"
        INSERT INTO revoked_tokens (token_hash, revoked_at, expires_at)
        VALUES ($1, $2, $3)
        ON CONFLICT (token_hash) DO NOTHING
        "#,
    )
    .bind(token_hash)
    .bind(Utc::now())
    .bind(expires_at)
    .execute(pool)
    .await?;

    tracing::info!(account_id = %claims.sub, "Session token revoked");
    Ok(())
}

/// Check whether a token id has been revoked.
pub async fn is_token_revoked(pool: &PgPool, jti: &str) -> Result<bool, AppError> {
    let token_hash = hash_token_id(jti);

    let revoked = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM revoked_tokens WHERE token_hash = $1)",
    )
    .bind(token_hash)
    .fetch_one(pool)
    .await?;

    Ok(revoked)
}
