/// Session token signing and verification
///
/// Tokens are HS256-signed with the process-wide secret and carry identity
/// plus verification claims. Verification is stateless; the revocation set
/// is consulted separately at the boundary.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::Claims;
use crate::configuration::JwtSettings;
use crate::error::AppError;

/// Issue a session token for an account.
///
/// `verified` reflects the account's verification status at issuance; an
/// unverified account can hold a token, the route guard keeps it on the
/// verification page.
pub fn issue_session_token(
    account_id: Uuid,
    email: &str,
    username: &str,
    verified: bool,
    config: &JwtSettings,
) -> Result<String, AppError> {
    let claims = Claims::new(
        account_id,
        email.to_string(),
        username.to_string(),
        verified,
        config.token_expiry_seconds,
        config.issuer.clone(),
    );

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| {
        tracing::error!("Session token signing failed: {}", e);
        AppError::InvalidToken
    })
}

/// Verify a session token's signature, expiry, and issuer.
pub fn verify_session_token(token: &str, config: &JwtSettings) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.issuer]);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::warn!("Session token rejected: {}", e);
        AppError::InvalidToken
    })
}
