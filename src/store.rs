/// Credential store
///
/// One row per account plus the account's owned messages. Uniqueness of
/// username and email is enforced by the store's unique indexes;
/// registration goes through a single upsert so a concurrent duplicate
/// surfaces as a constraint conflict, not a lost race.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;

/// An account row. Deliberately not `Serialize`: response payloads are
/// built field by field so the password hash can never leak through a
/// default serialization.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub verification_code: String,
    pub code_expires_at: DateTime<Utc>,
    pub is_verified: bool,
    pub is_accepting: bool,
}

/// A message owned by an account. Has no identity outside its owner.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Create an unverified account, or refresh an existing unverified one.
///
/// Re-registering an email that is still unverified overwrites the password
/// hash, code, and expiry in place (a resend); the username is kept. A
/// verified account under that email, or a username collision, yields
/// `DuplicateAccount`. There is no separate existence check to race with.
pub async fn upsert_unverified(
    pool: &PgPool,
    username: &str,
    email: &str,
    password_hash: &str,
    verification_code: &str,
    code_expires_at: DateTime<Utc>,
) -> Result<Uuid, AppError> {
    let now = Utc::now();

    let row = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO accounts
            (id, username, email, password_hash, verification_code,
             code_expires_at, is_verified, is_accepting, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, FALSE, TRUE, $7, $7)
        ON CONFLICT (email) DO UPDATE
        SET password_hash = EXCLUDED.password_hash,
            verification_code = EXCLUDED.verification_code,
            code_expires_at = EXCLUDED.code_expires_at,
            updated_at = EXCLUDED.updated_at
        WHERE accounts.is_verified = FALSE
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(verification_code)
    .bind(code_expires_at)
    .bind(now)
    .fetch_optional(pool)
    .await?;

    // No row back means the conflicting account is already verified.
    row.ok_or(AppError::DuplicateAccount)
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Account>, AppError> {
    let account = sqlx::query_as::<_, Account>(
        r#"
        SELECT id, username, email, password_hash, verification_code,
               code_expires_at, is_verified, is_accepting
        FROM accounts
        WHERE email = $1
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(account)
}

pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<Account>, AppError> {
    let account = sqlx::query_as::<_, Account>(
        r#"
        SELECT id, username, email, password_hash, verification_code,
               code_expires_at, is_verified, is_accepting
        FROM accounts
        WHERE username = LOWER($1)
        "#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    Ok(account)
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Account>, AppError> {
    let account = sqlx::query_as::<_, Account>(
        r#"
        SELECT id, username, email, password_hash, verification_code,
               code_expires_at, is_verified, is_accepting
        FROM accounts
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(account)
}

/// Sign-in lookup: case-insensitive on username (stored lowercase), exact
/// on email.
pub async fn find_by_username_or_email(
    pool: &PgPool,
    identifier: &str,
) -> Result<Option<Account>, AppError> {
    let account = sqlx::query_as::<_, Account>(
        r#"
        SELECT id, username, email, password_hash, verification_code,
               code_expires_at, is_verified, is_accepting
        FROM accounts
        WHERE username = LOWER($1) OR email = $1
        "#,
    )
    .bind(identifier)
    .fetch_optional(pool)
    .await?;

    Ok(account)
}

pub async fn username_taken(pool: &PgPool, username: &str) -> Result<bool, AppError> {
    let taken = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM accounts WHERE username = LOWER($1))",
    )
    .bind(username)
    .fetch_one(pool)
    .await?;

    Ok(taken)
}

/// One-way verification transition. The verification code is retained
/// afterward; only the flag flips.
pub async fn mark_verified(pool: &PgPool, id: Uuid) -> Result<(), AppError> {
    let row = sqlx::query_scalar::<_, Uuid>(
        r#"
        UPDATE accounts
        SET is_verified = TRUE, updated_at = $2
        WHERE id = $1 AND is_verified = FALSE
        RETURNING id
        "#,
    )
    .bind(id)
    .bind(Utc::now())
    .fetch_optional(pool)
    .await?;

    match row {
        Some(_) => Ok(()),
        None => Err(AppError::AlreadyVerified),
    }
}

pub async fn set_acceptance(pool: &PgPool, id: Uuid, is_accepting: bool) -> Result<(), AppError> {
    let result = sqlx::query("UPDATE accounts SET is_accepting = $2, updated_at = $3 WHERE id = $1")
        .bind(id)
        .bind(is_accepting)
        .bind(Utc::now())
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User"));
    }
    Ok(())
}

pub async fn append_message(
    pool: &PgPool,
    account_id: Uuid,
    content: &str,
) -> Result<Uuid, AppError> {
    let message_id = Uuid::new_v4();

    sqlx::query("INSERT INTO messages (id, account_id, content, created_at) VALUES ($1, $2, $3, $4)")
        .bind(message_id)
        .bind(account_id)
        .bind(content)
        .bind(Utc::now())
        .execute(pool)
        .await?;

    Ok(message_id)
}

/// The owner's messages, newest first.
pub async fn messages_for(pool: &PgPool, account_id: Uuid) -> Result<Vec<Message>, AppError> {
    let messages = sqlx::query_as::<_, Message>(
        r#"
        SELECT id, content, created_at
        FROM messages
        WHERE account_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(account_id)
    .fetch_all(pool)
    .await?;

    Ok(messages)
}

pub async fn message_count(pool: &PgPool, account_id: Uuid) -> Result<i64, AppError> {
    let count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM messages WHERE account_id = $1")
            .bind(account_id)
            .fetch_one(pool)
            .await?;

    Ok(count)
}

/// Delete one of the owner's messages. Scoped to the owner so an account
/// can never delete another account's message by id.
pub async fn remove_message(
    pool: &PgPool,
    account_id: Uuid,
    message_id: Uuid,
) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM messages WHERE id = $1 AND account_id = $2")
        .bind(message_id)
        .bind(account_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Message"));
    }
    Ok(())
}
