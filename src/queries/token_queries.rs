use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;

use crate::{error::Result, models::User, utils::token};

/// Mints a fresh bearer token for the user and stores its hash.
/// Returns the plaintext, which is never persisted.
pub async fn issue_token(pool: &PgPool, user_id: i32, ttl_days: i64) -> Result<String> {
    // No background job; expired rows are swept at issuance.
    purge_expired(pool).await?;

    let plaintext = token::generate_token();
    let expires_at = Some(Utc::now() + Duration::days(ttl_days));

    create_token(pool, user_id, &token::hash_token(&plaintext), expires_at).await?;

    Ok(plaintext)
}

pub async fn purge_expired(pool: &PgPool) -> Result<u64> {
    let result =
        sqlx::query("DELETE FROM access_tokens WHERE expires_at IS NOT NULL AND expires_at <= now()")
            .execute(pool)
            .await?;

    Ok(result.rows_affected())
}

pub async fn create_token(
    pool: &PgPool,
    user_id: i32,
    token_hash: &str,
    expires_at: Option<DateTime<Utc>>,
) -> Result<()> {
    sqlx::query("INSERT INTO access_tokens (user_id, token_hash, expires_at) VALUES ($1, $2, $3)")
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(pool)
        .await?;

    Ok(())
}

/// Resolves a token hash to its owning user, rejecting expired tokens.
pub async fn find_user_by_token(pool: &PgPool, token_hash: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        "SELECT u.*
         FROM users u
         JOIN access_tokens t ON t.user_id = u.id
         WHERE t.token_hash = $1
           AND (t.expires_at IS NULL OR t.expires_at > now())",
    )
    .bind(token_hash)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

pub async fn touch_last_used(pool: &PgPool, token_hash: &str) -> Result<()> {
    sqlx::query("UPDATE access_tokens SET last_used_at = now() WHERE token_hash = $1")
        .bind(token_hash)
        .execute(pool)
        .await?;

    Ok(())
}

/// Deletes the single token row for the presented token. Other sessions
/// of the same user keep their tokens.
pub async fn revoke_token(pool: &PgPool, token_hash: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM access_tokens WHERE token_hash = $1")
        .bind(token_hash)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
