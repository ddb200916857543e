use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::PasswordResetToken;

/// Insert or replace the single reset token for a user.
///
/// The `user_id` unique constraint makes this one atomic statement; a
/// concurrent request simply overwrites the other's token (last writer
/// wins), never leaving two live rows for the same user.
pub async fn upsert(
    pool: &PgPool,
    user_id: Uuid,
    token: &str,
    token_expiry: DateTime<Utc>,
) -> Result<PasswordResetToken, sqlx::Error> {
    sqlx::query_as::<_, PasswordResetToken>(
        "INSERT INTO password_reset_token (id, user_id, token, token_expiry)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (user_id) DO UPDATE
         SET token = EXCLUDED.token,
             token_expiry = EXCLUDED.token_expiry,
             updated_at = now()
         RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(user_id)
    .bind(token)
    .bind(token_expiry)
    .fetch_one(pool)
    .await
}

pub async fn find_by_token(
    pool: &PgPool,
    token: &str,
) -> Result<Option<PasswordResetToken>, sqlx::Error> {
    sqlx::query_as::<_, PasswordResetToken>("SELECT * FROM password_reset_token WHERE token = $1")
        .bind(token)
        .fetch_optional(pool)
        .await
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM password_reset_token WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
