use sqlx::PgPool;
use uuid::Uuid;

use crate::models::User;

/// Insert a new user. A unique violation on email is surfaced to the caller
/// as the sqlx error; it is the only uniqueness check (no select-then-insert).
pub async fn create(pool: &PgPool, email: &str, password_hash: &str) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "INSERT INTO users (id, email, password) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(email)
    .bind(password_hash)
    .fetch_one(pool)
    .await
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn update_password(
    pool: &PgPool,
    id: Uuid,
    password_hash: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET password = $2, updated_at = now() WHERE id = $1")
        .bind(id)
        .bind(password_hash)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn set_two_factor_secret(
    pool: &PgPool,
    id: Uuid,
    secret: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET \"2fa_secret\" = $2, updated_at = now() WHERE id = $1")
        .bind(id)
        .bind(secret)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn activate_two_factor(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET \"2fa_activated\" = true, updated_at = now() WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Disable 2FA: flag and secret are cleared together so re-enrollment
/// always starts from a fresh secret.
pub async fn clear_two_factor(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE users SET \"2fa_activated\" = false, \"2fa_secret\" = NULL, updated_at = now()
         WHERE id = $1",
    )
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}
