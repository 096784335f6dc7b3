use crate::{DbError, DbPool};
use chrono::{DateTime, Utc};

pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// User row without the password hash. The hash never rides along on this
/// type, so it cannot leak into API responses by accident.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

/// User row including the password hash, for credential checks only.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserAuthRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

pub async fn create_user(
    pool: &DbPool,
    name: &str,
    email: &str,
    phone: Option<&str>,
    role: &str,
    password_hash: &str,
) -> Result<UserRow, DbError> {
    let normalized_email = normalize_email(email);
    let row = sqlx::query_as::<_, UserRow>(
        "INSERT INTO users (name, email, phone, role, password_hash)
         VALUES (?1, ?2, ?3, ?4, ?5)
         RETURNING id, name, email, phone, role, created_at",
    )
    .bind(name)
    .bind(normalized_email)
    .bind(phone)
    .bind(role)
    .bind(password_hash)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn get_user_by_id(pool: &DbPool, id: i64) -> Result<Option<UserRow>, DbError> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, name, email, phone, role, created_at FROM users WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn get_user_by_email(pool: &DbPool, email: &str) -> Result<Option<UserRow>, DbError> {
    let normalized_email = normalize_email(email);
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, name, email, phone, role, created_at
         FROM users WHERE lower(email) = ?1",
    )
    .bind(normalized_email)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn get_user_auth_by_email(
    pool: &DbPool,
    email: &str,
) -> Result<Option<UserAuthRow>, DbError> {
    let normalized_email = normalize_email(email);
    let row = sqlx::query_as::<_, UserAuthRow>(
        "SELECT id, name, email, phone, role, password_hash, created_at
         FROM users WHERE lower(email) = ?1",
    )
    .bind(normalized_email)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn email_exists(pool: &DbPool, email: &str) -> Result<bool, DbError> {
    let normalized_email = normalize_email(email);
    let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM users WHERE lower(email) = ?1")
        .bind(normalized_email)
        .fetch_optional(pool)
        .await?;
    Ok(row.is_some())
}

pub async fn update_user_role(pool: &DbPool, id: i64, role: &str) -> Result<UserRow, DbError> {
    let row = sqlx::query_as::<_, UserRow>(
        "UPDATE users SET role = ?2
         WHERE id = ?1
         RETURNING id, name, email, phone, role, created_at",
    )
    .bind(id)
    .bind(role)
    .fetch_one(pool)
    .await?;
    Ok(row)
}
