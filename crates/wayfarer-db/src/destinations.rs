use crate::{DbError, DbPool};
use serde::{Deserialize, Serialize};

/// Embedded highlight, stored inside the `highlights` JSON column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highlight {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DestinationRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub history: Option<String>,
    pub image: Option<String>,
    pub slug: String,
    pub highlights: serde_json::Value,
    pub gallery: serde_json::Value,
}

impl DestinationRow {
    pub fn highlights(&self) -> Vec<Highlight> {
        serde_json::from_value(self.highlights.clone()).unwrap_or_default()
    }

    pub fn gallery(&self) -> Vec<String> {
        serde_json::from_value(self.gallery.clone()).unwrap_or_default()
    }
}

const COLUMNS: &str = "id, name, description, history, image, slug, highlights, gallery";

pub async fn create_destination(
    pool: &DbPool,
    name: &str,
    description: Option<&str>,
    history: Option<&str>,
    image: Option<&str>,
    slug: &str,
    highlights: &[Highlight],
    gallery: &[String],
) -> Result<DestinationRow, DbError> {
    let row = sqlx::query_as::<_, DestinationRow>(&format!(
        "INSERT INTO destinations (name, description, history, image, slug, highlights, gallery)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         RETURNING {COLUMNS}"
    ))
    .bind(name)
    .bind(description)
    .bind(history)
    .bind(image)
    .bind(slug)
    .bind(serde_json::to_value(highlights).unwrap_or_default())
    .bind(serde_json::to_value(gallery).unwrap_or_default())
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Insert-or-update keyed by slug. Used by startup seeding so repeated boots
/// never duplicate rows.
pub async fn upsert_destination_by_slug(
    pool: &DbPool,
    name: &str,
    description: Option<&str>,
    history: Option<&str>,
    image: Option<&str>,
    slug: &str,
    highlights: &[Highlight],
    gallery: &[String],
) -> Result<DestinationRow, DbError> {
    let row = sqlx::query_as::<_, DestinationRow>(&format!(
        "INSERT INTO destinations (name, description, history, image, slug, highlights, gallery)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT (slug) DO UPDATE SET
            name = ?1,
            description = ?2,
            history = ?3,
            image = ?4,
            highlights = ?6,
            gallery = ?7
         RETURNING {COLUMNS}"
    ))
    .bind(name)
    .bind(description)
    .bind(history)
    .bind(image)
    .bind(slug)
    .bind(serde_json::to_value(highlights).unwrap_or_default())
    .bind(serde_json::to_value(gallery).unwrap_or_default())
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn list_destinations(pool: &DbPool) -> Result<Vec<DestinationRow>, DbError> {
    let rows = sqlx::query_as::<_, DestinationRow>(&format!(
        "SELECT {COLUMNS} FROM destinations ORDER BY name"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get_destination_by_slug(
    pool: &DbPool,
    slug: &str,
) -> Result<Option<DestinationRow>, DbError> {
    let row = sqlx::query_as::<_, DestinationRow>(&format!(
        "SELECT {COLUMNS} FROM destinations WHERE slug = ?1"
    ))
    .bind(slug)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn get_destination_by_id(
    pool: &DbPool,
    id: i64,
) -> Result<Option<DestinationRow>, DbError> {
    let row = sqlx::query_as::<_, DestinationRow>(&format!(
        "SELECT {COLUMNS} FROM destinations WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

#[allow(clippy::too_many_arguments)]
pub async fn update_destination(
    pool: &DbPool,
    id: i64,
    name: &str,
    description: Option<&str>,
    history: Option<&str>,
    image: Option<&str>,
    slug: &str,
    highlights: &[Highlight],
    gallery: &[String],
) -> Result<DestinationRow, DbError> {
    let row = sqlx::query_as::<_, DestinationRow>(&format!(
        "UPDATE destinations
         SET name = ?2, description = ?3, history = ?4, image = ?5, slug = ?6,
             highlights = ?7, gallery = ?8
         WHERE id = ?1
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(name)
    .bind(description)
    .bind(history)
    .bind(image)
    .bind(slug)
    .bind(serde_json::to_value(highlights).unwrap_or_default())
    .bind(serde_json::to_value(gallery).unwrap_or_default())
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;
    Ok(row)
}

pub async fn delete_destination(pool: &DbPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM destinations WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
