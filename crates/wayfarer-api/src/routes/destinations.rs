use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use wayfarer_core::{slugify, AppState};
use wayfarer_db::destinations::{self, DestinationRow, Highlight};

use crate::error::ApiError;
use crate::middleware::OrganizerUser;

fn destination_json(dest: &DestinationRow) -> Value {
    json!({
        "id": dest.id,
        "name": dest.name,
        "description": dest.description,
        "history": dest.history,
        "image": dest.image,
        "slug": dest.slug,
        "highlights": dest.highlights(),
        "gallery": dest.gallery(),
    })
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let rows = destinations::list_destinations(&state.db).await?;
    let body: Vec<Value> = rows.iter().map(destination_json).collect();
    Ok(Json(json!(body)))
}

pub async fn get_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let dest = destinations::get_destination_by_slug(&state.db, &slug)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(destination_json(&dest)))
}

#[derive(Deserialize)]
pub struct DestinationRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub history: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub highlights: Vec<Highlight>,
    #[serde(default)]
    pub gallery: Vec<String>,
}

impl DestinationRequest {
    fn validated_slug(&self) -> Result<String, ApiError> {
        if self.name.trim().is_empty() {
            return Err(ApiError::BadRequest("Name is required".into()));
        }
        let slug = match &self.slug {
            Some(explicit) if !explicit.trim().is_empty() => slugify(explicit),
            _ => slugify(&self.name),
        };
        if slug.is_empty() {
            return Err(ApiError::BadRequest("Cannot derive a slug from name".into()));
        }
        Ok(slug)
    }
}

pub async fn create(
    State(state): State<AppState>,
    OrganizerUser(_user): OrganizerUser,
    Json(body): Json<DestinationRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let slug = body.validated_slug()?;
    let dest = destinations::create_destination(
        &state.db,
        body.name.trim(),
        body.description.as_deref(),
        body.history.as_deref(),
        body.image.as_deref(),
        &slug,
        &body.highlights,
        &body.gallery,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(destination_json(&dest))))
}

pub async fn update(
    State(state): State<AppState>,
    OrganizerUser(_user): OrganizerUser,
    Path(id): Path<i64>,
    Json(body): Json<DestinationRequest>,
) -> Result<Json<Value>, ApiError> {
    let slug = body.validated_slug()?;
    let dest = destinations::update_destination(
        &state.db,
        id,
        body.name.trim(),
        body.description.as_deref(),
        body.history.as_deref(),
        body.image.as_deref(),
        &slug,
        &body.highlights,
        &body.gallery,
    )
    .await?;
    Ok(Json(destination_json(&dest)))
}

pub async fn delete(
    State(state): State<AppState>,
    OrganizerUser(_user): OrganizerUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    destinations::delete_destination(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
