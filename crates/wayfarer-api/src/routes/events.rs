use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use wayfarer_core::events::{self, EventDetails, EventInput};
use wayfarer_core::AppState;

use crate::error::ApiError;
use crate::middleware::{AuthUser, OrganizerUser};

pub fn event_json(details: &EventDetails) -> Value {
    let e = &details.event;
    json!({
        "id": e.id,
        "title": e.title,
        "description": e.description,
        "date": e.date.to_string(),
        "time": e.time.format("%H:%M:%S").to_string(),
        "startDate": e.start_date.map(|d| d.to_rfc3339()),
        "endDate": e.end_date.map(|d| d.to_rfc3339()),
        "location": e.location,
        "capacity": e.capacity,
        "availableCapacity": details.available_capacity,
        "price": e.price,
        "category": e.category,
        "imageUrl": e.image_url,
        "status": e.status,
        "organizerId": e.organizer_id,
        "destinationId": e.destination_id,
        "destinationName": details.destination_name,
        "createdAt": e.created_at.to_rfc3339(),
    })
}

fn list_json(details: &[EventDetails]) -> Value {
    let body: Vec<Value> = details.iter().map(event_json).collect();
    json!(body)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    pub location: String,
    pub capacity: i64,
    pub price: f64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub destination_id: Option<i64>,
}

impl From<EventRequest> for EventInput {
    fn from(body: EventRequest) -> Self {
        EventInput {
            title: body.title,
            description: body.description,
            date: body.date,
            time: body.time,
            start_date: body.start_date,
            end_date: body.end_date,
            location: body.location,
            capacity: body.capacity,
            price: body.price,
            category: body.category,
            image_url: body.image_url,
            status: body.status,
            destination_id: body.destination_id,
        }
    }
}

pub async fn create(
    State(state): State<AppState>,
    OrganizerUser(user): OrganizerUser,
    Json(body): Json<EventRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let details = events::create(&state.db, &user, &body.into()).await?;
    Ok((StatusCode::CREATED, Json(event_json(&details))))
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let details = events::list(&state.db).await?;
    Ok(Json(list_json(&details)))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let details = events::get(&state.db, id).await?;
    Ok(Json(event_json(&details)))
}

pub async fn search_by_location(
    State(state): State<AppState>,
    Path(query): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let details = events::search_by_location(&state.db, &query).await?;
    Ok(Json(list_json(&details)))
}

pub async fn list_mine(
    State(state): State<AppState>,
    OrganizerUser(user): OrganizerUser,
) -> Result<Json<Value>, ApiError> {
    let details = events::list_by_organizer(&state.db, &user).await?;
    Ok(Json(list_json(&details)))
}

pub async fn update(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Json(body): Json<EventRequest>,
) -> Result<Json<Value>, ApiError> {
    let details = events::update(&state.db, &user, id, &body.into()).await?;
    Ok(Json(event_json(&details)))
}

pub async fn delete(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    events::delete(&state.db, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
