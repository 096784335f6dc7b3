use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use wayfarer_core::{reservations, AppState};
use wayfarer_db::reservations::ReservationRow;

use crate::error::ApiError;
use crate::middleware::AuthUser;

fn reservation_json(row: &ReservationRow) -> Value {
    json!({
        "id": row.id,
        "userId": row.user_id,
        "eventId": row.event_id,
        "numberOfTickets": row.tickets,
        "status": row.status,
        "createdAt": row.created_at.to_rfc3339(),
    })
}

fn list_json(rows: &[ReservationRow]) -> Value {
    let body: Vec<Value> = rows.iter().map(reservation_json).collect();
    json!(body)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReserveRequest {
    #[serde(default = "default_tickets")]
    pub number_of_tickets: i64,
}

fn default_tickets() -> i64 {
    1
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(event_id): Path<i64>,
    Json(body): Json<ReserveRequest>,
) -> Result<Json<Value>, ApiError> {
    let row = reservations::reserve(&state.db, &user, event_id, body.number_of_tickets).await?;
    Ok(Json(reservation_json(&row)))
}

pub async fn list_mine(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Value>, ApiError> {
    let rows = reservations::by_user(&state.db, &user).await?;
    Ok(Json(list_json(&rows)))
}

pub async fn list_for_event(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(event_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let rows = reservations::by_event(&state.db, &user, event_id).await?;
    Ok(Json(list_json(&rows)))
}

pub async fn cancel(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    reservations::cancel(&state.db, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
