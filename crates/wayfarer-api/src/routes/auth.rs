use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use wayfarer_core::identity::{self, RegisterInput};
use wayfarer_core::AppState;
use wayfarer_db::users::UserRow;

use crate::error::ApiError;
use crate::middleware::AuthUser;

pub fn user_json(user: &UserRow) -> Value {
    json!({
        "id": user.id,
        "name": user.name,
        "email": user.email,
        "phone": user.phone,
        "role": user.role,
        "createdAt": user.created_at.to_rfc3339(),
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<Value>, ApiError> {
    let user = identity::register(
        &state.db,
        &state.config,
        RegisterInput {
            name: body.name,
            email: body.email,
            password: body.password,
            phone: body.phone,
            requested_role: body.role,
        },
    )
    .await?;
    Ok(Json(user_json(&user)))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let outcome = identity::login(&state.db, &state.config, &body.email, &body.password).await?;
    Ok(Json(json!({
        "token": outcome.token,
        "user": user_json(&outcome.user),
    })))
}

pub async fn me(auth: AuthUser) -> Json<Value> {
    Json(user_json(&auth.0))
}
