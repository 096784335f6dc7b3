use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use wayfarer_core::AppState;

use crate::error::ApiError;
use crate::middleware::AuthUser;

/// Multipart upload: file under the `image` field, optional `eventId` text
/// field selecting the per-event partition.
pub async fn upload(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut image: Option<(String, Vec<u8>)> = None;
    let mut event_id: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("image") => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("failed to read upload: {e}")))?;
                image = Some((filename, bytes.to_vec()));
            }
            Some("eventId") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("failed to read eventId: {e}")))?;
                if !value.trim().is_empty() {
                    event_id = Some(value.trim().to_string());
                }
            }
            _ => {}
        }
    }

    let (filename, bytes) =
        image.ok_or_else(|| ApiError::BadRequest("missing `image` field".into()))?;
    let url = state
        .media
        .store(&bytes, &filename, event_id.as_deref())
        .await?;

    Ok(Json(json!({ "imageUrl": url })))
}

pub async fn delete(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(file_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.media.delete(&file_id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "File deleted",
    })))
}

async fn serve(state: &AppState, relative: &str) -> Result<Response, ApiError> {
    let file = state.media.load(relative).await?;
    let disposition = format!(
        "inline; filename=\"{}\"",
        file.filename.replace(['"', '\\'], "")
    );
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, file.content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.bytes,
    )
        .into_response())
}

pub async fn serve_file(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<Response, ApiError> {
    serve(&state, &file_id).await
}

pub async fn serve_event_file(
    State(state): State<AppState>,
    Path((event_id, file_id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    serve(&state, &format!("{event_id}/{file_id}")).await
}
