use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use wayfarer_core::error::CoreError;
use wayfarer_media::MediaError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found")]
    NotFound,
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Core(core) => match core {
                CoreError::Validation(_)
                | CoreError::EmailExists
                | CoreError::CapacityExceeded => StatusCode::BAD_REQUEST,
                CoreError::BadCredentials | CoreError::Unauthenticated => {
                    StatusCode::UNAUTHORIZED
                }
                CoreError::Forbidden => StatusCode::FORBIDDEN,
                CoreError::NotFound => StatusCode::NOT_FOUND,
                CoreError::CapacityConflict
                | CoreError::DeleteConflict
                | CoreError::Conflict => StatusCode::CONFLICT,
                CoreError::Database(_) | CoreError::Internal(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Internals are logged here and never leak into the body.
        let message = match &self {
            ApiError::Core(CoreError::Database(e)) => {
                tracing::error!("database error: {e}");
                "Internal server error".to_string()
            }
            ApiError::Core(CoreError::Internal(msg)) => {
                tracing::error!("internal error: {msg}");
                "Internal server error".to_string()
            }
            ApiError::Internal(err) => {
                tracing::error!("internal error: {err:#}");
                "Internal server error".to_string()
            }
            ApiError::NotFound => "Resource not found".to_string(),
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::Core(core) => core.to_string(),
        };

        let body = json!({
            "success": false,
            "message": message,
        });

        (status, Json(body)).into_response()
    }
}

impl From<MediaError> for ApiError {
    fn from(e: MediaError) -> Self {
        match e {
            MediaError::NotFound(_) => ApiError::NotFound,
            MediaError::BadPath(path) => ApiError::BadRequest(format!("invalid path: {path}")),
            MediaError::InvalidFilename => ApiError::BadRequest("invalid filename".into()),
            MediaError::Io(e) => ApiError::Internal(anyhow::anyhow!(e)),
        }
    }
}

impl From<wayfarer_db::DbError> for ApiError {
    fn from(e: wayfarer_db::DbError) -> Self {
        ApiError::Core(e.into())
    }
}
