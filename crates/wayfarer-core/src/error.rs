use thiserror::Error;
use wayfarer_db::DbError;

/// Service-level error kinds. The HTTP layer owns the mapping to status
/// codes; services only ever raise one of these.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{0}")]
    Validation(String),
    #[error("Email already exists")]
    EmailExists,
    #[error("Invalid credentials")]
    BadCredentials,
    #[error("Authentication required")]
    Unauthenticated,
    #[error("Access denied")]
    Forbidden,
    #[error("Resource not found")]
    NotFound,
    #[error("Not enough tickets available for this event")]
    CapacityExceeded,
    #[error("Capacity cannot drop below the number of confirmed tickets")]
    CapacityConflict,
    #[error("Event still has confirmed reservations")]
    DeleteConflict,
    #[error("The request conflicted with concurrent updates, please retry")]
    Conflict,
    #[error("database error")]
    Database(DbError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<DbError> for CoreError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound => CoreError::NotFound,
            other => CoreError::Database(other),
        }
    }
}
