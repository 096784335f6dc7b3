use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use wayfarer_core::error::CoreError;
use wayfarer_core::{identity, AppState, Role};
use wayfarer_db::users::UserRow;

use crate::error::ApiError;

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())?
        .strip_prefix("Bearer ")
}

/// Authenticated principal. The only place tokens are parsed; handlers
/// downstream just see the resolved user row.
pub struct AuthUser(pub UserRow);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(ApiError::Core(CoreError::Unauthenticated))?;
        let user = identity::current_user(&state.db, &state.config, token).await?;
        Ok(AuthUser(user))
    }
}

/// Authenticated principal holding the ORGANIZER role (admins pass too).
pub struct OrganizerUser(pub UserRow);

impl FromRequestParts<AppState> for OrganizerUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        identity::require_role(&user, Role::Organizer)?;
        Ok(OrganizerUser(user))
    }
}
