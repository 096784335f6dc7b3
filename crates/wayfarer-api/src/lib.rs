pub mod error;
pub mod middleware;
pub mod routes;

use axum::routing::{delete, get, post};
use axum::Router;
use wayfarer_core::AppState;

/// The full API surface. State is attached by the caller.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(routes::auth::register))
        .route("/api/auth/login", post(routes::auth::login))
        .route("/api/auth/me", get(routes::auth::me))
        .route("/api/users/me", get(routes::auth::me))
        .route(
            "/api/destinations",
            get(routes::destinations::list).post(routes::destinations::create),
        )
        // Reads address destinations by slug; writes address them by id.
        .route(
            "/api/destinations/{key}",
            get(routes::destinations::get_by_slug)
                .put(routes::destinations::update)
                .delete(routes::destinations::delete),
        )
        .route("/api/events", get(routes::events::list).post(routes::events::create))
        .route("/api/events/organizer", get(routes::events::list_mine))
        .route("/api/events/location/{query}", get(routes::events::search_by_location))
        .route(
            "/api/events/{id}",
            get(routes::events::get)
                .put(routes::events::update)
                .delete(routes::events::delete),
        )
        .route(
            "/api/reservations/event/{id}",
            post(routes::reservations::create).get(routes::reservations::list_for_event),
        )
        .route("/api/reservations/user", get(routes::reservations::list_mine))
        .route("/api/reservations/{id}", delete(routes::reservations::cancel))
        .route("/api/upload", post(routes::uploads::upload))
        .route("/api/upload/{*file_id}", delete(routes::uploads::delete))
        .route("/api/uploads/{file_id}", get(routes::uploads::serve_file))
        .route(
            "/api/uploads/{event_id}/{file_id}",
            get(routes::uploads::serve_event_file),
        )
}
