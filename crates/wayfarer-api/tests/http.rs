use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use wayfarer_api::build_router;
use wayfarer_core::{AppConfig, AppState};
use wayfarer_media::MediaStore;

async fn test_app() -> (TempDir, Router) {
    let db = wayfarer_db::create_pool("sqlite::memory:", 1).await.unwrap();
    wayfarer_db::run_migrations(&db).await.unwrap();

    let uploads = TempDir::new().unwrap();
    let state = AppState {
        db,
        config: AppConfig {
            argon2_memory_kib: 1024,
            argon2_iterations: 1,
            ..AppConfig::dev_defaults("integration-test-secret")
        },
        media: Arc::new(MediaStore::new(uploads.path())),
    };
    (uploads, build_router().with_state(state))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn bare_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn register_and_login(app: &Router, email: &str, role: &str) -> String {
    let (status, _) = send(
        app,
        json_request(
            "POST",
            "/api/auth/register",
            None,
            &json!({
                "name": "Test User",
                "email": email,
                "password": "s3cret-pass",
                "role": role,
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            &json!({ "email": email, "password": "s3cret-pass" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

async fn create_event(app: &Router, token: &str, capacity: i64) -> i64 {
    let (status, body) = send(
        app,
        json_request(
            "POST",
            "/api/events",
            Some(token),
            &json!({
                "title": "Harbor Concert",
                "date": "2026-10-20",
                "time": "20:00:00",
                "location": "Dakar",
                "capacity": capacity,
                "price": 12.5,
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn register_login_me_flow() {
    let (_dir, app) = test_app().await;
    let token = register_and_login(&app, "flow@example.com", "VISITOR").await;

    for uri in ["/api/auth/me", "/api/users/me"] {
        let (status, body) = send(&app, bare_request("GET", uri, Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "flow@example.com");
        assert!(body.get("passwordHash").is_none());
        assert!(body.get("password_hash").is_none());
    }
}

#[tokio::test]
async fn me_without_token_is_unauthorized() {
    let (_dir, app) = test_app().await;
    let (status, body) = send(&app, bare_request("GET", "/api/auth/me", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = send(&app, bare_request("GET", "/api/auth/me", Some("forged"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_failures_share_one_body() {
    let (_dir, app) = test_app().await;
    register_and_login(&app, "real@example.com", "VISITOR").await;

    let (unknown_status, unknown_body) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            &json!({ "email": "nobody@example.com", "password": "p" }),
        ),
    )
    .await;
    let (wrong_status, wrong_body) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            &json!({ "email": "real@example.com", "password": "wrongpass" }),
        ),
    )
    .await;

    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_body, wrong_body);
    assert_eq!(unknown_body["message"], "Invalid credentials");
}

#[tokio::test]
async fn duplicate_registration_is_a_400() {
    let (_dir, app) = test_app().await;
    register_and_login(&app, "dup@example.com", "VISITOR").await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/register",
            None,
            &json!({
                "name": "Again",
                "email": "DUP@example.com",
                "password": "s3cret-pass",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email already exists");
}

#[tokio::test]
async fn event_lifecycle_with_ownership() {
    let (_dir, app) = test_app().await;
    let owner = register_and_login(&app, "owner@example.com", "ORGANIZER").await;
    let other = register_and_login(&app, "other@example.com", "ORGANIZER").await;
    let visitor = register_and_login(&app, "vis@example.com", "VISITOR").await;

    // Visitors cannot publish events.
    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/events",
            Some(&visitor),
            &json!({
                "title": "Nope",
                "date": "2026-10-20",
                "time": "20:00:00",
                "location": "Dakar",
                "capacity": 5,
                "price": 0.0,
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let event_id = create_event(&app, &owner, 40).await;

    let (status, body) = send(
        &app,
        bare_request("GET", &format!("/api/events/{event_id}"), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["availableCapacity"], 40);
    assert_eq!(body["status"], "UPCOMING");

    let (status, body) = send(&app, bare_request("GET", "/api/events/location/DAK", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = send(&app, bare_request("GET", "/api/events/organizer", Some(&owner))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    // A different organizer cannot touch the event.
    let update = json!({
        "title": "Harbor Concert",
        "date": "2026-10-20",
        "time": "20:00:00",
        "location": "Dakar",
        "capacity": 60,
        "price": 12.5,
    });
    let (status, _) = send(
        &app,
        json_request("PUT", &format!("/api/events/{event_id}"), Some(&other), &update),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        json_request("PUT", &format!("/api/events/{event_id}"), Some(&owner), &update),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["capacity"], 60);

    let (status, _) = send(
        &app,
        bare_request("DELETE", &format!("/api/events/{event_id}"), Some(&owner)),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app,
        bare_request("GET", &format!("/api/events/{event_id}"), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reservation_lifecycle_over_http() {
    let (_dir, app) = test_app().await;
    let organizer = register_and_login(&app, "org@example.com", "ORGANIZER").await;
    let visitor = register_and_login(&app, "guest@example.com", "VISITOR").await;
    let event_id = create_event(&app, &organizer, 3).await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            &format!("/api/reservations/event/{event_id}"),
            Some(&visitor),
            &json!({ "numberOfTickets": 2 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "CONFIRMED");
    let reservation_id = body["id"].as_i64().unwrap();

    // Over capacity now: 2 taken of 3, asking 2 more.
    let (status, body) = send(
        &app,
        json_request(
            "POST",
            &format!("/api/reservations/event/{event_id}"),
            Some(&visitor),
            &json!({ "numberOfTickets": 2 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    // Capacity below the confirmed sum is a conflict.
    let (status, _) = send(
        &app,
        json_request(
            "PUT",
            &format!("/api/events/{event_id}"),
            Some(&organizer),
            &json!({
                "title": "Harbor Concert",
                "date": "2026-10-20",
                "time": "20:00:00",
                "location": "Dakar",
                "capacity": 1,
                "price": 12.5,
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Deleting an event with confirmed seats is blocked.
    let (status, _) = send(
        &app,
        bare_request("DELETE", &format!("/api/events/{event_id}"), Some(&organizer)),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Only the event's organizer sees its reservations.
    let (status, _) = send(
        &app,
        bare_request("GET", &format!("/api/reservations/event/{event_id}"), Some(&visitor)),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        bare_request("GET", &format!("/api/reservations/event/{event_id}"), Some(&organizer)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    // Cancellation is owner-only and idempotent.
    let (status, _) = send(
        &app,
        bare_request("DELETE", &format!("/api/reservations/{reservation_id}"), Some(&organizer)),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    for _ in 0..2 {
        let (status, _) = send(
            &app,
            bare_request("DELETE", &format!("/api/reservations/{reservation_id}"), Some(&visitor)),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    let (status, body) = send(
        &app,
        bare_request("GET", "/api/reservations/user", Some(&visitor)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let listing = body.as_array().unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0]["status"], "CANCELLED");
}

#[tokio::test]
async fn destination_crud_is_organizer_gated() {
    let (_dir, app) = test_app().await;
    let organizer = register_and_login(&app, "org@example.com", "ORGANIZER").await;
    let visitor = register_and_login(&app, "vis@example.com", "VISITOR").await;

    let payload = json!({
        "name": "Gorée Island",
        "description": "Historic island",
        "highlights": [{ "name": "House of Slaves", "description": "Memorial" }],
        "gallery": ["/api/uploads/seed/goree.jpg"],
    });

    let (status, _) = send(
        &app,
        json_request("POST", "/api/destinations", Some(&visitor), &payload),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        json_request("POST", "/api/destinations", Some(&organizer), &payload),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["slug"], "gor-e-island");
    let id = body["id"].as_i64().unwrap();

    let (status, body) = send(&app, bare_request("GET", "/api/destinations/gor-e-island", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["highlights"].as_array().unwrap().len(), 1);

    let (status, _) = send(
        &app,
        json_request(
            "PUT",
            &format!("/api/destinations/{id}"),
            Some(&organizer),
            &json!({ "name": "Gorée", "slug": "goree" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        bare_request("DELETE", &format!("/api/destinations/{id}"), Some(&organizer)),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, bare_request("GET", "/api/destinations/goree", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn upload_serve_and_traversal_defense() {
    let (_dir, app) = test_app().await;
    let token = register_and_login(&app, "up@example.com", "VISITOR").await;

    let payload: &[u8] = b"\x89PNG\r\n\x1a\n1x1-test-pixel-payload";
    let boundary = "wayfarer-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"eventId\"\r\n\r\n42\r\n\
             --{boundary}\r\nContent-Disposition: form-data; name=\"image\"; \
             filename=\"photo.png\"\r\nContent-Type: image/png\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(payload);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    let request = Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body))
        .unwrap();
    let (status, response) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);

    let image_url = response["imageUrl"].as_str().unwrap().to_string();
    assert!(image_url.starts_with("/api/uploads/42/"));
    assert!(image_url.ends_with(".png"));

    let served = app
        .clone()
        .oneshot(bare_request("GET", &image_url, None))
        .await
        .unwrap();
    assert_eq!(served.status(), StatusCode::OK);
    assert_eq!(
        served.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/png"
    );
    let served_bytes = to_bytes(served.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&served_bytes[..], payload);

    // Encoded traversal decodes to `../etc/passwd` and must be rejected.
    let (status, _) = send(
        &app,
        bare_request("GET", "/api/uploads/..%2Fetc%2Fpasswd", None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, bare_request("GET", "/api/uploads/missing.png", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Delete through the API, then the file is gone.
    let file_path = image_url.strip_prefix("/api/uploads/").unwrap();
    let (status, body) = send(
        &app,
        bare_request("DELETE", &format!("/api/upload/{file_path}"), Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, _) = send(&app, bare_request("GET", &image_url, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
