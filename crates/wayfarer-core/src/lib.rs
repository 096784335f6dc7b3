pub mod auth;
pub mod error;
pub mod events;
pub mod identity;
pub mod reservations;
pub mod seed;

use std::sync::Arc;

use wayfarer_db::DbPool;
use wayfarer_media::MediaStore;

/// Closed role set. Arbitrary role strings are rejected at the boundary;
/// ADMIN exists but is never granted through registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Visitor,
    Organizer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Visitor => "VISITOR",
            Role::Organizer => "ORGANIZER",
            Role::Admin => "ADMIN",
        }
    }

    pub fn parse(value: &str) -> Option<Role> {
        match value.trim().to_ascii_uppercase().as_str() {
            "VISITOR" => Some(Role::Visitor),
            "ORGANIZER" => Some(Role::Organizer),
            "ADMIN" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lowercased, hyphenated, ASCII-only identifier derived from a display name.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_was_hyphen = true;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: AppConfig,
    pub media: Arc<MediaStore>,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Symmetric secret for HS256 token signing. Read-only after startup.
    pub jwt_secret: String,
    pub jwt_expiry_seconds: u64,
    pub upload_dir: String,
    /// CORS origin for the browser frontend.
    pub frontend_url: String,
    /// Argon2id work factor, tunable so verification stays slow enough.
    pub argon2_memory_kib: u32,
    pub argon2_iterations: u32,
}

impl AppConfig {
    pub fn dev_defaults(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            jwt_expiry_seconds: 24 * 60 * 60,
            upload_dir: "uploads".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            argon2_memory_kib: 19_456,
            argon2_iterations: 2,
        }
    }
}
