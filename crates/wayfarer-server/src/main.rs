use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use clap::Parser;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("wayfarer=info,tower_http=debug")),
        )
        .init();

    let args = cli::Args::parse();
    let mut config = config::Config::load(&args.config)?;
    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
    }

    ensure_data_dirs(&config);

    let db = wayfarer_db::create_pool(&config.database.url, config.database.max_connections)
        .await
        .with_context(|| format!("opening database {}", config.database.url))?;
    wayfarer_db::run_migrations(&db).await?;

    if args.no_seed {
        tracing::info!("destination seeding skipped");
    } else {
        wayfarer_core::seed::seed_destinations(&db)
            .await
            .map_err(|e| anyhow::anyhow!("seeding destinations: {e}"))?;
    }

    let media = Arc::new(wayfarer_media::MediaStore::new(config.upload.dir.clone()));
    let state = wayfarer_core::AppState {
        db,
        config: wayfarer_core::AppConfig {
            jwt_secret: config.auth.jwt_secret.clone(),
            jwt_expiry_seconds: config.auth.jwt_expiry_seconds,
            upload_dir: config.upload.dir.clone(),
            frontend_url: config.server.frontend_url.clone(),
            argon2_memory_kib: config.auth.argon2_memory_kib,
            argon2_iterations: config.auth.argon2_iterations,
        },
        media,
    };

    let cors = cors_layer(&config.server.frontend_url)?;
    let app = wayfarer_api::build_router()
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_address)
        .await
        .with_context(|| format!("binding {}", config.server.bind_address))?;

    print_startup_banner(&config);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            println!();
            tracing::info!("shutting down");
        })
        .await?;

    Ok(())
}

fn cors_layer(frontend_url: &str) -> Result<CorsLayer> {
    let origin: HeaderValue = frontend_url
        .parse()
        .with_context(|| format!("invalid frontend URL {frontend_url}"))?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]))
}

/// Create the upload root and the database parent directory before anything
/// tries to open them.
fn ensure_data_dirs(config: &config::Config) {
    if let Err(e) = std::fs::create_dir_all(&config.upload.dir) {
        tracing::warn!("could not create upload directory '{}': {e}", config.upload.dir);
    }

    if let Some(db_path) = config
        .database
        .url
        .strip_prefix("sqlite://")
        .and_then(|s| s.split('?').next())
    {
        if let Some(parent) = std::path::Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                let _ = std::fs::create_dir_all(parent);
            }
        }
    }
}

fn print_startup_banner(config: &config::Config) {
    println!();
    println!("  ==========================================");
    println!("   Wayfarer -- events & destinations server");
    println!("  ==========================================");
    println!();
    println!("  Listening:  http://{}", config.server.bind_address);
    println!("  Database:   {}", config.database.url);
    println!("  Uploads:    {}", config.upload.dir);
    println!("  CORS:       {}", config.server.frontend_url);
    println!();
}
