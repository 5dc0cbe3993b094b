//! # lostfound-server
//!
//! HTTP API for a school lost-and-found registry.
//!
//! This binary provides:
//! - **Item registry** partitioned by building floor, with search and
//!   cross-floor moves
//! - **Notice board** managed by the admin
//! - **Admin auth**: static credential login issuing short-lived JWTs;
//!   every mutating route requires one
//! - **Image uploads** stored on disk and served read-only under `/uploads`
//! - **REST API** (axum) with a strict CORS allow-list

mod api;
mod auth;
mod config;
mod error;
mod upload_store;

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use lostfound_store::Database;

use crate::api::AppState;
use crate::config::ServerConfig;
use crate::upload_store::UploadStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,lostfound_server=debug")),
        )
        .init();

    info!(
        "Starting lost-and-found API server v{}",
        env!("CARGO_PKG_VERSION")
    );

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(
        addr = %config.http_addr,
        uploads = %config.upload_dir.display(),
        cors_allow_all = config.cors_allow_all,
        "Loaded configuration"
    );

    if config.jwt_secret == config::DEV_JWT_SECRET {
        warn!("JWT_SECRET not set, using development default");
    }
    if config.admin_password == config::DEV_ADMIN_PASSWORD {
        warn!("ADMIN_PW not set, using development default");
    }

    // -----------------------------------------------------------------------
    // 3. Initialize subsystems
    // -----------------------------------------------------------------------

    // Document database (platform data dir unless DB_PATH is set)
    let db = match &config.db_path {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            Database::open_at(path)?
        }
        None => Database::new()?,
    };

    // Upload store (creates directory if missing)
    let uploads = Arc::new(
        UploadStore::new(config.upload_dir.clone(), config.max_upload_size).await?,
    );

    // Application state for the HTTP API
    let app_state = AppState {
        db: Arc::new(Mutex::new(db)),
        uploads,
        config: Arc::new(config.clone()),
    };

    // -----------------------------------------------------------------------
    // 4. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    // tokio::select! ensures that if either the HTTP server or a shutdown
    // signal arrives, we exit cleanly.
    tokio::select! {
        result = api::serve(app_state, config.http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
