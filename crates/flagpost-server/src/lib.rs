//! Flagpost server library logic.

pub mod api;
pub mod config;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, put},
    Extension, Json, Router,
};
use flagpost_db::DbPool;
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: DbPool,
}

/// Startup failures while preparing the flag database. All are fatal.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Pool(#[from] flagpost_db::PoolError),

    #[error("failed to get database connection for initialization: {0}")]
    Connection(#[from] r2d2::Error),

    #[error(transparent)]
    Init(#[from] flagpost_db::InitError),
}

/// Opens the configured database file, creating and seeding the flag table
/// on first run.
///
/// Returns the pool together with the number of rows seeded (`0` when the
/// table already had rows).
///
/// # Errors
///
/// Returns `StorageError` if the file cannot be opened or initialized.
pub fn open_storage(
    database: &config::DatabaseConfig,
) -> Result<(DbPool, usize), StorageError> {
    let pool = flagpost_db::create_pool(&database.path, database.runtime_settings())?;
    let seeded = {
        let conn = pool.get()?;
        flagpost_db::initialize_schema(&conn)?
    };
    Ok((pool, seeded))
}

/// Maximum request body size (1 MiB).
const MAX_REQUEST_BODY_BYTES: usize = 1024 * 1024;

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/feature-flags", get(api::list_flags_handler))
        .route("/feature-flags/update", put(api::update_flag_handler))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
