//! Feature-flag API handlers.

use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Extension, Json},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use flagpost_flags::{list_flags, set_enabled, FeatureFlag, FlagError, FlagSelector};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

const FETCH_FAILED: &str = "Failed to fetch feature flags";
const UPDATE_FAILED: &str = "Failed to update feature flag";
const ID_NOT_FOUND: &str = "Feature flag with given ID not found";
const NAME_NOT_FOUND: &str = "Feature flag with given name not found";
const MISSING_SELECTOR: &str = "Please provide either 'id' or 'name' to update the feature flag";
const UPDATED: &str = "Feature flag updated successfully";

/// Errors returned to API clients as `{"error": <message>}`.
///
/// Messages are client-facing; storage details are logged by the handler
/// and never placed here.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

/// Response body for `GET /feature-flags`.
#[derive(Debug, Serialize, Deserialize)]
pub struct FeatureFlagsResponse {
    /// Every flag, in ID order.
    #[serde(rename = "featureFlags")]
    pub feature_flags: Vec<FeatureFlag>,
}

/// Request body for `PUT /feature-flags/update`.
#[derive(Debug, Deserialize)]
pub struct UpdateFlagRequest {
    /// ID of the flag to update. Takes precedence over `name`.
    pub id: Option<i64>,
    /// Name of the flag(s) to update when no `id` is given.
    pub name: Option<String>,
    /// The new state.
    pub enabled: bool,
}

impl UpdateFlagRequest {
    /// Picks the rows to update: `id` wins over `name`.
    ///
    /// Presence is explicit, so `id: 0` is a real (if unmatched) ID. An
    /// empty `name` never names a row and counts as absent.
    pub fn selector(&self) -> Option<FlagSelector> {
        if let Some(id) = self.id {
            return Some(FlagSelector::Id(id));
        }
        self.name
            .as_deref()
            .filter(|name| !name.is_empty())
            .map(|name| FlagSelector::Name(name.to_string()))
    }
}

/// Response body for a successful update.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Human-readable confirmation.
    pub message: String,
}

/// Runs `f` on a pooled connection inside the blocking thread pool.
///
/// Any failure (checkout, query, or a panicked task) comes back as a
/// description for the log.
async fn with_connection<T, F>(state: Arc<AppState>, f: F) -> Result<T, String>
where
    F: FnOnce(&Connection) -> Result<T, FlagError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let conn = state
            .pool
            .get()
            .map_err(|e| format!("db connection failed: {}", e))?;
        f(&conn).map_err(|e| e.to_string())
    })
    .await
    .map_err(|e| format!("task join error: {}", e))?
}

/// Handler for `GET /feature-flags`.
pub async fn list_flags_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<FeatureFlagsResponse>, ApiError> {
    let feature_flags = with_connection(state, list_flags)
        .await
        .map_err(|detail| {
            tracing::error!(error = %detail, "failed to fetch feature flags");
            ApiError::InternalServerError(FETCH_FAILED.to_string())
        })?;

    Ok(Json(FeatureFlagsResponse { feature_flags }))
}

/// Handler for `PUT /feature-flags/update`.
///
/// Sets `enabled` on the flag chosen by `id`, or on every flag named `name`
/// when no `id` is given. The body is validated before storage is touched.
pub async fn update_flag_handler(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<UpdateFlagRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        ApiError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    })?;

    let selector = request
        .selector()
        .ok_or_else(|| ApiError::BadRequest(MISSING_SELECTOR.to_string()))?;
    let enabled = request.enabled;

    let task_selector = selector.clone();
    let changed = with_connection(state, move |conn| {
        set_enabled(conn, &task_selector, enabled)
    })
    .await
    .map_err(|detail| {
        tracing::error!(error = %detail, %selector, "failed to update feature flag");
        ApiError::InternalServerError(UPDATE_FAILED.to_string())
    })?;

    if changed == 0 {
        let message = match &selector {
            FlagSelector::Id(_) => ID_NOT_FOUND,
            FlagSelector::Name(_) => NAME_NOT_FOUND,
        };
        return Err(ApiError::NotFound(message.to_string()));
    }

    tracing::info!(%selector, enabled, rows = changed, "feature flag updated");

    Ok(Json(MessageResponse {
        message: UPDATED.to_string(),
    }))
}
