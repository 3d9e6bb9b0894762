//! HTML shell and health endpoints.

use axum::{
    extract::State,
    http::StatusCode,
    response::Html,
};

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Serve the HTML shell from the template collaborator.
///
/// Template merging happens client-side against the JSON API; the server
/// only hands out the shell.
pub async fn home(State(state): State<AppState>) -> Result<Html<String>> {
    let content = state
        .templates()
        .get("index.html")
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Html(content))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies the record store's data root is reachable before returning OK.
/// Returns 503 Service Unavailable otherwise.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match tokio::fs::metadata(state.store().root()).await {
        Ok(meta) if meta.is_dir() => StatusCode::OK,
        _ => StatusCode::SERVICE_UNAVAILABLE,
    }
}
