//! Menu handler.

use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::error::{AppError, Result};
use crate::state::AppState;

/// List the menu. Unauthenticated; browsing precedes signup.
pub async fn show(State(state): State<AppState>) -> Result<Json<Value>> {
    let menu = state
        .menu()
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(json!({ "data": &*menu })))
}
