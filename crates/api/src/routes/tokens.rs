//! Session token handlers: login, refresh, logout.

use std::time::Duration;

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};

use ovenside_core::Email;

use crate::error::{AppError, Result};
use crate::middleware::{AuthError, RequireAuth, token_header, validate_token};
use crate::models::{TokenReceipt, TokenRecord, User, collections};
use crate::services::auth::{mint_token, verify_password};
use crate::state::AppState;

/// Minimum length of a password.
const MIN_PASSWORD_LENGTH: usize = 6;

/// Body of a login request.
#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Body of a refresh request.
#[derive(Debug, Deserialize)]
pub struct RefreshPayload {
    #[serde(default)]
    pub extend: Option<bool>,
}

fn millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

/// Log in: verify credentials and mint a session token.
///
/// The response carries the token value and its expiry instant only; the
/// owner and the refresh deadline stay server-side.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<Value>> {
    let email = payload.email.as_deref().and_then(|e| Email::parse(e).ok());
    let password = payload
        .password
        .as_deref()
        .filter(|p| p.trim().len() >= MIN_PASSWORD_LENGTH);

    let (Some(email), Some(password)) = (email, password) else {
        return Err(AppError::missing_fields());
    };

    // A missing account and a bad password answer identically.
    let mut user: User = state
        .store()
        .silent()
        .read(collections::USERS, email.as_str())
        .await
        .map_err(|_| AppError::Unauthorized("Invalid email or password.".to_owned()))?;

    if !verify_password(password, &user.password) {
        return Err(AppError::Unauthorized("Invalid email or password.".to_owned()));
    }

    let now = Utc::now().timestamp_millis();
    let record = TokenRecord {
        token: mint_token(),
        email,
        expires_in: now.saturating_add(millis(state.config().session_validity)),
        refresh_validity: now.saturating_add(millis(state.config().refresh_validity)),
    };

    state
        .store()
        .create(collections::TOKENS, &record.token, &record)
        .await?;

    user.tokens.push(record.token.clone());
    state
        .store()
        .update(collections::USERS, record.email.as_str(), &user)
        .await?;

    Ok(Json(json!({ "data": TokenReceipt::from(&record) })))
}

/// Refresh the session: push the token's expiry forward.
///
/// Accepts a live token or one that has expired but is still inside its
/// refresh window; a token past the hard deadline is rejected for good.
/// The new expiry never exceeds the refresh deadline.
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<RefreshPayload>,
) -> Result<(StatusCode, Json<Value>)> {
    let token = token_header(&headers);

    let mut record = match validate_token(state.store(), token, None).await {
        Ok(record) => record,
        // Expired means present, known, and inside the refresh window.
        Err(AuthError::Expired) => {
            let token = token.map(str::trim).unwrap_or_default();
            state
                .store()
                .silent()
                .read(collections::TOKENS, token)
                .await?
        }
        Err(err) => return Err(err.into()),
    };

    if payload.extend != Some(true) {
        return Err(AppError::missing_fields());
    }

    let now = Utc::now().timestamp_millis();
    record.expires_in = now
        .saturating_add(millis(state.config().session_validity))
        .min(record.refresh_validity);

    state
        .store()
        .update(collections::TOKENS, &record.token, &record)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "data": TokenReceipt::from(&record) })),
    ))
}

/// Log out: delete the session token and its back-reference on the user.
pub async fn logout(
    RequireAuth(session): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Value>> {
    state
        .store()
        .delete(collections::TOKENS, &session.token)
        .await?;

    let mut user: User = state
        .store()
        .read(collections::USERS, session.email.as_str())
        .await?;

    user.tokens.retain(|token| *token != session.token);
    state
        .store()
        .update(collections::USERS, session.email.as_str(), &user)
        .await?;

    Ok(Json(json!({ "message": "Token deleted." })))
}
