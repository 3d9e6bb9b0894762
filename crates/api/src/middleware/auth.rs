//! Token validation.
//!
//! Bearer tokens arrive in the `X-Auth-Token` header and are checked against
//! the `tokens` collection. The checks form a strict priority chain - a
//! token past its hard refresh deadline must report as such even though it
//! is also expired, and an expired-but-refreshable token must never report
//! as unknown.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, StatusCode, request::Parts},
};
use chrono::Utc;
use thiserror::Error;

use ovenside_core::Email;

use crate::error::AppError;
use crate::models::{TokenRecord, collections};
use crate::state::AppState;
use crate::store::FileStore;

/// Header carrying the session token.
pub const AUTH_HEADER: &str = "x-auth-token";

/// Why a token was rejected.
///
/// The display strings double as the client-facing `message`; the variants
/// in declaration order mirror the validation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No token header, or an empty one.
    #[error("No token provided.")]
    MissingToken,
    /// No record for the token.
    #[error("Invalid token.")]
    InvalidToken,
    /// Past the hard refresh deadline; the token is permanently dead.
    #[error("Token has expired and is not extendable.")]
    NotExtendable,
    /// Past expiry but still inside the refresh window.
    #[error("Token expired.")]
    Expired,
    /// Live token, but the caller does not own the resource.
    #[error("Forbidden user.")]
    Forbidden,
}

impl AuthError {
    /// The HTTP status this rejection maps to.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Forbidden => StatusCode::FORBIDDEN,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

/// Extract the session token from request headers.
#[must_use]
pub fn token_header(headers: &HeaderMap) -> Option<&str> {
    headers.get(AUTH_HEADER).and_then(|value| value.to_str().ok())
}

/// Validate a token, optionally checking that it belongs to `expected_email`.
///
/// Returns the live token record on success.
///
/// # Errors
///
/// The first failing check in the priority chain, as [`AuthError`].
pub async fn validate_token(
    store: &FileStore,
    token: Option<&str>,
    expected_email: Option<&Email>,
) -> Result<TokenRecord, AuthError> {
    let token = token
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::MissingToken)?;

    let record: TokenRecord = store
        .silent()
        .read(collections::TOKENS, token)
        .await
        .map_err(|_| AuthError::InvalidToken)?;

    let now = Utc::now();

    if record.is_dead(now) {
        return Err(AuthError::NotExtendable);
    }

    if record.is_expired(now) {
        return Err(AuthError::Expired);
    }

    if let Some(expected) = expected_email
        && record.email != *expected
    {
        return Err(AuthError::Forbidden);
    }

    Ok(record)
}

/// Extractor that requires a live session token.
///
/// Rejects with the validator's status and reason. Handlers that also need
/// resource ownership call [`validate_token`] with the expected email
/// instead.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(session): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", session.email)
/// }
/// ```
pub struct RequireAuth(pub TokenRecord);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTH_HEADER)
            .and_then(|value| value.to_str().ok());

        let record = validate_token(state.store(), token, None).await?;
        Ok(Self(record))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::ErrorLog;

    async fn store_with_tokens() -> (tempfile::TempDir, FileStore) {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::create_dir_all(dir.path().join(collections::TOKENS))
            .await
            .unwrap();
        let errors = ErrorLog::new(dir.path().join("logs"));
        let store = FileStore::new(dir.path(), errors);
        (dir, store)
    }

    async fn seed(store: &FileStore, token: &str, expires_in: i64, refresh_validity: i64) {
        let record = TokenRecord {
            token: token.to_owned(),
            email: Email::parse("frank@example.com").unwrap(),
            expires_in,
            refresh_validity,
        };
        store
            .create(collections::TOKENS, token, &record)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn missing_token_is_reported_first() {
        let (_dir, store) = store_with_tokens().await;

        for token in [None, Some(""), Some("   ")] {
            let err = validate_token(&store, token, None).await.unwrap_err();
            assert_eq!(err, AuthError::MissingToken);
            assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[tokio::test]
    async fn unknown_token_is_invalid() {
        let (_dir, store) = store_with_tokens().await;

        let err = validate_token(&store, Some("doesNotExist123456ab"), None)
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::InvalidToken);
    }

    #[tokio::test]
    async fn dead_token_outranks_expired() {
        let (_dir, store) = store_with_tokens().await;
        let now = Utc::now().timestamp_millis();

        // Both expiry and refresh deadline in the past: the terminal state
        // must win.
        seed(&store, "deadTokenDeadToken12", now - 120_000, now - 60_000).await;

        let err = validate_token(&store, Some("deadTokenDeadToken12"), None)
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::NotExtendable);
    }

    #[tokio::test]
    async fn expired_inside_refresh_window_is_refreshable() {
        let (_dir, store) = store_with_tokens().await;
        let now = Utc::now().timestamp_millis();

        seed(&store, "staleTokenStaleToke1", now - 60_000, now + 60_000).await;

        let err = validate_token(&store, Some("staleTokenStaleToke1"), None)
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::Expired);
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn owner_mismatch_is_forbidden_not_unauthorized() {
        let (_dir, store) = store_with_tokens().await;
        let now = Utc::now().timestamp_millis();

        seed(&store, "liveTokenLiveToken12", now + 60_000, now + 120_000).await;

        let other = Email::parse("mallory@example.com").unwrap();
        let err = validate_token(&store, Some("liveTokenLiveToken12"), Some(&other))
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::Forbidden);
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn live_token_returns_its_record() {
        let (_dir, store) = store_with_tokens().await;
        let now = Utc::now().timestamp_millis();

        seed(&store, "liveTokenLiveToken12", now + 60_000, now + 120_000).await;

        let owner = Email::parse("frank@example.com").unwrap();
        let record = validate_token(&store, Some("liveTokenLiveToken12"), Some(&owner))
            .await
            .unwrap();
        assert_eq!(record.email, owner);
        assert_eq!(record.token, "liveTokenLiveToken12");
    }
}
