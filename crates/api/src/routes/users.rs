//! User account handlers.

use axum::{
    Json,
    extract::{Query, State},
    http::HeaderMap,
};
use serde::Deserialize;
use serde_json::{Value, json};

use ovenside_core::Email;

use crate::error::{AppError, Result};
use crate::middleware::{RequireAuth, token_header, validate_token};
use crate::models::{User, UserProfile, collections};
use crate::services::auth::hash_password;
use crate::state::AppState;
use crate::store::StoreError;

/// Minimum length of a first or last name, after trimming.
const MIN_NAME_LENGTH: usize = 5;

/// Minimum length of a password.
const MIN_PASSWORD_LENGTH: usize = 6;

/// Body of a signup or profile update request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// `?email=` query for the ownership-checked operations.
#[derive(Debug, Deserialize)]
pub struct OwnerQuery {
    #[serde(default)]
    pub email: Option<String>,
}

fn name_field(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| v.len() >= MIN_NAME_LENGTH)
        .map(str::to_owned)
}

fn address_field(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

fn password_field(value: Option<&str>) -> Option<&str> {
    value.filter(|v| v.trim().len() >= MIN_PASSWORD_LENGTH)
}

/// Create a new account.
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<UserPayload>,
) -> Result<Json<Value>> {
    let (Some(first_name), Some(last_name), Some(address), Some(password)) = (
        name_field(payload.first_name.as_deref()),
        name_field(payload.last_name.as_deref()),
        address_field(payload.address.as_deref()),
        password_field(payload.password.as_deref()),
    ) else {
        return Err(AppError::missing_fields());
    };

    let email = payload
        .email
        .as_deref()
        .and_then(|e| Email::parse(e).ok())
        .ok_or_else(AppError::missing_fields)?;

    let password =
        hash_password(password).map_err(|e| AppError::Internal(e.to_string()))?;

    let user = User {
        first_name,
        last_name,
        email,
        address,
        password,
        tokens: Vec::new(),
        orders: Vec::new(),
    };

    match state
        .store()
        .create(collections::USERS, user.email.as_str(), &user)
        .await
    {
        Ok(()) => {}
        Err(StoreError::AlreadyExists { .. }) => {
            return Err(AppError::AlreadyExists("User already exists.".to_owned()));
        }
        Err(err) => return Err(err.into()),
    }

    Ok(Json(json!({ "data": UserProfile::from(&user) })))
}

/// Fetch the caller's own profile.
pub async fn profile(
    RequireAuth(session): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Value>> {
    let user: User = state
        .store()
        .silent()
        .read(collections::USERS, session.email.as_str())
        .await
        .map_err(|_| AppError::NotFound("User not found.".to_owned()))?;

    Ok(Json(json!({ "data": UserProfile::from(&user) })))
}

/// Update profile fields of the account named in `?email=`.
pub async fn update(
    State(state): State<AppState>,
    Query(query): Query<OwnerQuery>,
    headers: HeaderMap,
    Json(payload): Json<UserPayload>,
) -> Result<Json<Value>> {
    let email = query.email.as_deref().and_then(|e| Email::parse(e).ok());
    validate_token(state.store(), token_header(&headers), email.as_ref()).await?;

    let first_name = name_field(payload.first_name.as_deref());
    let last_name = name_field(payload.last_name.as_deref());
    let address = address_field(payload.address.as_deref());
    let password = password_field(payload.password.as_deref());

    let has_field =
        first_name.is_some() || last_name.is_some() || address.is_some() || password.is_some();
    let (Some(email), true) = (email, has_field) else {
        return Err(AppError::Validation(
            "At least one field must be filled appropriately.".to_owned(),
        ));
    };

    let mut user: User = state
        .store()
        .silent()
        .read(collections::USERS, email.as_str())
        .await
        .map_err(|_| AppError::BadRequest("User does not exist.".to_owned()))?;

    if let Some(first_name) = first_name {
        user.first_name = first_name;
    }
    if let Some(last_name) = last_name {
        user.last_name = last_name;
    }
    if let Some(address) = address {
        user.address = address;
    }
    if let Some(password) = password {
        user.password =
            hash_password(password).map_err(|e| AppError::Internal(e.to_string()))?;
    }

    state
        .store()
        .update(collections::USERS, email.as_str(), &user)
        .await?;

    Ok(Json(json!({ "data": UserProfile::from(&user) })))
}

/// Delete the account named in `?email=` along with its session data.
///
/// Session tokens and the cart are removed first; a failure there does not
/// abort the deletion, it only downgrades the confirmation message.
pub async fn remove(
    State(state): State<AppState>,
    Query(query): Query<OwnerQuery>,
    headers: HeaderMap,
) -> Result<Json<Value>> {
    let email = query.email.as_deref().and_then(|e| Email::parse(e).ok());
    validate_token(state.store(), token_header(&headers), email.as_ref()).await?;

    let email = email.ok_or_else(AppError::missing_fields)?;

    let user: User = state
        .store()
        .silent()
        .read(collections::USERS, email.as_str())
        .await
        .map_err(|_| AppError::BadRequest("User does not seem to exist.".to_owned()))?;

    let mut tokens_deleted = 0usize;
    for token in &user.tokens {
        if state
            .store()
            .delete(collections::TOKENS, token)
            .await
            .is_ok()
        {
            tokens_deleted += 1;
        }
    }

    state
        .store()
        .delete(collections::USERS, email.as_str())
        .await?;

    // The cart may never have been created.
    let _ = state
        .store()
        .silent()
        .delete(collections::CARTS, email.as_str())
        .await;

    let message = if tokens_deleted == user.tokens.len() {
        "User deleted."
    } else {
        "User deleted, but some of the user's items may not have been deleted."
    };

    Ok(Json(json!({ "message": message })))
}
