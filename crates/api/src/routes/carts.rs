//! Cart handlers.
//!
//! A cart is one record per user, keyed by email. The handlers enforce
//! at most one line per `menu_id`; the store does not.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Value, json};

use ovenside_core::Email;

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{CartItem, collections};
use crate::state::AppState;
use crate::store::{FileStore, StoreError};

/// Body of an add-to-cart request.
#[derive(Debug, Deserialize)]
pub struct AddPayload {
    #[serde(default)]
    pub menu_id: Option<String>,
    #[serde(default)]
    pub qty: Option<i64>,
}

/// Body of a line-adjustment request.
#[derive(Debug, Deserialize)]
pub struct AdjustPayload {
    #[serde(default)]
    pub action: Option<String>,
}

/// `?menu_id=` query naming a cart line.
#[derive(Debug, Deserialize)]
pub struct LineQuery {
    #[serde(default)]
    pub menu_id: Option<String>,
}

/// Direction of a line adjustment.
enum Adjust {
    Incr,
    Decr,
}

/// A user with no cart record yet has an empty cart.
pub(super) async fn read_cart(store: &FileStore, email: &Email) -> Result<Vec<CartItem>> {
    match store.silent().read(collections::CARTS, email.as_str()).await {
        Ok(cart) => Ok(cart),
        Err(StoreError::NotFound { .. }) => Ok(Vec::new()),
        Err(err) => Err(err.into()),
    }
}

/// Write the cart back, creating the record on first use.
async fn save_cart(store: &FileStore, email: &Email, cart: &[CartItem]) -> Result<()> {
    match store
        .silent()
        .update(collections::CARTS, email.as_str(), &cart)
        .await
    {
        Ok(()) => Ok(()),
        Err(StoreError::NotFound { .. }) => store
            .create(collections::CARTS, email.as_str(), &cart)
            .await
            .map_err(Into::into),
        Err(err) => Err(err.into()),
    }
}

/// Fetch the caller's cart.
pub async fn show(
    RequireAuth(session): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Value>> {
    let cart = read_cart(state.store(), &session.email).await?;
    Ok(Json(json!({ "data": cart })))
}

/// Put a menu item in the cart, or set the quantity of its existing line.
pub async fn add(
    RequireAuth(session): RequireAuth,
    State(state): State<AppState>,
    Json(payload): Json<AddPayload>,
) -> Result<Json<Value>> {
    let menu_id = payload
        .menu_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty());
    let qty = payload.qty.and_then(|q| u32::try_from(q).ok()).filter(|q| *q > 0);

    let (Some(menu_id), Some(qty)) = (menu_id, qty) else {
        return Err(AppError::missing_fields());
    };

    let menu = state
        .menu()
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let item = menu
        .iter()
        .find(|item| item.menu_id == menu_id)
        .ok_or_else(|| AppError::NotFound("Menu item not found.".to_owned()))?;

    let mut cart = read_cart(state.store(), &session.email).await?;

    if let Some(line) = cart.iter_mut().find(|line| line.menu_id == menu_id) {
        line.qty = qty;
    } else {
        cart.push(CartItem::from_menu(item, qty));
    }

    save_cart(state.store(), &session.email, &cart).await?;

    Ok(Json(json!({ "message": "Cart updated.", "cart": cart })))
}

/// Increment or decrement a cart line named in `?menu_id=`.
///
/// Decrementing a line to zero removes it.
pub async fn update(
    RequireAuth(session): RequireAuth,
    State(state): State<AppState>,
    Query(query): Query<LineQuery>,
    Json(payload): Json<AdjustPayload>,
) -> Result<Response> {
    let menu_id = query
        .menu_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty());
    let action = match payload.action.as_deref().map(str::trim) {
        Some("incr") => Some(Adjust::Incr),
        Some("decr") => Some(Adjust::Decr),
        _ => None,
    };

    let (Some(menu_id), Some(action)) = (menu_id, action) else {
        return Err(AppError::missing_fields());
    };

    let mut cart = read_cart(state.store(), &session.email).await?;

    let Some(index) = cart.iter().position(|line| line.menu_id == menu_id) else {
        // The current cart rides along so the client can resynchronize.
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({
                "message": "Cannot add to or remove from a non-existing item.",
                "cart": cart,
            })),
        )
            .into_response());
    };

    match action {
        Adjust::Incr => {
            if let Some(line) = cart.get_mut(index) {
                line.qty = line.qty.saturating_add(1);
            }
        }
        Adjust::Decr => {
            let emptied = cart.get_mut(index).map(|line| {
                line.qty = line.qty.saturating_sub(1);
                line.qty == 0
            });
            if emptied == Some(true) {
                cart.remove(index);
            }
        }
    }

    save_cart(state.store(), &session.email, &cart).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Cart updated.", "cart": cart })),
    )
        .into_response())
}

/// Remove the cart line named in `?menu_id=`.
pub async fn remove(
    RequireAuth(session): RequireAuth,
    State(state): State<AppState>,
    Query(query): Query<LineQuery>,
) -> Result<(StatusCode, Json<Value>)> {
    let menu_id = query
        .menu_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(AppError::missing_fields)?;

    let mut cart = read_cart(state.store(), &session.email).await?;

    let index = cart
        .iter()
        .position(|line| line.menu_id == menu_id)
        .ok_or_else(|| AppError::NotFound("Menu item not found in cart.".to_owned()))?;
    cart.remove(index);

    save_cart(state.store(), &session.email, &cart).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Cart updated.", "cart": cart })),
    ))
}
