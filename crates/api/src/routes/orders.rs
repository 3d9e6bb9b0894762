//! Order handlers: placement and checkout.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};

use ovenside_core::{Currency, OrderId, OrderState};

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{CartItem, Order, OrderReceipt, OrderRef, User, collections};
use crate::services::auth::random_string;
use crate::services::payment::CardDetails;
use crate::state::AppState;

/// Length of the random suffix of a freshly minted order id.
const ORDER_SUFFIX_LENGTH: usize = 10;

/// A value clients may send as either a JSON string or a number.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Numberish {
    Int(u64),
    Text(String),
}

/// Body of a checkout request: card fields plus the order to pay for.
#[derive(Debug, Deserialize)]
pub struct CheckoutPayload {
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub exp_month: Option<Numberish>,
    #[serde(default)]
    pub exp_year: Option<Numberish>,
    #[serde(default)]
    pub cvc: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub order_id: Option<String>,
}

/// Place an order: snapshot the cart into `orders/pending`.
///
/// The new order is recorded on the user before the cart is cleared; if
/// clearing fails the order still stands and the response says so with a
/// 206.
pub async fn place(
    RequireAuth(session): RequireAuth,
    State(state): State<AppState>,
) -> Result<Response> {
    let cart = super::carts::read_cart(state.store(), &session.email).await?;

    if cart.is_empty() {
        return Err(AppError::BadRequest("Cart is empty.".to_owned()));
    }

    let id = OrderId::from_parts(Utc::now(), &random_string(ORDER_SUFFIX_LENGTH))
        .map_err(|e| AppError::Internal(e.to_string()))?;
    let order = Order::from_cart(id.clone(), session.email.clone(), cart);

    state
        .store()
        .create(OrderState::Pending.collection(), id.as_str(), &order)
        .await?;

    let mut user: User = state
        .store()
        .read(collections::USERS, session.email.as_str())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    user.orders.push(OrderRef {
        order: id,
        state: OrderState::Pending,
    });
    state
        .store()
        .update(collections::USERS, session.email.as_str(), &user)
        .await?;

    let receipt = OrderReceipt::from(order);

    let cleared = state
        .store()
        .update(
            collections::CARTS,
            session.email.as_str(),
            &Vec::<CartItem>::new(),
        )
        .await;

    if cleared.is_err() {
        return Ok((
            StatusCode::PARTIAL_CONTENT,
            Json(json!({
                "message": "Order saved successfully, but the cart may still be filled.",
                "data": receipt,
            })),
        )
            .into_response());
    }

    Ok(Json(json!({ "message": "Order saved successfully.", "data": receipt })).into_response())
}

/// Pay for a pending order.
///
/// Card fields are tokenized and charged through the payment gateway with
/// the order id as the idempotency key, so a retried checkout cannot
/// double-charge. On success the confirmation mail is fire-and-forget,
/// the user's order reference is bumped, and the record moves from
/// `orders/pending` to `orders/processing`.
pub async fn checkout(
    RequireAuth(session): RequireAuth,
    State(state): State<AppState>,
    Json(payload): Json<CheckoutPayload>,
) -> Result<Json<Value>> {
    let order_id = payload
        .order_id
        .as_deref()
        .and_then(|id| OrderId::parse(id).ok());
    let card = card_fields(&payload);

    let (Some(order_id), Some(card)) = (order_id, card) else {
        return Err(AppError::missing_fields());
    };

    // An unparseable currency falls back to the configured default rather
    // than failing the charge.
    let currency = payload
        .currency
        .as_deref()
        .and_then(|c| Currency::parse(c).ok())
        .unwrap_or_else(|| state.config().payment.currency.clone());

    let order: Order = state
        .store()
        .silent()
        .read(OrderState::Pending.collection(), order_id.as_str())
        .await
        .map_err(|_| AppError::NotFound("Order does not exist.".to_owned()))?;

    let mut user: User = state
        .store()
        .silent()
        .read(collections::USERS, session.email.as_str())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let index = user.orders.iter().position(|r| r.order == order_id);
    let Some(index) = index.filter(|_| order.owner == session.email) else {
        return Err(AppError::Forbidden("Order does not belong to user.".to_owned()));
    };

    if user.orders.get(index).is_some_and(|r| r.state != OrderState::Pending) {
        return Err(AppError::BadRequest("Order already being processed.".to_owned()));
    }

    let card_token = state.payment().tokenize(&card).await?;
    state
        .payment()
        .charge(order.amount, &currency, &card_token.id, Some(order_id.as_str()))
        .await?;

    // Best-effort confirmation; a mail failure never fails the order.
    let mail = state.mail().clone();
    let to = session.email.clone();
    let confirmed = order_id.clone();
    tokio::spawn(async move {
        let body = format!(
            "Your payment has been received and your order <b>{confirmed}</b> is being \
             prepared. It should be delivered within the next 30 minutes."
        );
        if let Err(err) = mail.send(&to, "Payment successful.", &body).await {
            tracing::warn!(error = %err, order = %confirmed, "confirmation mail failed");
        }
    });

    if let Some(entry) = user.orders.get_mut(index) {
        entry.state = OrderState::Processing;
    }
    state
        .store()
        .update(collections::USERS, session.email.as_str(), &user)
        .await?;

    state
        .store()
        .move_or_copy(
            OrderState::Pending.collection(),
            OrderState::Processing.collection(),
            order_id.as_str(),
            true,
        )
        .await?;

    Ok(Json(json!({
        "message": "Thank you for your patronage. Your order is being processed and \
                    should be delivered within 30 minutes.",
    })))
}

/// Validate the card fields of a checkout payload.
fn card_fields(payload: &CheckoutPayload) -> Option<CardDetails> {
    let number = payload
        .number
        .as_deref()
        .map(str::trim)
        .filter(|n| n.len() == 16 && n.bytes().all(|b| b.is_ascii_digit()))?;

    let exp_month = match payload.exp_month {
        Some(Numberish::Int(n)) => format!("{n:02}"),
        Some(Numberish::Text(ref s)) => s.trim().to_owned(),
        None => return None,
    };
    let month_ok = exp_month.len() == 2
        && exp_month
            .parse::<u32>()
            .is_ok_and(|m| (1..=12).contains(&m));
    if !month_ok {
        return None;
    }

    let exp_year = match payload.exp_year {
        Some(Numberish::Int(n)) => n.to_string(),
        Some(Numberish::Text(ref s)) => s.trim().to_owned(),
        None => return None,
    };
    let year_ok = matches!(exp_year.len(), 2 | 4)
        && exp_year.bytes().all(|b| b.is_ascii_digit())
        && exp_year.parse::<u32>().is_ok_and(|y| y > 0);
    if !year_ok {
        return None;
    }

    let cvc = payload
        .cvc
        .as_deref()
        .map(str::trim)
        .filter(|c| c.parse::<u32>().is_ok_and(|n| n > 0))?;

    Some(CardDetails {
        number: number.to_owned(),
        exp_month,
        exp_year,
        cvc: cvc.to_owned(),
    })
}
