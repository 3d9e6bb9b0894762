//! HTTP route handlers for the ordering API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /                - HTML shell
//! GET    /health          - Liveness check
//! GET    /health/ready    - Readiness check
//!
//! # Users
//! POST   /api/users       - Create an account
//! GET    /api/users       - Fetch the caller's profile
//! PUT    /api/users?email= - Update profile fields
//! DELETE /api/users?email= - Delete the account and its session data
//!
//! # Tokens
//! POST   /api/tokens      - Log in (mint a session token)
//! PUT    /api/tokens      - Refresh the session
//! DELETE /api/tokens      - Log out
//!
//! # Menu
//! GET    /api/menu        - List menu items
//!
//! # Carts
//! GET    /api/carts       - Fetch the caller's cart
//! POST   /api/carts       - Put an item in the cart
//! PUT    /api/carts?menu_id= - Increment or decrement a line
//! DELETE /api/carts?menu_id= - Remove a line
//!
//! # Orders
//! GET    /api/orders      - Place an order from the cart
//! POST   /api/orders      - Pay for a pending order
//! ```
//!
//! Authenticated endpoints read the session token from `X-Auth-Token`.
//! A request for an unknown path, or for a known path with an unsupported
//! method, is answered with a uniform 404 JSON body; the latter switches
//! to a 405 when `strict_methods` is configured.

pub mod carts;
pub mod home;
pub mod menu;
pub mod orders;
pub mod tokens;
pub mod users;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;

use crate::middleware::{log_server_errors, request_id_middleware};
use crate::state::AppState;

/// The uniform body for requests that cannot be routed.
const UNROUTABLE_MESSAGE: &str = "Request could not be processed.";

/// Create the `/api` routes router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/users",
            get(users::profile)
                .post(users::signup)
                .put(users::update)
                .delete(users::remove)
                .fallback(unsupported_method),
        )
        .route(
            "/tokens",
            post(tokens::login)
                .put(tokens::refresh)
                .delete(tokens::logout)
                .fallback(unsupported_method),
        )
        .route("/menu", get(menu::show).fallback(unsupported_method))
        .route(
            "/carts",
            get(carts::show)
                .post(carts::add)
                .put(carts::update)
                .delete(carts::remove)
                .fallback(unsupported_method),
        )
        .route(
            "/orders",
            get(orders::place)
                .post(orders::checkout)
                .fallback(unsupported_method),
        )
}

/// Create the full application router over `state`.
///
/// The binary wraps this with transport-level layers (tracing, static
/// assets, trailing-slash normalization); tests drive it directly.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home::home))
        .route("/health", get(home::health))
        .route("/health/ready", get(home::readiness))
        .nest("/api", api_routes())
        .fallback(not_found)
        .layer(from_fn_with_state(state.clone(), log_server_errors))
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Fallback for unknown paths.
async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "message": UNROUTABLE_MESSAGE })),
    )
        .into_response()
}

/// Fallback for known paths hit with an unsupported method.
///
/// The legacy behavior is a uniform 404, indistinguishable from an unknown
/// path; `strict_methods` switches to the standard 405.
async fn unsupported_method(State(state): State<AppState>) -> Response {
    let status = if state.config().strict_methods {
        StatusCode::METHOD_NOT_ALLOWED
    } else {
        StatusCode::NOT_FOUND
    };

    (status, Json(json!({ "message": UNROUTABLE_MESSAGE }))).into_response()
}
