//! Server-error logging middleware.
//!
//! Validation and auth rejections are expected traffic; a 5xx is not.
//! Every response in the server-error range is appended to the error log
//! so unexpected failures leave a durable trace beyond the process output.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::state::AppState;

/// Record 5xx responses in the error log.
pub async fn log_server_errors(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();

    let response = next.run(request).await;

    if response.status().is_server_error() {
        state
            .errors()
            .append(&format!("{method} {path} responded {}", response.status()))
            .await;
    }

    response
}
