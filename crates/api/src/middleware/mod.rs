//! HTTP middleware and request authentication.

pub mod auth;
pub mod logging;
pub mod request_id;

pub use auth::{AUTH_HEADER, AuthError, RequireAuth, token_header, validate_token};
pub use logging::log_server_errors;
pub use request_id::request_id_middleware;
