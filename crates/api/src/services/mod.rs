//! Outbound collaborators and auth primitives.
//!
//! The API consumes these over narrow call contracts; their providers are
//! external systems and stay out of scope here.

pub mod auth;
pub mod mail;
pub mod payment;
pub mod templates;

pub use mail::MailClient;
pub use payment::PaymentClient;
pub use templates::TemplateStore;

use thiserror::Error;

/// Errors from an outbound collaborator (payment gateway, mail provider).
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The collaborator returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to build a request or parse a response.
    #[error("Parse error: {0}")]
    Parse(String),
}
