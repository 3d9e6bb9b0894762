//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `PAYMENT_SECRET_KEY` - Payment gateway secret key
//! - `MAIL_API_KEY` - Mail provider API key
//! - `MAIL_DOMAIN` - Mail provider sending domain
//!
//! ## Optional
//! - `OVENSIDE_HOST` - Bind address (default: 127.0.0.1)
//! - `OVENSIDE_PORT` - Listen port (default: 3000)
//! - `OVENSIDE_DATA_DIR` - Record store root (default: .data)
//! - `OVENSIDE_LOG_DIR` - Error log root (default: .logs)
//! - `OVENSIDE_PUBLIC_DIR` - Static asset directory (default: public)
//! - `OVENSIDE_TEMPLATES_DIR` - HTML template directory (default: templates)
//! - `OVENSIDE_SESSION_VALIDITY_MINS` - Token lifetime (default: 60)
//! - `OVENSIDE_REFRESH_VALIDITY_MINS` - Hard refresh deadline (default: 1440)
//! - `OVENSIDE_STRICT_METHODS` - Respond 405 instead of the legacy 404 for
//!   known paths hit with an unsupported method (default: false)
//! - `OVENSIDE_LOG_ROTATION_MINS` - Error log rotation interval (default: 1440)
//! - `PAYMENT_BASE_URL` - Payment gateway base URL (default: Stripe)
//! - `PAYMENT_CURRENCY` - Default charge currency (default: usd)
//! - `MAIL_BASE_URL` - Mail provider base URL (default: Mailgun)
//! - `MAIL_SENDER` - From address for outbound mail (default: no-reply@<domain>)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use ovenside_core::Currency;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Inconsistent configuration: {0}")]
    Inconsistent(String),
}

/// API application configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Root directory of the record store (one subdirectory per collection)
    pub data_dir: PathBuf,
    /// Root directory for error logs and their rotated archives
    pub log_dir: PathBuf,
    /// Directory served under `/public`
    pub public_dir: PathBuf,
    /// Directory the template collaborator reads from
    pub templates_dir: PathBuf,
    /// How long a freshly minted or refreshed token stays valid
    pub session_validity: Duration,
    /// How long after minting a token may still be refreshed
    pub refresh_validity: Duration,
    /// Respond 405 for unsupported methods on known paths instead of the
    /// legacy uniform 404
    pub strict_methods: bool,
    /// Interval between error log rotations
    pub log_rotation: Duration,
    /// Payment gateway configuration
    pub payment: PaymentConfig,
    /// Mail provider configuration
    pub mail: MailConfig,
}

/// Payment gateway configuration.
///
/// Implements `Debug` manually to redact the secret key.
#[derive(Clone)]
pub struct PaymentConfig {
    /// Gateway base URL
    pub base_url: Url,
    /// Gateway secret key
    pub secret_key: SecretString,
    /// Default charge currency when the client sends none
    pub currency: Currency,
}

impl std::fmt::Debug for PaymentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentConfig")
            .field("base_url", &self.base_url.as_str())
            .field("secret_key", &"[REDACTED]")
            .field("currency", &self.currency)
            .finish()
    }
}

/// Mail provider configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct MailConfig {
    /// Provider base URL
    pub base_url: Url,
    /// Provider API key
    pub api_key: SecretString,
    /// Sending domain
    pub domain: String,
    /// From address for outbound mail
    pub sender: String,
}

impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"[REDACTED]")
            .field("domain", &self.domain)
            .field("sender", &self.sender)
            .finish()
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid,
    /// or if the refresh window is shorter than the session lifetime.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("OVENSIDE_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("OVENSIDE_HOST".to_owned(), e.to_string()))?;
        let port = get_env_or_default("OVENSIDE_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("OVENSIDE_PORT".to_owned(), e.to_string()))?;

        let data_dir = PathBuf::from(get_env_or_default("OVENSIDE_DATA_DIR", ".data"));
        let log_dir = PathBuf::from(get_env_or_default("OVENSIDE_LOG_DIR", ".logs"));
        let public_dir = PathBuf::from(get_env_or_default("OVENSIDE_PUBLIC_DIR", "public"));
        let templates_dir = PathBuf::from(get_env_or_default("OVENSIDE_TEMPLATES_DIR", "templates"));

        let session_validity = get_minutes("OVENSIDE_SESSION_VALIDITY_MINS", 60)?;
        let refresh_validity = get_minutes("OVENSIDE_REFRESH_VALIDITY_MINS", 24 * 60)?;
        validate_windows(session_validity, refresh_validity)?;

        let strict_methods = get_env_or_default("OVENSIDE_STRICT_METHODS", "false")
            .parse::<bool>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("OVENSIDE_STRICT_METHODS".to_owned(), e.to_string())
            })?;

        let log_rotation = get_minutes("OVENSIDE_LOG_ROTATION_MINS", 24 * 60)?;

        Ok(Self {
            host,
            port,
            data_dir,
            log_dir,
            public_dir,
            templates_dir,
            session_validity,
            refresh_validity,
            strict_methods,
            log_rotation,
            payment: PaymentConfig::from_env()?,
            mail: MailConfig::from_env()?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl PaymentConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let currency_raw = get_env_or_default("PAYMENT_CURRENCY", "usd");
        let currency = Currency::parse(&currency_raw).map_err(|e| {
            ConfigError::InvalidEnvVar("PAYMENT_CURRENCY".to_owned(), e.to_string())
        })?;

        Ok(Self {
            base_url: get_url("PAYMENT_BASE_URL", "https://api.stripe.com")?,
            secret_key: get_required_secret("PAYMENT_SECRET_KEY")?,
            currency,
        })
    }
}

impl MailConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let domain = get_required_env("MAIL_DOMAIN")?;
        let sender = get_env_or_default("MAIL_SENDER", &format!("no-reply@{domain}"));

        Ok(Self {
            base_url: get_url("MAIL_BASE_URL", "https://api.mailgun.net")?,
            api_key: get_required_secret("MAIL_API_KEY")?,
            domain,
            sender,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_owned()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Get a base URL, validating it parses.
fn get_url(key: &str, default: &str) -> Result<Url, ConfigError> {
    Url::parse(&get_env_or_default(key, default))
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_owned(), e.to_string()))
}

/// Get a duration expressed as whole minutes.
fn get_minutes(key: &str, default: u64) -> Result<Duration, ConfigError> {
    let minutes = get_env_or_default(key, &default.to_string())
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_owned(), e.to_string()))?;
    Ok(Duration::from_secs(minutes * 60))
}

/// A token that can no longer be refreshed once its session expires would be
/// dead on arrival; reject such configurations outright.
fn validate_windows(session: Duration, refresh: Duration) -> Result<(), ConfigError> {
    if refresh < session {
        return Err(ConfigError::Inconsistent(format!(
            "refresh validity ({}s) must be at least the session validity ({}s)",
            refresh.as_secs(),
            session.as_secs()
        )));
    }
    Ok(())
}
