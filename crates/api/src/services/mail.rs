//! Outbound mail client.
//!
//! Mailgun-shaped messages API. Checkout confirmation mail is best-effort:
//! callers fire it off a spawned task and a failure never fails the order.

use secrecy::{ExposeSecret, SecretString};
use url::Url;

use ovenside_core::Email;

use super::UpstreamError;
use crate::config::MailConfig;

/// Mail provider API client.
#[derive(Clone)]
pub struct MailClient {
    client: reqwest::Client,
    base_url: Url,
    api_key: SecretString,
    domain: String,
    sender: String,
}

impl MailClient {
    /// Create a new mail client.
    #[must_use]
    pub fn new(config: &MailConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            domain: config.domain.clone(),
            sender: config.sender.clone(),
        }
    }

    /// Send an HTML mail.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider rejects the message or is
    /// unreachable.
    pub async fn send(&self, to: &Email, subject: &str, body: &str) -> Result<(), UpstreamError> {
        let url = self
            .base_url
            .join(&format!("v3/{}/messages", self.domain))
            .map_err(|e| UpstreamError::Parse(format!("invalid mail url: {e}")))?;

        let params = [
            ("from", self.sender.as_str()),
            ("to", to.as_str()),
            ("subject", subject),
            ("html", body),
        ];

        let response = self
            .client
            .post(url)
            .basic_auth("api", Some(self.api_key.expose_secret()))
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}
