//! Payment gateway client.
//!
//! Speaks the Stripe-shaped two-step flow the ordering API needs: tokenize a
//! card, then create a charge against the token. Charges carry the order id
//! as an idempotency key so a retried checkout cannot double-charge.

use reqwest::header::{HeaderMap, HeaderValue};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use secrecy::ExposeSecret;
use serde::Deserialize;
use url::Url;

use ovenside_core::Currency;

use super::UpstreamError;
use crate::config::PaymentConfig;

/// Header carrying the idempotency key on charge creation.
const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// Card fields collected at checkout.
#[derive(Debug, Clone)]
pub struct CardDetails {
    pub number: String,
    pub exp_month: String,
    pub exp_year: String,
    pub cvc: String,
}

/// A tokenized card, safe to reference in a charge.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentToken {
    pub id: String,
}

/// A created charge.
#[derive(Debug, Clone, Deserialize)]
pub struct Charge {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Gateway error body, `{"error": {"message": ...}}`.
#[derive(Debug, Deserialize)]
struct GatewayError {
    error: GatewayErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GatewayErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

/// Payment gateway API client.
#[derive(Clone)]
pub struct PaymentClient {
    client: reqwest::Client,
    base_url: Url,
}

impl PaymentClient {
    /// Create a new payment gateway client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &PaymentConfig) -> Result<Self, UpstreamError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.secret_key.expose_secret());
        let mut auth_header = HeaderValue::from_str(&auth_value)
            .map_err(|e| UpstreamError::Parse(format!("invalid secret key format: {e}")))?;
        auth_header.set_sensitive(true);
        headers.insert("Authorization", auth_header);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    /// Tokenize a card.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway rejects the card or is unreachable.
    pub async fn tokenize(&self, card: &CardDetails) -> Result<PaymentToken, UpstreamError> {
        let url = self.endpoint("v1/tokens")?;

        let params = [
            ("card[number]", card.number.as_str()),
            ("card[exp_month]", card.exp_month.as_str()),
            ("card[exp_year]", card.exp_year.as_str()),
            ("card[cvc]", card.cvc.as_str()),
        ];

        let response = self.client.post(url).form(&params).send().await?;
        Self::decode(response).await
    }

    /// Charge a tokenized card.
    ///
    /// `amount` is in the currency's standard unit and is converted to the
    /// gateway's smallest-unit integer form.
    ///
    /// # Errors
    ///
    /// Returns an error if the charge is declined or the gateway is
    /// unreachable.
    pub async fn charge(
        &self,
        amount: Decimal,
        currency: &Currency,
        source: &str,
        idempotency_key: Option<&str>,
    ) -> Result<Charge, UpstreamError> {
        let url = self.endpoint("v1/charges")?;

        let cents = (amount * Decimal::ONE_HUNDRED)
            .round()
            .to_i64()
            .ok_or_else(|| UpstreamError::Parse(format!("amount out of range: {amount}")))?;

        let cents = cents.to_string();
        let params = [
            ("amount", cents.as_str()),
            ("currency", currency.as_str()),
            ("source", source),
        ];

        let mut request = self.client.post(url).form(&params);
        if let Some(key) = idempotency_key {
            request = request.header(IDEMPOTENCY_HEADER, key);
        }

        let response = request.send().await?;
        Self::decode(response).await
    }

    fn endpoint(&self, path: &str) -> Result<Url, UpstreamError> {
        self.base_url
            .join(path)
            .map_err(|e| UpstreamError::Parse(format!("invalid gateway url: {e}")))
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, UpstreamError> {
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GatewayError>(&body)
                .ok()
                .and_then(|e| e.error.message)
                .unwrap_or(body);
            return Err(UpstreamError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| UpstreamError::Parse(e.to_string()))
    }
}
