//! Session token records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ovenside_core::Email;

/// A stored session token, keyed by its own value in the `tokens` collection.
///
/// Created at login, its `expires_in` bumped on refresh, deleted at logout or
/// account deletion. Invariant: `refresh_validity >= expires_in`; a token
/// past `refresh_validity` is permanently dead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRecord {
    pub token: String,
    pub email: Email,
    /// Expiry instant, unix epoch milliseconds.
    #[serde(rename = "expiresIn")]
    pub expires_in: i64,
    /// Hard refresh deadline, unix epoch milliseconds.
    #[serde(rename = "refreshValidity")]
    pub refresh_validity: i64,
}

impl TokenRecord {
    /// Whether the session has lapsed at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.timestamp_millis() > self.expires_in
    }

    /// Whether the token is past its hard refresh deadline at `now`.
    #[must_use]
    pub fn is_dead(&self, now: DateTime<Utc>) -> bool {
        now.timestamp_millis() > self.refresh_validity
    }
}

/// The slice of a token record returned to clients: the token value and its
/// expiry, never the owner or the refresh deadline.
#[derive(Debug, Clone, Serialize)]
pub struct TokenReceipt {
    pub token: String,
    #[serde(rename = "expiresIn")]
    pub expires_in: i64,
}

impl From<&TokenRecord> for TokenReceipt {
    fn from(record: &TokenRecord) -> Self {
        Self {
            token: record.token.clone(),
            expires_in: record.expires_in,
        }
    }
}
