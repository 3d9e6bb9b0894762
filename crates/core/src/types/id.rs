//! Order identifier.
//!
//! Order ids are minted by the API at order creation: a 13-digit unix
//! millisecond timestamp followed by 10 random alphanumeric characters,
//! always 23 characters total. The timestamp prefix makes ids roughly
//! sortable by creation time and lets tooling recover the creation instant
//! without a `stat` call.

use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Length of the millisecond-timestamp prefix.
const TIMESTAMP_DIGITS: usize = 13;

/// Length of the random suffix.
const SUFFIX_LENGTH: usize = 10;

/// Total id length.
pub const ORDER_ID_LENGTH: usize = TIMESTAMP_DIGITS + SUFFIX_LENGTH;

/// Errors that can occur when parsing an [`OrderId`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum OrderIdError {
    /// The input is not exactly 23 characters long.
    #[error("order id must be exactly {ORDER_ID_LENGTH} characters")]
    WrongLength,
    /// The first 13 characters are not all ASCII digits.
    #[error("order id must start with a 13-digit timestamp")]
    BadTimestamp,
    /// The suffix contains a non-alphanumeric character.
    #[error("order id suffix must be alphanumeric")]
    BadSuffix,
}

/// A validated order identifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Parse an `OrderId` from a string, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a 13-digit timestamp followed by
    /// 10 alphanumeric characters.
    pub fn parse(s: &str) -> Result<Self, OrderIdError> {
        let s = s.trim();

        if s.len() != ORDER_ID_LENGTH {
            return Err(OrderIdError::WrongLength);
        }

        let (stamp, suffix) = s.split_at(TIMESTAMP_DIGITS);

        if !stamp.bytes().all(|b| b.is_ascii_digit()) {
            return Err(OrderIdError::BadTimestamp);
        }

        if !suffix.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(OrderIdError::BadSuffix);
        }

        Ok(Self(s.to_owned()))
    }

    /// Build an `OrderId` from a creation instant and a random suffix.
    ///
    /// # Errors
    ///
    /// Returns an error if `suffix` is not 10 alphanumeric characters or the
    /// timestamp does not render as 13 digits (pre-2001 or far-future clock).
    pub fn from_parts(created: DateTime<Utc>, suffix: &str) -> Result<Self, OrderIdError> {
        Self::parse(&format!("{:013}{suffix}", created.timestamp_millis()))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The creation instant recovered from the timestamp prefix.
    ///
    /// Returns `None` only if the embedded millisecond value is out of
    /// chrono's representable range.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let millis: i64 = self.0.get(..TIMESTAMP_DIGITS)?.parse().ok()?;
        DateTime::from_timestamp_millis(millis)
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for OrderId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
