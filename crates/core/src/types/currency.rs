//! ISO 4217 currency code.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Error parsing a [`Currency`].
#[derive(thiserror::Error, Debug, Clone)]
#[error("currency must be a 3-letter ISO 4217 code")]
pub struct CurrencyError;

/// A three-letter currency code, stored lowercase.
///
/// The payment gateway accepts any ISO 4217 code, so this is a shape check
/// rather than an allow-list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Currency(String);

impl Currency {
    /// Parse a `Currency` from a string, trimming and lowercasing.
    ///
    /// # Errors
    ///
    /// Returns [`CurrencyError`] unless the input is exactly three ASCII
    /// letters.
    pub fn parse(s: &str) -> Result<Self, CurrencyError> {
        let s = s.trim();

        if s.len() != 3 || !s.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(CurrencyError);
        }

        Ok(Self(s.to_ascii_lowercase()))
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self("usd".to_owned())
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
