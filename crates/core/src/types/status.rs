//! Order lifecycle state.

use serde::{Deserialize, Serialize};

/// State of an order.
///
/// An order record lives in exactly one state directory at a time
/// (`orders/pending`, `orders/processing`, `orders/fulfilled`); the same
/// value is also denormalized onto the owning user's order list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    /// Created from a cart, awaiting payment.
    #[default]
    Pending,
    /// Paid, being prepared.
    Processing,
    /// Delivered.
    Fulfilled,
}

impl OrderState {
    /// The collection that holds orders in this state.
    #[must_use]
    pub const fn collection(self) -> &'static str {
        match self {
            Self::Pending => "orders/pending",
            Self::Processing => "orders/processing",
            Self::Fulfilled => "orders/fulfilled",
        }
    }
}

impl std::fmt::Display for OrderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Processing => write!(f, "processing"),
            Self::Fulfilled => write!(f, "fulfilled"),
        }
    }
}

impl std::str::FromStr for OrderState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "fulfilled" => Ok(Self::Fulfilled),
            _ => Err(format!("invalid order state: {s}")),
        }
    }
}
