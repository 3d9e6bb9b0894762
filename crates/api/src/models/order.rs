//! Order records.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ovenside_core::{Email, OrderId};

use super::cart::CartItem;

/// A placed order.
///
/// Lives in exactly one of the three `orders/<state>` collections at a time,
/// keyed by its id; a state change moves the record between collections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub amount: Decimal,
    /// The cart lines the order was placed from.
    #[serde(rename = "order")]
    pub lines: Vec<CartItem>,
    pub owner: Email,
}

impl Order {
    /// Build an order from a cart snapshot, totalling the line prices.
    #[must_use]
    pub fn from_cart(id: OrderId, owner: Email, lines: Vec<CartItem>) -> Self {
        let amount = lines.iter().map(CartItem::line_total).sum();
        Self {
            id,
            amount,
            lines,
            owner,
        }
    }
}

/// The client-visible view of an order: everything but the owner.
#[derive(Debug, Clone, Serialize)]
pub struct OrderReceipt {
    pub id: OrderId,
    pub amount: Decimal,
    #[serde(rename = "order")]
    pub lines: Vec<CartItem>,
}

impl From<Order> for OrderReceipt {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            amount: order.amount,
            lines: order.lines,
        }
    }
}
