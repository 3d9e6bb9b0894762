//! Cart records.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::menu::MenuItem;

/// One line in a user's cart: a menu item snapshot plus a quantity.
///
/// A cart is a single array record in the `carts` collection keyed by the
/// owner's email. At most one line per `menu_id`; the cart handlers enforce
/// that, not the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CartItem {
    pub menu_id: String,
    pub name: String,
    pub price: Decimal,
    pub qty: u32,
}

impl CartItem {
    /// Snapshot a menu item into a cart line.
    #[must_use]
    pub fn from_menu(item: &MenuItem, qty: u32) -> Self {
        Self {
            menu_id: item.menu_id.clone(),
            name: item.name.clone(),
            price: item.price,
            qty,
        }
    }

    /// Price of the whole line.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.qty)
    }
}
