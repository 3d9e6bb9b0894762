//! Menu records.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One item on the menu.
///
/// The whole menu is a single array record at `menu/default`; items are
/// identified by `menu_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MenuItem {
    pub menu_id: String,
    pub name: String,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
