//! Per-collection record schemas.
//!
//! Each collection in the record store has an explicit shape here; decoding
//! happens at the store boundary, so handlers never work with loose JSON.

pub mod cart;
pub mod menu;
pub mod order;
pub mod token;
pub mod user;

pub use cart::CartItem;
pub use menu::MenuItem;
pub use order::{Order, OrderReceipt};
pub use token::{TokenReceipt, TokenRecord};
pub use user::{OrderRef, User, UserProfile};

/// Collection names used across the API.
pub mod collections {
    /// User accounts, keyed by email.
    pub const USERS: &str = "users";
    /// Session tokens, keyed by token string.
    pub const TOKENS: &str = "tokens";
    /// The menu, a single record under the `default` key.
    pub const MENU: &str = "menu";
    /// Per-user carts, keyed by email.
    pub const CARTS: &str = "carts";

    /// Key of the menu record.
    pub const MENU_KEY: &str = "default";

    /// Every collection directory expected to exist under the data root.
    pub const ALL: &[&str] = &[
        USERS,
        TOKENS,
        MENU,
        CARTS,
        "orders/pending",
        "orders/processing",
        "orders/fulfilled",
    ];
}
