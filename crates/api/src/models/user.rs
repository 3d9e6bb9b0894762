//! User account records.

use serde::{Deserialize, Serialize};

use ovenside_core::{Email, OrderId, OrderState};

/// A stored user account, keyed by email in the `users` collection.
///
/// `tokens` holds back-references to session records, not the sessions
/// themselves; `orders` mirrors the state of each order the user has placed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub address: String,
    /// Argon2 hash of the account password, never returned to clients.
    pub password: String,
    #[serde(default)]
    pub tokens: Vec<String>,
    #[serde(default)]
    pub orders: Vec<OrderRef>,
}

/// A user's reference to one of their orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRef {
    pub order: OrderId,
    pub state: OrderState,
}

/// The client-visible view of a user: the profile fields without the
/// password hash, token back-references, or order list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub address: String,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            address: user.address.clone(),
        }
    }
}
