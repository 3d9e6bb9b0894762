//! Password hashing and token minting.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rand::{Rng, distr::Alphanumeric};

/// Length of a minted session token.
pub const TOKEN_LENGTH: usize = 20;

/// Hash a password with Argon2 and a fresh salt.
///
/// # Errors
///
/// Returns the underlying hasher error; callers surface it as an internal
/// failure without detail.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// Verify a password against a stored Argon2 hash.
///
/// An unparseable stored hash verifies as false - a corrupted hash must deny
/// login rather than fail the request.
#[must_use]
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

/// A random alphanumeric string of the given length.
#[must_use]
pub fn random_string(length: usize) -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Mint a new session token value.
#[must_use]
pub fn mint_token() -> String {
    random_string(TOKEN_LENGTH)
}
