//! Integration tests for Ovenside.
//!
//! Black-box tests against a running API server; the in-process tests in
//! `ovenside-api` cover the same flows without a network hop.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the server
//! cargo run -p ovenside-api
//!
//! # Run integration tests
//! cargo test -p ovenside-integration-tests -- --ignored
//! ```
//!
//! The target server is selected with `OVENSIDE_BASE_URL` (default
//! `http://localhost:3000`). Tests create their own accounts under
//! unique addresses and clean them up afterwards, so they can run
//! against a shared development instance.

/// Base URL of the API under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("OVENSIDE_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned())
}

/// A unique throwaway email address for one test run.
#[must_use]
pub fn unique_email() -> String {
    format!("it-{}@example.com", uuid::Uuid::new_v4().simple())
}
