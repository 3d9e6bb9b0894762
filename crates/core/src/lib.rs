//! Ovenside Core - Shared types library.
//!
//! This crate provides the domain types used across the Ovenside components:
//! - `api` - The ordering API server
//! - `integration-tests` - Black-box tests against a running server
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no storage
//! access. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for emails, order ids, currencies, and
//!   order states

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
