//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`remote`] - In-memory [`RemoteCart`](crate::port::RemoteCart) mock with
//!   scripted failures and call recording.
//! - [`domain`] - Builders for cart lines and additions.

pub mod domain;
pub mod remote;
