//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! Ports define the extension points between the cart store and the outside
//! world. Adapters implement them to integrate with the remote cart API and
//! the client-side cookie slot; test mocks implement them for the testkit.
//!
//! # Available Ports
//!
//! - [`RemoteCart`] - the backend's authenticated cart endpoints
//! - [`CookieJar`] - cookie-style storage backing the anonymous cart
//! - [`AuthHandle`]/[`AuthReceiver`] - login state and transition events
//! - [`AccessTokens`] - bearer tokens for the HTTP adapter

pub mod auth;
pub mod cookie;
pub mod remote;

pub use auth::{auth_channel, AccessTokens, AuthHandle, AuthReceiver, AuthSnapshot, NoTokens};
pub use cookie::{CookieJar, SameSite};
pub use remote::{NewRemoteItem, RemoteCart, RemoteCartView};
