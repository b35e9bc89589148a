//! Trolley - client-side cart state engine with anonymous/remote reconciliation.
//!
//! This crate owns the authoritative in-memory view of "what is in the cart
//! right now" for a storefront client, and keeps it consistent with two
//! backing stores: a cookie-style anonymous slot for visitors and the
//! backend's authenticated cart API for logged-in users. The two are merged
//! once at the moment of login.
//!
//! # Architecture
//!
//! Hexagonal: the store depends on ports, adapters implement them.
//!
//! - **`domain`** - Cart lines, identity keys, snapshots
//! - **`port`** - [`RemoteCart`](port::RemoteCart), [`CookieJar`](port::CookieJar),
//!   auth state, bearer tokens
//! - **`adapter`** - The anonymous cookie store, in-memory/file cookie jars,
//!   and the reqwest HTTP cart client
//! - **`app`** - [`CartStore`](app::CartStore) orchestration and the
//!   [`CartEvents`](app::CartEvents) count broadcast
//!
//! Mutations are optimistic: the in-memory snapshot and the broadcast count
//! update immediately, persistence happens asynchronously, and any
//! persistence failure resynchronizes from the authoritative source.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use trolley::adapter::{AnonymousCartStore, HttpCartClient, MemoryCookieJar};
//! use trolley::app::CartStore;
//! use trolley::config::Config;
//! use trolley::port::{auth_channel, AccessTokens};
//!
//! struct Session;
//!
//! impl AccessTokens for Session {
//!     fn bearer(&self) -> Option<String> {
//!         None
//!     }
//! }
//!
//! # async fn run() {
//! let config = Config::default();
//! let jar = Arc::new(MemoryCookieJar::new());
//! let anonymous = AnonymousCartStore::new(jar, &config.anonymous);
//! let remote = Arc::new(HttpCartClient::from_config(&config.remote, Arc::new(Session)));
//! let (auth, auth_rx) = auth_channel();
//!
//! let cart = CartStore::new(remote, anonymous, auth_rx, &config.store);
//! auth.resolve(false);
//! cart.initialize().await;
//! # }
//! ```

pub mod adapter;
pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
