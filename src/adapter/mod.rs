//! Adapters implementing the ports against concrete backends.

pub mod anonymous;
pub mod http;
pub mod jar;

pub use anonymous::AnonymousCartStore;
pub use http::HttpCartClient;
pub use jar::{FileCookieJar, MemoryCookieJar};
