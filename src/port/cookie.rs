//! Cookie jar port: the client-side persistent key-value slot backing the
//! anonymous cart.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// Same-site scope for a stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    /// First-party-only access.
    Strict,
    Lax,
}

/// Abstraction over cookie-style storage backends.
///
/// Enables multiple implementations (in-memory, file-backed) without coupling
/// the anonymous cart adapter to a specific storage mechanism.
///
/// # Implementation Notes
///
/// - `get` must return `None` for expired values; expiry is checked on read
/// - operations are idempotent: removing an absent key is not an error
#[async_trait]
pub trait CookieJar: Send + Sync {
    /// Retrieve a value by name. `None` when absent or expired.
    async fn get(&self, name: &str) -> Result<Option<String>>;

    /// Store a value with the given time-to-live and same-site scope.
    async fn set(&self, name: &str, value: &str, ttl: Duration, same_site: SameSite) -> Result<()>;

    /// Remove a stored value outright.
    async fn remove(&self, name: &str) -> Result<()>;
}
