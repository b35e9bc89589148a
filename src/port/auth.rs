//! Auth state port: who is logged in, and whether that is known yet.

use tokio::sync::watch;

/// Current authentication state.
///
/// `is_loading` is true only during initial resolution at startup; a flip of
/// `is_logged_in` after loading has settled once is a transition event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthSnapshot {
    pub is_loading: bool,
    pub is_logged_in: bool,
}

impl Default for AuthSnapshot {
    fn default() -> Self {
        Self {
            is_loading: true,
            is_logged_in: false,
        }
    }
}

/// Receiver side handed to the cart store.
pub type AuthReceiver = watch::Receiver<AuthSnapshot>;

/// Sender side held by the surrounding session logic.
#[derive(Debug, Clone)]
pub struct AuthHandle {
    tx: watch::Sender<AuthSnapshot>,
}

impl AuthHandle {
    /// Mark initial resolution complete with the given login state.
    pub fn resolve(&self, logged_in: bool) {
        self.tx.send_modify(|s| {
            s.is_loading = false;
            s.is_logged_in = logged_in;
        });
    }

    /// Flip the login state. A no-op value still notifies watchers, which
    /// treat an unchanged state as a non-edge.
    pub fn set_logged_in(&self, logged_in: bool) {
        self.tx.send_modify(|s| {
            s.is_loading = false;
            s.is_logged_in = logged_in;
        });
    }

    /// Current state.
    #[must_use]
    pub fn snapshot(&self) -> AuthSnapshot {
        *self.tx.borrow()
    }
}

/// Create an auth channel in the initial "still resolving" state.
#[must_use]
pub fn auth_channel() -> (AuthHandle, AuthReceiver) {
    let (tx, rx) = watch::channel(AuthSnapshot::default());
    (AuthHandle { tx }, rx)
}

/// Bearer token source for the HTTP cart client. Token issuance and refresh
/// live outside this crate.
pub trait AccessTokens: Send + Sync {
    /// Current bearer token, if a session is active.
    fn bearer(&self) -> Option<String>;
}

/// Token source for sessions that never authenticate.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTokens;

impl AccessTokens for NoTokens {
    fn bearer(&self) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_loading_and_logged_out() {
        let (handle, rx) = auth_channel();
        assert!(rx.borrow().is_loading);
        assert!(!rx.borrow().is_logged_in);
        assert!(handle.snapshot().is_loading);
    }

    #[test]
    fn resolve_settles_loading() {
        let (handle, rx) = auth_channel();
        handle.resolve(true);

        let snap = *rx.borrow();
        assert!(!snap.is_loading);
        assert!(snap.is_logged_in);
    }

    #[tokio::test]
    async fn watchers_see_login_edges() {
        let (handle, mut rx) = auth_channel();
        handle.resolve(false);
        rx.changed().await.unwrap();
        assert!(!rx.borrow_and_update().is_logged_in);

        handle.set_logged_in(true);
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_logged_in);
    }
}
