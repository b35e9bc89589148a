//! Tab-wide cart notifications.
//!
//! Disconnected UI fragments (header badge, page views) subscribe here
//! instead of holding a reference to the cart store. The payload is a single
//! count with last-value-wins semantics, so missed intermediate publishes are
//! harmless.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::broadcast;

/// Broadcast payload: total item count of the cart right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartCount {
    pub count: u64,
}

/// Broadcast channel for cart count updates.
pub struct CartEvents {
    tx: broadcast::Sender<CartCount>,
    /// Most recently published count, for subscribers that mount late.
    last: AtomicU64,
}

impl CartEvents {
    /// Create a bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self {
            tx,
            last: AtomicU64::new(0),
        }
    }

    /// Subscribe to count updates.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CartCount> {
        self.tx.subscribe()
    }

    /// Broadcast a new count to all current subscribers synchronously.
    pub fn publish(&self, count: u64) {
        self.last.store(count, Ordering::SeqCst);
        // No receivers is fine.
        let _ = self.tx.send(CartCount { count });
    }

    /// The most recently published count (0 before the first publish).
    #[must_use]
    pub fn last(&self) -> u64 {
        self.last.load(Ordering::SeqCst)
    }
}

impl Default for CartEvents {
    fn default() -> Self {
        Self::new(16)
    }
}
