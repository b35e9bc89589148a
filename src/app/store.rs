//! The cart store: single authoritative in-memory cart with optimistic
//! mutation and asynchronous persistence.
//!
//! Every mutation follows the same three-phase shape:
//!
//! 1. compute the new snapshot synchronously, apply it, broadcast the count
//! 2. persist to the backing store selected by the current auth state
//! 3. on persistence failure, resynchronize from the authoritative source
//!
//! The in-memory copy is never trusted after a failure; `refresh` re-adopts
//! whatever the backing store reports. Locks are released before every await.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio::task::AbortHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::events::{CartCount, CartEvents};
use crate::adapter::AnonymousCartStore;
use crate::config::StoreConfig;
use crate::domain::{CartLine, CartSnapshot, LineKey, NewLine, RemoteLineId};
use crate::error::{Error, Result};
use crate::port::{AuthReceiver, NewRemoteItem, RemoteCart};
use parking_lot::RwLock;

/// Notification that a debounced quantity update ultimately failed, for the
/// UI to surface. Add/remove/clear failures self-heal silently instead.
#[derive(Debug, Clone)]
pub struct UpdateFailure {
    pub key: LineKey,
}

/// The backing store for one operation, selected once per operation so the
/// two persistence branches cannot drift apart mid-flight.
enum Backend<'a> {
    Anonymous(&'a AnonymousCartStore),
    Remote(&'a dyn RemoteCart),
}

struct Inner {
    snapshot: RwLock<CartSnapshot>,
    remote: Arc<dyn RemoteCart>,
    anonymous: AnonymousCartStore,
    auth: AuthReceiver,
    events: CartEvents,
    failures: broadcast::Sender<UpdateFailure>,
    initialized: AtomicBool,
    refreshing: AtomicBool,
    /// Pending debounced quantity flushes, one slot per identity key. The
    /// counter value identifies which scheduling owns the slot, so a flush
    /// waking up concurrently with a superseding call never evicts the
    /// newer handle.
    pending: DashMap<LineKey, (u64, AbortHandle)>,
    flush_seq: AtomicU64,
    debounce: Duration,
}

/// Authoritative in-memory cart, mediating between the anonymous store and
/// the remote authenticated cart. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<Inner>,
}

impl CartStore {
    pub fn new(
        remote: Arc<dyn RemoteCart>,
        anonymous: AnonymousCartStore,
        auth: AuthReceiver,
        config: &StoreConfig,
    ) -> Self {
        let (failures, _rx) = broadcast::channel(config.event_capacity);
        Self {
            inner: Arc::new(Inner {
                snapshot: RwLock::new(CartSnapshot::new()),
                remote,
                anonymous,
                auth,
                events: CartEvents::new(config.event_capacity),
                failures,
                initialized: AtomicBool::new(false),
                refreshing: AtomicBool::new(false),
                pending: DashMap::new(),
                flush_seq: AtomicU64::new(0),
                debounce: Duration::from_millis(config.debounce_ms),
            }),
        }
    }

    /// Build the initial snapshot. Runs at most once per store; a concurrent
    /// or repeated call is ignored. Defers until the auth state has resolved,
    /// merges the anonymous cart on an already-authenticated start, and
    /// starts watching for login/logout edges.
    pub async fn initialize(&self) {
        let inner = &self.inner;
        if inner.initialized.swap(true, Ordering::SeqCst) {
            debug!("Cart already initialized, skipping");
            return;
        }

        // Auth resolution is itself asynchronous on startup.
        let mut auth = inner.auth.clone();
        let logged_in = match auth.wait_for(|s| !s.is_loading).await {
            Ok(snap) => snap.is_logged_in,
            // Session side gone; behave as an anonymous visitor.
            Err(_) => false,
        };

        if logged_in {
            inner.merge_anonymous_into_remote().await;
        }
        let snapshot = inner.resolve_snapshot(logged_in).await;
        inner.adopt(snapshot);
        info!(items = self.total_items(), "Cart initialized");

        self.spawn_auth_watcher();
    }

    /// Re-adopt the authoritative snapshot for the current auth state and
    /// republish the count. A second call while one is in flight is a no-op,
    /// not queued; the next caller re-reads the by-then-updated state anyway.
    pub async fn refresh(&self) {
        self.inner.refresh().await;
    }

    /// Add a line, merging quantities into an existing line with the same
    /// identity key. Persistence failures resynchronize silently.
    pub async fn add_to_cart(&self, new: NewLine) {
        let inner = &self.inner;
        let line = CartLine::from(new);
        let key = line.key();

        {
            let mut snapshot = inner.snapshot.write();
            snapshot.merge_add(line.clone());
            inner.events.publish(snapshot.total_items());
        }

        let result = match inner.backend() {
            Backend::Remote(remote) => inner.persist_remote_add(remote, &key, &line).await,
            Backend::Anonymous(store) => store.merge_add(&line).await,
        };

        if let Err(err) = result {
            warn!(key = %key, error = %err, "Cart add failed to persist, resynchronizing");
            inner.refresh().await;
        }
    }

    /// Remove the line matching the identity key. Persistence failures
    /// resynchronize silently.
    pub async fn remove_from_cart(&self, key: &LineKey) {
        let inner = &self.inner;
        if let Some((_, (_, pending))) = inner.pending.remove(key) {
            pending.abort();
        }

        let removed = {
            let mut snapshot = inner.snapshot.write();
            let removed = snapshot.remove(key);
            inner.events.publish(snapshot.total_items());
            removed
        };
        let Some(removed) = removed else {
            return;
        };

        let result = match inner.backend() {
            Backend::Remote(remote) => match removed.remote_line_id {
                Some(id) => remote.remove_item(id).await,
                // Never persisted remotely, nothing to delete.
                None => Ok(()),
            },
            Backend::Anonymous(store) => store.remove(key).await,
        };

        if let Err(err) = result {
            warn!(key = %key, error = %err, "Cart remove failed to persist, resynchronizing");
            inner.refresh().await;
        }
    }

    /// Replace the matching line's quantity. A quantity of 0 or below removes
    /// the line instead.
    ///
    /// The in-memory snapshot updates on every call with no delay. Anonymous
    /// sessions persist immediately and report failure to the caller after
    /// resynchronizing. Authenticated sessions debounce per identity key:
    /// rapid calls coalesce into a single remote update carrying the final
    /// quantity, and a flush that ultimately fails is reported via
    /// [`CartStore::subscribe_update_failures`].
    pub async fn update_quantity(&self, key: &LineKey, quantity: i32) -> Result<()> {
        if quantity <= 0 {
            self.remove_from_cart(key).await;
            return Ok(());
        }
        let quantity = quantity as u32;
        let inner = &self.inner;

        let updated = {
            let mut snapshot = inner.snapshot.write();
            let updated = snapshot.set_quantity(key, quantity);
            inner.events.publish(snapshot.total_items());
            updated
        };
        let Some(updated) = updated else {
            // No such line; nothing to persist.
            return Ok(());
        };

        match inner.backend() {
            Backend::Anonymous(store) => {
                if let Err(err) = store.set_quantity(key, quantity).await {
                    warn!(key = %key, error = %err, "Quantity update failed to persist, resynchronizing");
                    inner.refresh().await;
                    return Err(err);
                }
                Ok(())
            }
            Backend::Remote(_) => {
                self.schedule_debounced_update(key.clone(), updated.remote_line_id, quantity);
                Ok(())
            }
        }
    }

    /// Empty the cart. Persistence failures resynchronize silently.
    pub async fn clear_cart(&self) {
        let inner = &self.inner;
        // Quantity flushes for lines that no longer exist are pointless.
        for entry in inner.pending.iter() {
            entry.value().1.abort();
        }
        inner.pending.clear();

        {
            let mut snapshot = inner.snapshot.write();
            snapshot.clear();
            inner.events.publish(0);
        }

        let result = match inner.backend() {
            Backend::Remote(remote) => remote.clear().await,
            Backend::Anonymous(store) => store.clear().await,
        };

        if let Err(err) = result {
            warn!(error = %err, "Cart clear failed to persist, resynchronizing");
            inner.refresh().await;
        }
    }

    /// Current snapshot (a copy).
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        self.inner.snapshot.read().clone()
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.inner.snapshot.read().total_items()
    }

    /// Whether the current session is authenticated.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.is_authenticated()
    }

    /// Subscribe to total-count broadcasts.
    #[must_use]
    pub fn subscribe_count(&self) -> broadcast::Receiver<CartCount> {
        self.inner.events.subscribe()
    }

    /// The most recently broadcast count.
    #[must_use]
    pub fn last_published_count(&self) -> u64 {
        self.inner.events.last()
    }

    /// Subscribe to failed debounced quantity updates.
    #[must_use]
    pub fn subscribe_update_failures(&self) -> broadcast::Receiver<UpdateFailure> {
        self.inner.failures.subscribe()
    }

    fn schedule_debounced_update(
        &self,
        key: LineKey,
        remote_line_id: Option<RemoteLineId>,
        quantity: u32,
    ) {
        // A fresh call supersedes the pending flush for this key; flushes for
        // other keys are untouched.
        if let Some((_, (_, previous))) = self.inner.pending.remove(&key) {
            previous.abort();
        }

        let seq = self.inner.flush_seq.fetch_add(1, Ordering::SeqCst);
        let inner = Arc::clone(&self.inner);
        let task_key = key.clone();
        let handle = tokio::spawn(async move {
            sleep(inner.debounce).await;
            // Vacate the slot only if this scheduling still owns it; a
            // superseding call may have replaced the entry while we woke up.
            inner
                .pending
                .remove_if(&task_key, |_, (owner, _)| *owner == seq);

            // A line the server does not know about yet has nothing to flush.
            let Some(id) = remote_line_id else {
                return;
            };

            if let Err(err) = inner.remote.update_item(id, quantity).await {
                warn!(key = %task_key, error = %err, "Debounced quantity update failed, resynchronizing");
                inner.refresh().await;
                let _ = inner.failures.send(UpdateFailure { key: task_key });
            }
        });

        self.inner.pending.insert(key, (seq, handle.abort_handle()));
    }

    fn spawn_auth_watcher(&self) {
        let inner = Arc::clone(&self.inner);
        let mut rx = self.inner.auth.clone();
        // Baseline is the state at spawn time, so a transition that lands
        // before the task's first poll still registers as an edge.
        let mut last = rx.borrow_and_update().is_logged_in;
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let snap = *rx.borrow_and_update();
                if snap.is_loading || snap.is_logged_in == last {
                    continue;
                }
                last = snap.is_logged_in;

                if snap.is_logged_in {
                    // The one-time merge happens only on the transition into
                    // the authenticated state.
                    info!("Login detected, merging anonymous cart");
                    inner.merge_anonymous_into_remote().await;
                } else {
                    info!("Logout detected, rebuilding cart view");
                }
                inner.refresh().await;
            }
        });
    }
}

impl Inner {
    fn is_authenticated(&self) -> bool {
        let snap = self.auth.borrow();
        !snap.is_loading && snap.is_logged_in
    }

    fn backend(&self) -> Backend<'_> {
        if self.is_authenticated() {
            Backend::Remote(self.remote.as_ref())
        } else {
            Backend::Anonymous(&self.anonymous)
        }
    }

    fn adopt(&self, snapshot: CartSnapshot) {
        let mut current = self.snapshot.write();
        *current = snapshot;
        self.events.publish(current.total_items());
    }

    async fn refresh(&self) {
        if self
            .refreshing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Refresh already in flight, skipping");
            return;
        }

        let snapshot = self.resolve_snapshot(self.is_authenticated()).await;
        self.adopt(snapshot);
        self.refreshing.store(false, Ordering::SeqCst);
    }

    /// The authoritative snapshot for the given auth state. A remote failure
    /// degrades to the anonymous view; the user must always see something
    /// consistent with local storage.
    async fn resolve_snapshot(&self, authenticated: bool) -> CartSnapshot {
        if authenticated {
            match self.remote.get_cart().await {
                Ok(view) => return CartSnapshot::from_lines(view.lines),
                Err(err) => {
                    warn!(error = %err, "Remote cart fetch failed, degrading to anonymous view");
                }
            }
        }
        CartSnapshot::from_lines(self.anonymous.read().await)
    }

    /// One-time login merge: fold the anonymous cart into the remote cart,
    /// clearing the anonymous store only after the merge is confirmed. A
    /// failed merge keeps the local copy and never blocks the flow.
    async fn merge_anonymous_into_remote(&self) {
        let lines = self.anonymous.read().await;
        if lines.is_empty() {
            return;
        }

        match self.remote.merge_from_anonymous().await {
            Ok(()) => {
                info!(lines = lines.len(), "Anonymous cart merged into remote cart");
                if let Err(err) = self.anonymous.clear().await {
                    warn!(error = %err, "Failed to clear anonymous cart after merge");
                }
            }
            Err(err) => {
                warn!(error = %err, "Anonymous cart merge failed, keeping local copy");
            }
        }
    }

    async fn persist_remote_add(
        &self,
        remote: &dyn RemoteCart,
        key: &LineKey,
        line: &CartLine,
    ) -> Result<()> {
        let Some(variant_id) = line.variant_id else {
            return Err(Error::MissingVariant {
                product_id: line.product_id,
            });
        };

        let item = NewRemoteItem {
            product_id: line.product_id,
            variant_id,
            color: line.color.clone(),
            size: line.size.clone(),
            quantity: line.quantity,
        };

        if let Some(id) = remote.add_item(&item).await? {
            self.snapshot.write().set_remote_line_id(key, id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::MemoryCookieJar;
    use crate::config::AnonymousConfig;
    use crate::port::auth_channel;
    use crate::testkit::remote::MockRemoteCart;
    use crate::testkit::domain::new_line;

    fn anonymous_store() -> AnonymousCartStore {
        AnonymousCartStore::new(Arc::new(MemoryCookieJar::new()), &AnonymousConfig::default())
    }

    #[tokio::test]
    async fn initialize_runs_at_most_once() {
        let remote = Arc::new(MockRemoteCart::new());
        let (auth, rx) = auth_channel();
        auth.resolve(true);

        let store = CartStore::new(remote.clone(), anonymous_store(), rx, &StoreConfig::default());
        store.initialize().await;
        store.initialize().await;

        assert_eq!(remote.get_cart_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_refresh_calls_resolve_once() {
        let remote = Arc::new(MockRemoteCart::new());
        remote.delay_get(Duration::from_millis(50));
        let (auth, rx) = auth_channel();
        auth.resolve(true);

        let store = CartStore::new(remote.clone(), anonymous_store(), rx, &StoreConfig::default());
        store.initialize().await;
        assert_eq!(remote.get_cart_calls(), 1);

        // The second call lands while the first is still in flight and must
        // not issue its own fetch.
        tokio::join!(store.refresh(), store.refresh());
        assert_eq!(remote.get_cart_calls(), 2);
    }

    #[tokio::test]
    async fn unauthenticated_initialize_adopts_anonymous_lines() {
        let anonymous = anonymous_store();
        anonymous
            .merge_add(&CartLine::from(new_line(1, "black", "M", 2)))
            .await
            .unwrap();

        let (auth, rx) = auth_channel();
        auth.resolve(false);

        let store = CartStore::new(
            Arc::new(MockRemoteCart::new()),
            anonymous,
            rx,
            &StoreConfig::default(),
        );
        store.initialize().await;

        assert_eq!(store.total_items(), 2);
        assert_eq!(store.last_published_count(), 2);
    }

    #[tokio::test]
    async fn count_is_published_after_each_mutation() {
        let (auth, rx) = auth_channel();
        auth.resolve(false);
        let store = CartStore::new(
            Arc::new(MockRemoteCart::new()),
            anonymous_store(),
            rx,
            &StoreConfig::default(),
        );
        store.initialize().await;

        store.add_to_cart(new_line(1, "black", "M", 2)).await;
        assert_eq!(store.last_published_count(), 2);

        store
            .update_quantity(&new_line(1, "black", "M", 2).key(), 5)
            .await
            .unwrap();
        assert_eq!(store.last_published_count(), 5);

        store.clear_cart().await;
        assert_eq!(store.last_published_count(), 0);
    }
}
