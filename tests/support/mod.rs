//! Shared wiring for the integration suites.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use trolley::adapter::{AnonymousCartStore, MemoryCookieJar};
use trolley::app::CartStore;
use trolley::config::{AnonymousConfig, StoreConfig};
use trolley::port::{auth_channel, AuthHandle};
use trolley::testkit::remote::MockRemoteCart;

pub struct Harness {
    pub store: CartStore,
    pub remote: Arc<MockRemoteCart>,
    pub anonymous: AnonymousCartStore,
    pub auth: AuthHandle,
}

/// A store wired to a fresh empty mock server and an in-memory cookie jar.
/// Auth starts unresolved; tests resolve it themselves.
pub fn harness() -> Harness {
    harness_with(Arc::new(MockRemoteCart::new()))
}

pub fn harness_with(remote: Arc<MockRemoteCart>) -> Harness {
    let anonymous =
        AnonymousCartStore::new(Arc::new(MemoryCookieJar::new()), &AnonymousConfig::default());
    let (auth, auth_rx) = auth_channel();
    let store = CartStore::new(
        remote.clone(),
        anonymous.clone(),
        auth_rx,
        &StoreConfig::default(),
    );
    Harness {
        store,
        remote,
        anonymous,
        auth,
    }
}

/// Let background tasks (auth watcher, debounce flushes past their quiet
/// period) run to completion. Under paused time this is deterministic.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(700)).await;
}

/// Yield long enough for the auth watcher to process an edge without
/// crossing the debounce window.
pub async fn settle_briefly() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}
