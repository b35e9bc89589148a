//! In-memory [`RemoteCart`] mock with scripted failures and call recording.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::{CartLine, LineId, RemoteLineId};
use crate::error::{Error, RemoteCartError, Result};
use crate::port::{NewRemoteItem, RemoteCart, RemoteCartView};

/// Remote operations that can be scripted to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteOp {
    Get,
    Add,
    Update,
    Remove,
    Clear,
    Merge,
}

/// A fake cart server: holds its own line list, performs the server-defined
/// identity-key merge on add and on anonymous merge, and records every call.
///
/// Failures are scripted per operation with [`MockRemoteCart::fail_on`] and
/// stay in force until [`MockRemoteCart::succeed_on`]; a scripted failure
/// surfaces as a 503 status error.
#[derive(Default)]
pub struct MockRemoteCart {
    lines: Mutex<Vec<CartLine>>,
    merge_source: Mutex<Vec<CartLine>>,
    failing: Mutex<HashSet<RemoteOp>>,
    /// When set, `add_item` succeeds but reports no created-line id, as some
    /// deployments do.
    suppress_ids: AtomicBool,
    /// When set, `get_cart` sleeps this long before responding.
    get_delay: Mutex<Option<Duration>>,
    next_id: AtomicU64,
    get_calls: AtomicUsize,
    merge_calls: AtomicUsize,
    clear_calls: AtomicUsize,
    add_calls: Mutex<Vec<NewRemoteItem>>,
    update_calls: Mutex<Vec<(RemoteLineId, u32)>>,
    remove_calls: Mutex<Vec<RemoteLineId>>,
}

impl MockRemoteCart {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            ..Self::default()
        }
    }

    /// Seed the server-side cart.
    #[must_use]
    pub fn with_lines(lines: Vec<CartLine>) -> Self {
        let mock = Self::new();
        for mut line in lines {
            if let Some(id) = line.remote_line_id {
                // Keep allocation clear of pre-assigned ids.
                mock.next_id.fetch_max(id.value() + 1, Ordering::SeqCst);
            } else {
                line.remote_line_id = Some(mock.allocate_id());
            }
            mock.lines.lock().push(line);
        }
        mock
    }

    /// Script the cart the server would fold in on `merge_from_anonymous`.
    pub fn set_merge_source(&self, lines: Vec<CartLine>) {
        *self.merge_source.lock() = lines;
    }

    pub fn fail_on(&self, op: RemoteOp) {
        self.failing.lock().insert(op);
    }

    pub fn succeed_on(&self, op: RemoteOp) {
        self.failing.lock().remove(&op);
    }

    /// Make `add_item` stop reporting created-line ids.
    pub fn suppress_add_ids(&self) {
        self.suppress_ids.store(true, Ordering::SeqCst);
    }

    /// Make `get_cart` take this long to respond.
    pub fn delay_get(&self, delay: Duration) {
        *self.get_delay.lock() = Some(delay);
    }

    /// Current server-side lines.
    #[must_use]
    pub fn lines(&self) -> Vec<CartLine> {
        self.lines.lock().clone()
    }

    /// Server-side total item count.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.lines.lock().iter().map(|l| u64::from(l.quantity)).sum()
    }

    #[must_use]
    pub fn get_cart_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn merge_calls(&self) -> usize {
        self.merge_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn clear_calls(&self) -> usize {
        self.clear_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn add_calls(&self) -> Vec<NewRemoteItem> {
        self.add_calls.lock().clone()
    }

    #[must_use]
    pub fn update_calls(&self) -> Vec<(RemoteLineId, u32)> {
        self.update_calls.lock().clone()
    }

    #[must_use]
    pub fn remove_calls(&self) -> Vec<RemoteLineId> {
        self.remove_calls.lock().clone()
    }

    fn allocate_id(&self) -> RemoteLineId {
        RemoteLineId::new(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn check(&self, op: RemoteOp) -> Result<()> {
        if self.failing.lock().contains(&op) {
            return Err(Error::Remote(RemoteCartError::Status { status: 503 }));
        }
        Ok(())
    }

    fn fold_in(lines: &mut Vec<CartLine>, incoming: CartLine, id: RemoteLineId) -> RemoteLineId {
        match lines.iter_mut().find(|l| l.matches(&incoming.key())) {
            Some(existing) => {
                existing.quantity += incoming.quantity;
                existing.remote_line_id.unwrap_or(id)
            }
            None => {
                let mut line = incoming;
                line.remote_line_id = Some(id);
                lines.push(line);
                id
            }
        }
    }
}

#[async_trait]
impl RemoteCart for MockRemoteCart {
    async fn get_cart(&self) -> Result<RemoteCartView> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.check(RemoteOp::Get)?;
        let delay = *self.get_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let lines = self.lines();
        let total_items = lines.iter().map(|l| u64::from(l.quantity)).sum();
        Ok(RemoteCartView { lines, total_items })
    }

    async fn add_item(&self, item: &NewRemoteItem) -> Result<Option<RemoteLineId>> {
        self.add_calls.lock().push(item.clone());
        self.check(RemoteOp::Add)?;

        let incoming = CartLine {
            line_id: LineId::generate(),
            product_id: item.product_id,
            variant_id: Some(item.variant_id),
            name: format!("product-{}", item.product_id),
            unit_price: rust_decimal::Decimal::TEN,
            original_unit_price: rust_decimal::Decimal::TEN,
            quantity: item.quantity,
            color: item.color.clone(),
            size: item.size.clone(),
            image_url: String::new(),
            remote_line_id: None,
        };
        let id = self.allocate_id();
        let assigned = Self::fold_in(&mut self.lines.lock(), incoming, id);
        if self.suppress_ids.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(Some(assigned))
    }

    async fn update_item(&self, id: RemoteLineId, quantity: u32) -> Result<()> {
        self.update_calls.lock().push((id, quantity));
        self.check(RemoteOp::Update)?;

        let mut lines = self.lines.lock();
        match lines.iter_mut().find(|l| l.remote_line_id == Some(id)) {
            Some(line) => {
                line.quantity = quantity;
                Ok(())
            }
            None => Err(Error::Remote(RemoteCartError::Status { status: 404 })),
        }
    }

    async fn remove_item(&self, id: RemoteLineId) -> Result<()> {
        self.remove_calls.lock().push(id);
        self.check(RemoteOp::Remove)?;

        let mut lines = self.lines.lock();
        let before = lines.len();
        lines.retain(|l| l.remote_line_id != Some(id));
        if lines.len() == before {
            return Err(Error::Remote(RemoteCartError::Status { status: 404 }));
        }
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.clear_calls.fetch_add(1, Ordering::SeqCst);
        self.check(RemoteOp::Clear)?;
        self.lines.lock().clear();
        Ok(())
    }

    async fn merge_from_anonymous(&self) -> Result<()> {
        self.merge_calls.fetch_add(1, Ordering::SeqCst);
        self.check(RemoteOp::Merge)?;

        let source = std::mem::take(&mut *self.merge_source.lock());
        let mut lines = self.lines.lock();
        for line in source {
            let id = self.allocate_id();
            Self::fold_in(&mut lines, line, id);
        }
        Ok(())
    }
}
