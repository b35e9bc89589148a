//! The authoritative in-memory view of the cart.

use rust_decimal::Decimal;

use super::ids::RemoteLineId;
use super::line::{CartLine, LineKey};

/// Insertion-ordered collection of cart lines with derived totals.
///
/// Invariants:
/// - at most one line exists per identity key (merging is mandatory on add)
/// - every stored line has quantity >= 1
///
/// Ordering is insertion order; after a merge with the remote cart it is not
/// guaranteed to match server-side ordering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartSnapshot {
    lines: Vec<CartLine>,
}

impl CartSnapshot {
    /// Create an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from a list of lines, merging any duplicate identity
    /// keys so the uniqueness invariant holds even for untrusted input.
    #[must_use]
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        let mut snapshot = Self::new();
        for line in lines {
            snapshot.merge_add(line);
        }
        snapshot
    }

    /// All lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns true if the cart holds no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }

    /// Sum of quantity x unit price across all lines.
    #[must_use]
    pub fn total_value(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Find the line matching an identity key.
    #[must_use]
    pub fn find(&self, key: &LineKey) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.matches(key))
    }

    /// Add a line, merging quantities into an existing line with the same
    /// identity key. The existing line keeps its `line_id` and
    /// `remote_line_id`. A zero-quantity addition is ignored.
    pub fn merge_add(&mut self, line: CartLine) {
        if line.quantity == 0 {
            return;
        }
        let key = line.key();
        match self.lines.iter_mut().find(|l| l.matches(&key)) {
            Some(existing) => existing.quantity += line.quantity,
            None => self.lines.push(line),
        }
    }

    /// Remove the line matching the key, returning it if it existed.
    pub fn remove(&mut self, key: &LineKey) -> Option<CartLine> {
        let index = self.lines.iter().position(|l| l.matches(key))?;
        Some(self.lines.remove(index))
    }

    /// Replace the matching line's quantity, returning the updated line.
    ///
    /// A quantity of 0 removes the line entirely; a non-positive quantity
    /// never survives in the snapshot.
    pub fn set_quantity(&mut self, key: &LineKey, quantity: u32) -> Option<CartLine> {
        if quantity == 0 {
            return self.remove(key);
        }
        let line = self.lines.iter_mut().find(|l| l.matches(key))?;
        line.quantity = quantity;
        Some(line.clone())
    }

    /// Attach a server-assigned line id to the matching line, once the remote
    /// add call has reported it back.
    pub fn set_remote_line_id(&mut self, key: &LineKey, id: RemoteLineId) {
        if let Some(line) = self.lines.iter_mut().find(|l| l.matches(key)) {
            line.remote_line_id = Some(id);
        }
    }

    /// Drop all lines.
    pub fn clear(&mut self) {
        self.lines.clear();
    }
}
