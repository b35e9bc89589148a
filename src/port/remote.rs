//! Remote cart port: the authenticated backend's cart endpoints.

use async_trait::async_trait;

use crate::domain::{CartLine, ProductId, RemoteLineId, VariantId};
use crate::error::Result;

/// The server's view of the cart, as returned by a fetch.
#[derive(Debug, Clone, Default)]
pub struct RemoteCartView {
    pub lines: Vec<CartLine>,
    pub total_items: u64,
}

/// Payload for a remote "add item" call.
#[derive(Debug, Clone)]
pub struct NewRemoteItem {
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub color: String,
    pub size: String,
    pub quantity: u32,
}

/// Authenticated cart operations exposed by the backend.
///
/// All calls fail with a distinguishable error when the network is
/// unavailable or the server returns a non-success status. Implementations
/// must be thread-safe (`Send + Sync`).
#[async_trait]
pub trait RemoteCart: Send + Sync {
    /// Fetch the authoritative remote cart.
    async fn get_cart(&self) -> Result<RemoteCartView>;

    /// Add an item; the server merges identity-key duplicates itself.
    /// Returns the server-assigned line id when the server reports one.
    async fn add_item(&self, item: &NewRemoteItem) -> Result<Option<RemoteLineId>>;

    /// Replace the quantity of a persisted line.
    async fn update_item(&self, id: RemoteLineId, quantity: u32) -> Result<()>;

    /// Delete a persisted line.
    async fn remove_item(&self, id: RemoteLineId) -> Result<()>;

    /// Empty the remote cart.
    async fn clear(&self) -> Result<()>;

    /// Fold the previously-known anonymous cart into the user's remote cart.
    /// How the server identifies the anonymous cart is its own business.
    async fn merge_from_anonymous(&self) -> Result<()>;
}
