//! Backend-agnostic cart types: lines, identity keys, snapshots, ids.

pub mod ids;
pub mod line;
pub mod snapshot;

pub use ids::{LineId, ProductId, RemoteLineId, VariantId};
pub use line::{CartLine, LineKey, NewLine};
pub use snapshot::CartSnapshot;
