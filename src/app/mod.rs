//! Application layer: the cart store and its notification bus.

pub mod events;
pub mod store;

pub use events::{CartCount, CartEvents};
pub use store::{CartStore, UpdateFailure};
