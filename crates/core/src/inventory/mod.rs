//! Bag inventory lent to farmers.
//!
//! An item is `Active` while bags are still out and `Completed` once every
//! bag has come back. The status is always derived, never stored.

pub mod summary;
pub mod types;

#[cfg(test)]
mod summary_props;

pub use summary::InventorySummary;
pub use types::{InventoryItem, InventoryStatus, InventoryUpdate, NewInventoryItem};
