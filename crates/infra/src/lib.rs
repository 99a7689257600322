//! Infrastructure layer: storage, configuration, and the production sync service.
//!
//! The domain crate decides *what* movements and reservation changes a
//! pointing or production event implies; this crate applies them atomically
//! against a [`store::LedgerStore`].

pub mod config;
pub mod movement_ledger;
pub mod production_sync;
pub mod reservation_tracker;
pub mod store;

#[cfg(test)]
mod integration_tests;

pub use production_sync::{InventoryService, SyncError, SyncOutcome};
