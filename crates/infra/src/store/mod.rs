//! Storage boundary for reservations and movements.
//!
//! The sync service only talks to these traits, so it runs unchanged against
//! the in-memory store (tests/dev) and Postgres (production).
//!
//! ## Transactions
//!
//! Every write goes through a [`LedgerTx`]. Nothing a transaction wrote is
//! visible to other readers until [`LedgerTx::commit`]; dropping a
//! transaction without committing discards all of its writes.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use plantledger_inventory::{
    ItemRef, Movement, MovementReference, NewMovement, ProductionPointingId, Reservation,
};

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryLedgerStore;
pub use postgres::PgLedgerStore;

/// Storage operation error.
///
/// These are infrastructure failures, as opposed to domain errors
/// (validation, invariants).
#[derive(Debug, Error)]
pub enum StoreError {
    /// A concurrent transaction wrote a conflicting row (e.g. two first
    /// reservations for the same pointing).
    #[error("concurrent write conflict: {0}")]
    Concurrency(String),

    #[error("database error: {0}")]
    Database(String),

    /// A stored row could not be decoded into domain types.
    #[error("corrupt row: {0}")]
    Corrupt(String),

    /// The store cannot serve requests (pool closed, lock poisoned).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// One open unit of work against the ledger tables.
#[async_trait]
pub trait LedgerTx: Send {
    /// Reservation of a pointing, as seen by this transaction.
    async fn find_reservation(
        &mut self,
        production_pointing_id: ProductionPointingId,
    ) -> Result<Option<Reservation>, StoreError>;

    /// Insert or update the reservation keyed by its production pointing.
    async fn save_reservation(&mut self, reservation: &Reservation) -> Result<(), StoreError>;

    /// Delete every movement attributed to `reference`; returns the number removed.
    async fn delete_movements(&mut self, reference: MovementReference) -> Result<u64, StoreError>;

    /// Append one movement, assigning its id.
    async fn insert_movement(&mut self, movement: NewMovement) -> Result<Movement, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

/// Ledger persistence: transactional writes plus committed-state reads.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn LedgerTx>, StoreError>;

    async fn reservation(
        &self,
        production_pointing_id: ProductionPointingId,
    ) -> Result<Option<Reservation>, StoreError>;

    /// Movements attributed to `reference`, in insertion order.
    async fn movements_for_reference(
        &self,
        reference: MovementReference,
    ) -> Result<Vec<Movement>, StoreError>;

    /// Every movement of `item`, oldest first.
    async fn movements_for_item(&self, item: ItemRef) -> Result<Vec<Movement>, StoreError>;
}

#[async_trait]
impl<S> LedgerStore for Arc<S>
where
    S: LedgerStore + ?Sized,
{
    async fn begin(&self) -> Result<Box<dyn LedgerTx>, StoreError> {
        (**self).begin().await
    }

    async fn reservation(
        &self,
        production_pointing_id: ProductionPointingId,
    ) -> Result<Option<Reservation>, StoreError> {
        (**self).reservation(production_pointing_id).await
    }

    async fn movements_for_reference(
        &self,
        reference: MovementReference,
    ) -> Result<Vec<Movement>, StoreError> {
        (**self).movements_for_reference(reference).await
    }

    async fn movements_for_item(&self, item: ItemRef) -> Result<Vec<Movement>, StoreError> {
        (**self).movements_for_item(item).await
    }
}
