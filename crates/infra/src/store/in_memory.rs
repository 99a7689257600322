use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use plantledger_inventory::{
    ItemRef, Movement, MovementId, MovementReference, NewMovement, ProductionPointingId,
    Reservation,
};

use super::{LedgerStore, LedgerTx, StoreError};

#[derive(Debug, Default, Clone)]
struct LedgerState {
    reservations: HashMap<ProductionPointingId, Reservation>,
    /// Insertion order doubles as ledger order.
    movements: Vec<Movement>,
}

/// In-memory ledger store.
///
/// Intended for tests/dev. Transactions are fully serialized: `begin` takes
/// the store lock and works on a copy of the state, `commit` swaps the copy
/// in, and dropping the transaction releases the lock with the state
/// untouched.
#[derive(Debug, Default, Clone)]
pub struct InMemoryLedgerStore {
    state: Arc<Mutex<LedgerState>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed movements across all references.
    pub async fn movement_count(&self) -> usize {
        self.state.lock().await.movements.len()
    }
}

struct InMemoryTx {
    guard: OwnedMutexGuard<LedgerState>,
    working: LedgerState,
}

#[async_trait]
impl LedgerTx for InMemoryTx {
    async fn find_reservation(
        &mut self,
        production_pointing_id: ProductionPointingId,
    ) -> Result<Option<Reservation>, StoreError> {
        Ok(self.working.reservations.get(&production_pointing_id).cloned())
    }

    async fn save_reservation(&mut self, reservation: &Reservation) -> Result<(), StoreError> {
        self.working
            .reservations
            .insert(reservation.production_pointing_id(), reservation.clone());
        Ok(())
    }

    async fn delete_movements(&mut self, reference: MovementReference) -> Result<u64, StoreError> {
        let before = self.working.movements.len();
        self.working.movements.retain(|m| m.reference != reference);
        Ok((before - self.working.movements.len()) as u64)
    }

    async fn insert_movement(&mut self, movement: NewMovement) -> Result<Movement, StoreError> {
        let stored = Movement::from_new(MovementId::new(), movement);
        self.working.movements.push(stored.clone());
        Ok(stored)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let InMemoryTx { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn begin(&self) -> Result<Box<dyn LedgerTx>, StoreError> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(InMemoryTx { guard, working }))
    }

    async fn reservation(
        &self,
        production_pointing_id: ProductionPointingId,
    ) -> Result<Option<Reservation>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.reservations.get(&production_pointing_id).cloned())
    }

    async fn movements_for_reference(
        &self,
        reference: MovementReference,
    ) -> Result<Vec<Movement>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .movements
            .iter()
            .filter(|m| m.reference == reference)
            .cloned()
            .collect())
    }

    async fn movements_for_item(&self, item: ItemRef) -> Result<Vec<Movement>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.movements.iter().filter(|m| m.item == item).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use plantledger_inventory::{
        BlockProductionId, Direction, RawMaterialId, ReservationId, Unit,
    };
    use rust_decimal_macros::dec;

    fn new_movement(reference: MovementReference) -> NewMovement {
        NewMovement {
            occurred_at: Utc::now(),
            item: ItemRef::RawMaterial(RawMaterialId::new()),
            location: None,
            direction: Direction::Out,
            quantity: dec!(10),
            unit: Unit::Kg,
            reference,
            notes: None,
            created_by: None,
        }
    }

    #[tokio::test]
    async fn committed_writes_become_visible() {
        let store = InMemoryLedgerStore::new();
        let reference = MovementReference::BlockProduction(BlockProductionId::new());

        let mut tx = store.begin().await.unwrap();
        tx.insert_movement(new_movement(reference)).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(store.movements_for_reference(reference).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn dropped_transaction_discards_writes() {
        let store = InMemoryLedgerStore::new();
        let pointing = ProductionPointingId::new();
        let reference = MovementReference::ProductionPointing(pointing);

        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_movement(new_movement(reference)).await.unwrap();
            let reservation = Reservation::open(
                ReservationId::new(),
                pointing,
                RawMaterialId::new(),
                dec!(100),
                Utc::now(),
            )
            .unwrap();
            tx.save_reservation(&reservation).await.unwrap();
        }

        assert_eq!(store.movement_count().await, 0);
        assert!(store.reservation(pointing).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_only_touches_the_given_reference() {
        let store = InMemoryLedgerStore::new();
        let a = MovementReference::BlockProduction(BlockProductionId::new());
        let b = MovementReference::BlockProduction(BlockProductionId::new());

        let mut tx = store.begin().await.unwrap();
        tx.insert_movement(new_movement(a)).await.unwrap();
        tx.insert_movement(new_movement(a)).await.unwrap();
        tx.insert_movement(new_movement(b)).await.unwrap();
        assert_eq!(tx.delete_movements(a).await.unwrap(), 2);
        tx.commit().await.unwrap();

        assert!(store.movements_for_reference(a).await.unwrap().is_empty());
        assert_eq!(store.movements_for_reference(b).await.unwrap().len(), 1);
    }
}
