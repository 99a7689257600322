//! Inventory service: the three write entry points plus read helpers.
//!
//! Each entry point plans its movements with the pure planners of
//! `plantledger-inventory` and applies the plan in exactly one store
//! transaction. On any error the transaction is rolled back, so deletions,
//! insertions and the reservation update land together or not at all.
//!
//! ```text
//! reserve_for_production_pointing
//!   plan_reservation -> reservation_tracker::reserve
//!
//! sync_block_production / sync_molded_production
//!   plan_production_sync -> movement_ledger::replace_movements
//!                        -> reservation_tracker::fulfill (raw material only)
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use plantledger_core::{DomainError, UserId};
use plantledger_inventory::{
    BlockProduction, ItemRef, LocationRef, MoldedProduction, Movement, MovementReference,
    ProductionEvent, ProductionPointing, ProductionPointingId, Reservation, SyncPlan,
    plan_production_sync, plan_reservation, stock_balance,
};

use crate::movement_ledger::replace_movements;
use crate::reservation_tracker;
use crate::store::{LedgerStore, LedgerTx, StoreError};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What one production sync wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub reference: MovementReference,
    /// The complete movement set now stored for `reference`.
    pub movements: Vec<Movement>,
    /// Reservation after fulfillment; `None` when there was nothing to fulfill.
    pub reservation: Option<Reservation>,
}

impl SyncOutcome {
    /// Total raw material booked as `out` by this sync.
    pub fn consumed_kg(&self) -> Decimal {
        self.movements
            .iter()
            .filter(|m| matches!(m.item, ItemRef::RawMaterial(_)))
            .map(|m| m.quantity)
            .sum()
    }
}

/// Reservation and movement bookkeeping over a [`LedgerStore`].
#[derive(Debug, Clone)]
pub struct InventoryService<S> {
    store: S,
}

impl<S> InventoryService<S>
where
    S: LedgerStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reserve the pointing's raw material.
    ///
    /// A pointing without raw material or with no positive quantity is
    /// skipped (`Ok(None)`) without opening a transaction.
    #[instrument(
        skip(self, pointing),
        fields(production_pointing_id = %pointing.id),
        err
    )]
    pub async fn reserve_for_production_pointing(
        &self,
        pointing: &ProductionPointing,
        actor: Option<UserId>,
    ) -> Result<Option<Reservation>, SyncError> {
        let now = Utc::now();
        let Some(plan) = plan_reservation(pointing, actor, now) else {
            debug!("pointing has no raw material or quantity; nothing to reserve");
            return Ok(None);
        };

        let mut tx = self.store.begin().await?;
        let result = reservation_tracker::reserve(tx.as_mut(), plan, now).await;
        let reservation = finish(tx, result).await?;

        info!(
            reserved_kg = %reservation.reserved_kg(),
            status = reservation.status().as_str(),
            "raw material reserved"
        );
        Ok(Some(reservation))
    }

    #[instrument(
        skip(self, block),
        fields(block_production_id = %block.id, is_scrap = block.is_scrap),
        err
    )]
    pub async fn sync_block_production(
        &self,
        block: &BlockProduction,
        actor: Option<UserId>,
    ) -> Result<SyncOutcome, SyncError> {
        self.sync_production(block, actor).await
    }

    #[instrument(
        skip(self, molded),
        fields(molded_production_id = %molded.id),
        err
    )]
    pub async fn sync_molded_production(
        &self,
        molded: &MoldedProduction,
        actor: Option<UserId>,
    ) -> Result<SyncOutcome, SyncError> {
        self.sync_production(molded, actor).await
    }

    async fn sync_production<E>(
        &self,
        event: &E,
        actor: Option<UserId>,
    ) -> Result<SyncOutcome, SyncError>
    where
        E: ProductionEvent + ?Sized,
    {
        let plan = plan_production_sync(event, actor);
        let now = Utc::now();

        let mut tx = self.store.begin().await?;
        let result = apply_sync_plan(tx.as_mut(), plan, now).await;
        let outcome = finish(tx, result).await?;

        info!(
            reference = %outcome.reference,
            movements = outcome.movements.len(),
            consumed_kg = %outcome.consumed_kg(),
            reservation_closed = outcome.reservation.as_ref().map(Reservation::is_closed),
            "production synced"
        );
        Ok(outcome)
    }

    pub async fn reservation_for(
        &self,
        production_pointing_id: ProductionPointingId,
    ) -> Result<Option<Reservation>, SyncError> {
        Ok(self.store.reservation(production_pointing_id).await?)
    }

    pub async fn movements_for(
        &self,
        reference: MovementReference,
    ) -> Result<Vec<Movement>, SyncError> {
        Ok(self.store.movements_for_reference(reference).await?)
    }

    /// On-hand quantity of `item`; `location = None` sums every location.
    pub async fn stock_on_hand(
        &self,
        item: ItemRef,
        location: Option<LocationRef>,
    ) -> Result<Decimal, SyncError> {
        let movements = self.store.movements_for_item(item).await?;
        Ok(stock_balance(&movements, item, location))
    }
}

async fn apply_sync_plan(
    tx: &mut dyn LedgerTx,
    plan: SyncPlan,
    now: DateTime<Utc>,
) -> Result<SyncOutcome, SyncError> {
    let movements = replace_movements(&mut *tx, plan.reference, plan.movements).await?;

    let reservation = match plan.consumption {
        Some(consumption) => {
            reservation_tracker::fulfill(
                tx,
                consumption.production_pointing_id,
                consumption.quantity_kg,
                now,
            )
            .await?
        }
        None => None,
    };

    Ok(SyncOutcome {
        reference: plan.reference,
        movements,
        reservation,
    })
}

/// Commit on success, roll back on failure.
async fn finish<T>(tx: Box<dyn LedgerTx>, result: Result<T, SyncError>) -> Result<T, SyncError> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "rollback failed");
            }
            Err(err)
        }
    }
}
