//! Reservation tracker: reserved vs. consumed raw material per production
//! pointing.
//!
//! Both operations run inside the caller's transaction and leave committing
//! to it.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::debug;

use plantledger_inventory::{
    MovementReference, ProductionPointingId, Reservation, ReservationId, ReservationPlan,
};

use crate::movement_ledger::replace_movements;
use crate::production_sync::SyncError;
use crate::store::LedgerTx;

/// Create or update the pointing's reservation and rewrite its `reserve`
/// movement.
///
/// The reserved quantity is last-write-wins; status is recomputed against
/// whatever was already consumed.
pub async fn reserve(
    tx: &mut dyn LedgerTx,
    plan: ReservationPlan,
    now: DateTime<Utc>,
) -> Result<Reservation, SyncError> {
    let reservation = match tx.find_reservation(plan.production_pointing_id).await? {
        Some(mut existing) => {
            existing.reserve(plan.raw_material_id, plan.quantity_kg, now)?;
            existing
        }
        None => Reservation::open(
            ReservationId::new(),
            plan.production_pointing_id,
            plan.raw_material_id,
            plan.quantity_kg,
            now,
        )?,
    };

    tx.save_reservation(&reservation).await?;

    replace_movements(
        tx,
        MovementReference::ProductionPointing(plan.production_pointing_id),
        vec![plan.movement],
    )
    .await?;

    Ok(reservation)
}

/// Book `consumed_kg` against the pointing's reservation.
///
/// Returns `None` without writing anything when the pointing was never
/// reserved.
pub async fn fulfill(
    tx: &mut dyn LedgerTx,
    production_pointing_id: ProductionPointingId,
    consumed_kg: Decimal,
    now: DateTime<Utc>,
) -> Result<Option<Reservation>, SyncError> {
    let Some(mut reservation) = tx.find_reservation(production_pointing_id).await? else {
        debug!(%production_pointing_id, "no reservation to fulfill");
        return Ok(None);
    };

    reservation.fulfill(consumed_kg, now);
    tx.save_reservation(&reservation).await?;

    Ok(Some(reservation))
}
