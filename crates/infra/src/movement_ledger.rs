//! Movement ledger writer.
//!
//! Movements are never patched in place: whatever was recorded for a
//! reference is deleted and the freshly planned set is inserted, inside the
//! caller's transaction.

use tracing::debug;

use plantledger_core::DomainError;
use plantledger_inventory::{Movement, MovementReference, NewMovement};

use crate::production_sync::SyncError;
use crate::store::LedgerTx;

/// Replace every movement of `reference` with `movements`.
///
/// All of `movements` must be attributed to `reference`; a foreign movement is
/// rejected before anything is deleted.
pub async fn replace_movements(
    tx: &mut dyn LedgerTx,
    reference: MovementReference,
    movements: Vec<NewMovement>,
) -> Result<Vec<Movement>, SyncError> {
    if let Some(foreign) = movements.iter().find(|m| m.reference != reference) {
        return Err(DomainError::invariant(format!(
            "movement for {} cannot be written under {}",
            foreign.reference, reference
        ))
        .into());
    }

    let deleted = tx.delete_movements(reference).await?;

    let mut written = Vec::with_capacity(movements.len());
    for movement in movements {
        written.push(tx.insert_movement(movement).await?);
    }

    debug!(
        reference = %reference,
        deleted,
        inserted = written.len(),
        "movements replaced"
    );

    Ok(written)
}
