//! Movement planning for reservations and production events.
//!
//! Planning is pure: it turns the current state of a pointing or production
//! event into the complete set of movements that should exist for it. The
//! infra layer deletes whatever was stored for the reference and writes the
//! plan, which makes every resync idempotent.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

use plantledger_core::UserId;

use crate::ids::{ProductionPointingId, RawMaterialId, SiloId};
use crate::movement::{Direction, NewMovement, Unit};
use crate::production::{ProductionEvent, ProductionPointing};
use crate::refs::{ItemRef, LocationRef, MovementReference};

/// Decimal places kept on per-silo shares (gram precision).
pub const QUANTITY_SCALE: u32 = 3;

/// Split `total` across `silos`.
///
/// Every silo but the last gets `total / n` truncated to [`QUANTITY_SCALE`];
/// the last one takes the remainder so the shares always sum to `total`.
/// Without silos the whole quantity is attributed to no location.
pub fn split_across_silos(total: Decimal, silos: &[SiloId]) -> Vec<(Option<LocationRef>, Decimal)> {
    let Some((last, rest)) = silos.split_last() else {
        return vec![(None, total)];
    };

    let n = Decimal::from(silos.len());
    let share = (total / n).round_dp_with_strategy(QUANTITY_SCALE, RoundingStrategy::ToZero);

    let mut shares = Vec::with_capacity(silos.len());
    for silo in rest {
        shares.push((Some(LocationRef::Silo(*silo)), share));
    }
    let remainder = total - share * Decimal::from(rest.len());
    shares.push((Some(LocationRef::Silo(*last)), remainder));
    shares
}

/// Consumption to book against a pointing's reservation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Consumption {
    pub production_pointing_id: ProductionPointingId,
    /// Full consumed quantity (not the per-silo share).
    pub quantity_kg: Decimal,
}

/// Everything a production sync writes for one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPlan {
    pub reference: MovementReference,
    pub movements: Vec<NewMovement>,
    /// `None` when the pointing has no raw material.
    pub consumption: Option<Consumption>,
}

impl SyncPlan {
    pub fn quantity_for(&self, direction: Direction) -> Decimal {
        self.movements
            .iter()
            .filter(|m| m.direction == direction)
            .map(|m| m.quantity)
            .sum()
    }
}

/// Plan the movements of a block or molded production event.
pub fn plan_production_sync<E>(event: &E, actor: Option<UserId>) -> SyncPlan
where
    E: ProductionEvent + ?Sized,
{
    let reference = event.reference();
    let occurred_at = event.produced_at();
    let pointing = event.pointing();

    let mut movements = Vec::new();

    let consumption = pointing.raw_material_id.map(|raw_material_id| {
        let consumed = event.consumed_kg();
        for (location, share) in split_across_silos(consumed, event.silos()) {
            movements.push(NewMovement {
                occurred_at,
                item: ItemRef::RawMaterial(raw_material_id),
                location,
                direction: Direction::Out,
                quantity: share,
                unit: Unit::Kg,
                reference,
                notes: Some(format!("raw material consumed by {}", event.label())),
                created_by: actor,
            });
        }
        Consumption {
            production_pointing_id: pointing.id,
            quantity_kg: consumed,
        }
    });

    let produced = event.produced_stock();
    movements.push(NewMovement {
        occurred_at,
        item: produced.item,
        location: produced.location,
        direction: produced.direction,
        quantity: produced.quantity,
        unit: Unit::Kg,
        reference,
        notes: Some(produced.notes),
        created_by: actor,
    });

    SyncPlan {
        reference,
        movements,
        consumption,
    }
}

/// What `reserve` writes for a fully configured pointing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationPlan {
    pub production_pointing_id: ProductionPointingId,
    pub raw_material_id: RawMaterialId,
    pub quantity_kg: Decimal,
    /// The single location-less `reserve` movement for the pointing.
    pub movement: NewMovement,
}

/// Plan a pointing's reservation; `None` when raw material or quantity is missing.
pub fn plan_reservation(
    pointing: &ProductionPointing,
    actor: Option<UserId>,
    now: DateTime<Utc>,
) -> Option<ReservationPlan> {
    let (raw_material_id, quantity_kg) = pointing.reservation_request()?;
    Some(ReservationPlan {
        production_pointing_id: pointing.id,
        raw_material_id,
        quantity_kg,
        movement: NewMovement {
            occurred_at: now,
            item: ItemRef::RawMaterial(raw_material_id),
            location: None,
            direction: Direction::Reserve,
            quantity: quantity_kg,
            unit: Unit::Kg,
            reference: MovementReference::ProductionPointing(pointing.id),
            notes: Some("raw material reserved for production pointing".to_string()),
            created_by: actor,
        },
    })
}
