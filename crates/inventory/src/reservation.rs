use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use plantledger_core::{DomainError, DomainResult};

use crate::ids::{ProductionPointingId, RawMaterialId, ReservationId};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Active,
    Closed,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Active => "active",
            ReservationStatus::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "active" => Ok(ReservationStatus::Active),
            "closed" => Ok(ReservationStatus::Closed),
            other => Err(DomainError::validation(format!("unknown reservation status '{other}'"))),
        }
    }

    fn for_quantities(reserved_kg: Decimal, consumed_kg: Decimal) -> Self {
        if consumed_kg >= reserved_kg {
            ReservationStatus::Closed
        } else {
            ReservationStatus::Active
        }
    }
}

/// Raw material claimed by one production pointing, and how much of it the
/// pointing's production events have consumed so far.
///
/// `consumed_kg` only ever grows. It may overshoot `reserved_kg` when
/// production consumes more than was planned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    id: ReservationId,
    production_pointing_id: ProductionPointingId,
    raw_material_id: RawMaterialId,
    reserved_kg: Decimal,
    consumed_kg: Decimal,
    status: ReservationStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Reservation {
    /// Open a new reservation with nothing consumed yet.
    pub fn open(
        id: ReservationId,
        production_pointing_id: ProductionPointingId,
        raw_material_id: RawMaterialId,
        reserved_kg: Decimal,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        ensure_positive(reserved_kg)?;
        Ok(Self {
            id,
            production_pointing_id,
            raw_material_id,
            reserved_kg,
            consumed_kg: Decimal::ZERO,
            status: ReservationStatus::Active,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rehydrate a reservation from storage without re-validating it.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: ReservationId,
        production_pointing_id: ProductionPointingId,
        raw_material_id: RawMaterialId,
        reserved_kg: Decimal,
        consumed_kg: Decimal,
        status: ReservationStatus,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            production_pointing_id,
            raw_material_id,
            reserved_kg,
            consumed_kg,
            status,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> ReservationId {
        self.id
    }

    pub fn production_pointing_id(&self) -> ProductionPointingId {
        self.production_pointing_id
    }

    pub fn raw_material_id(&self) -> RawMaterialId {
        self.raw_material_id
    }

    pub fn reserved_kg(&self) -> Decimal {
        self.reserved_kg
    }

    pub fn consumed_kg(&self) -> Decimal {
        self.consumed_kg
    }

    pub fn status(&self) -> ReservationStatus {
        self.status
    }

    pub fn is_closed(&self) -> bool {
        self.status == ReservationStatus::Closed
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Quantity still expected to be consumed (never negative).
    pub fn remaining_kg(&self) -> Decimal {
        (self.reserved_kg - self.consumed_kg).max(Decimal::ZERO)
    }

    /// Re-point the reservation at a (possibly new) raw material and quantity.
    ///
    /// Last write wins: `reserved_kg` is replaced, not added to. Status is
    /// recomputed against what was already consumed, so raising the
    /// reservation above consumption makes it active again.
    pub fn reserve(
        &mut self,
        raw_material_id: RawMaterialId,
        reserved_kg: Decimal,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        ensure_positive(reserved_kg)?;
        self.raw_material_id = raw_material_id;
        self.reserved_kg = reserved_kg;
        self.status = ReservationStatus::for_quantities(self.reserved_kg, self.consumed_kg);
        self.updated_at = now;
        Ok(())
    }

    /// Record consumption by a production event.
    ///
    /// Negative amounts count as zero. Closes the reservation once consumption
    /// reaches the reserved quantity; a closed reservation stays closed.
    pub fn fulfill(&mut self, consumed_kg: Decimal, now: DateTime<Utc>) {
        self.consumed_kg += consumed_kg.max(Decimal::ZERO);
        if self.consumed_kg >= self.reserved_kg {
            self.status = ReservationStatus::Closed;
        }
        self.updated_at = now;
    }
}

fn ensure_positive(quantity: Decimal) -> DomainResult<()> {
    if quantity <= Decimal::ZERO {
        return Err(DomainError::validation("reserved quantity must be positive"));
    }
    Ok(())
}
