use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use plantledger_core::{DomainError, DomainResult, UserId};

use crate::ids::MovementId;
use crate::refs::{ItemRef, LocationRef, MovementReference};

/// Kind of stock effect a movement records.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
    Reserve,
    Adjust,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
            Direction::Reserve => "reserve",
            Direction::Adjust => "adjust",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "in" => Ok(Direction::In),
            "out" => Ok(Direction::Out),
            "reserve" => Ok(Direction::Reserve),
            "adjust" => Ok(Direction::Adjust),
            other => Err(DomainError::validation(format!("unknown movement direction '{other}'"))),
        }
    }

    /// Signed effect of `quantity` on on-hand stock.
    ///
    /// Reservations claim stock without moving it.
    pub fn stock_effect(&self, quantity: Decimal) -> Decimal {
        match self {
            Direction::In | Direction::Adjust => quantity,
            Direction::Out => -quantity,
            Direction::Reserve => Decimal::ZERO,
        }
    }
}

/// Unit of measure of a movement quantity.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    Kg,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Kg => "kg",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "kg" => Ok(Unit::Kg),
            other => Err(DomainError::validation(format!("unknown unit '{other}'"))),
        }
    }
}

/// A movement ready to be written (not yet assigned an id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMovement {
    pub occurred_at: DateTime<Utc>,
    pub item: ItemRef,
    pub location: Option<LocationRef>,
    pub direction: Direction,
    /// Signed quantity; only `adjust` movements are negative.
    pub quantity: Decimal,
    pub unit: Unit,
    pub reference: MovementReference,
    pub notes: Option<String>,
    pub created_by: Option<UserId>,
}

/// A stored ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub id: MovementId,
    pub occurred_at: DateTime<Utc>,
    pub item: ItemRef,
    pub location: Option<LocationRef>,
    pub direction: Direction,
    pub quantity: Decimal,
    pub unit: Unit,
    pub reference: MovementReference,
    pub notes: Option<String>,
    pub created_by: Option<UserId>,
}

impl Movement {
    pub fn from_new(id: MovementId, new: NewMovement) -> Self {
        Self {
            id,
            occurred_at: new.occurred_at,
            item: new.item,
            location: new.location,
            direction: new.direction,
            quantity: new.quantity,
            unit: new.unit,
            reference: new.reference,
            notes: new.notes,
            created_by: new.created_by,
        }
    }

    pub fn stock_effect(&self) -> Decimal {
        self.direction.stock_effect(self.quantity)
    }
}

/// On-hand balance of `item` folded from `movements`.
///
/// `location = None` sums every location (including location-less rows);
/// `Some(loc)` only counts rows at that location.
pub fn stock_balance<'a>(
    movements: impl IntoIterator<Item = &'a Movement>,
    item: ItemRef,
    location: Option<LocationRef>,
) -> Decimal {
    movements
        .into_iter()
        .filter(|m| m.item == item)
        .filter(|m| location.is_none() || m.location == location)
        .map(Movement::stock_effect)
        .sum()
}
