//! Production entities as handed over by the application layer.
//!
//! These are inputs, fully loaded by the caller (pointing and silo set
//! included). The ledger never persists them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::{
    BlockProductionId, BlockTypeId, MoldTypeId, MoldedProductionId, ProductionPointingId,
    RawMaterialId, SiloId, WarehouseId,
};
use crate::movement::Direction;
use crate::refs::{ItemRef, LocationRef, MovementReference};

/// Allocation of raw material to a production run.
///
/// Raw material and quantity are optional because pointings are often saved
/// before they are fully configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionPointing {
    pub id: ProductionPointingId,
    pub raw_material_id: Option<RawMaterialId>,
    pub quantity_kg: Option<Decimal>,
}

impl ProductionPointing {
    /// Raw material and quantity to reserve, if the pointing is fully configured.
    pub fn reservation_request(&self) -> Option<(RawMaterialId, Decimal)> {
        match (self.raw_material_id, self.quantity_kg) {
            (Some(raw), Some(qty)) if qty > Decimal::ZERO => Some((raw, qty)),
            _ => None,
        }
    }
}

/// Finished stock produced by one production event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducedStock {
    pub item: ItemRef,
    pub location: Option<LocationRef>,
    pub direction: Direction,
    pub quantity: Decimal,
    pub notes: String,
}

/// Common shape of block and molded production for movement planning.
pub trait ProductionEvent {
    /// Reference under which this event's movements are stored.
    fn reference(&self) -> MovementReference;

    fn pointing(&self) -> &ProductionPointing;

    /// Silos the raw material was drawn from (may be empty).
    fn silos(&self) -> &[SiloId];

    /// Raw material consumed by the event, in kg.
    fn consumed_kg(&self) -> Decimal;

    /// Business time of the event; stamped on every movement it produces.
    fn produced_at(&self) -> DateTime<Utc>;

    /// Label used in movement notes (e.g. "block production").
    fn label(&self) -> &'static str;

    fn produced_stock(&self) -> ProducedStock;
}

/// Block molding run output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockProduction {
    pub id: BlockProductionId,
    pub pointing: ProductionPointing,
    pub block_type_id: BlockTypeId,
    pub weight_kg: Decimal,
    /// Scrapped blocks are recorded as a loss instead of finished stock.
    pub is_scrap: bool,
    pub silos: Vec<SiloId>,
    /// Warehouse receiving the finished blocks, when known.
    pub warehouse_id: Option<WarehouseId>,
    pub produced_at: DateTime<Utc>,
}

impl ProductionEvent for BlockProduction {
    fn reference(&self) -> MovementReference {
        MovementReference::BlockProduction(self.id)
    }

    fn pointing(&self) -> &ProductionPointing {
        &self.pointing
    }

    fn silos(&self) -> &[SiloId] {
        &self.silos
    }

    fn consumed_kg(&self) -> Decimal {
        self.weight_kg
    }

    fn produced_at(&self) -> DateTime<Utc> {
        self.produced_at
    }

    fn label(&self) -> &'static str {
        "block production"
    }

    fn produced_stock(&self) -> ProducedStock {
        let item = ItemRef::BlockType(self.block_type_id);
        let location = self.warehouse_id.map(LocationRef::Warehouse);
        if self.is_scrap {
            ProducedStock {
                item,
                location,
                direction: Direction::Adjust,
                quantity: -self.weight_kg,
                notes: "block production scrap".to_string(),
            }
        } else {
            ProducedStock {
                item,
                location,
                direction: Direction::In,
                quantity: self.weight_kg,
                notes: "block production output".to_string(),
            }
        }
    }
}

/// Molded parts run output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoldedProduction {
    pub id: MoldedProductionId,
    pub pointing: ProductionPointing,
    pub mold_type_id: MoldTypeId,
    /// Weight after upstream loss-factor adjustment; both consumed and produced.
    pub total_weight_considered_kg: Decimal,
    pub pieces: u32,
    pub silos: Vec<SiloId>,
    pub warehouse_id: Option<WarehouseId>,
    pub produced_at: DateTime<Utc>,
}

impl ProductionEvent for MoldedProduction {
    fn reference(&self) -> MovementReference {
        MovementReference::MoldedProduction(self.id)
    }

    fn pointing(&self) -> &ProductionPointing {
        &self.pointing
    }

    fn silos(&self) -> &[SiloId] {
        &self.silos
    }

    fn consumed_kg(&self) -> Decimal {
        self.total_weight_considered_kg
    }

    fn produced_at(&self) -> DateTime<Utc> {
        self.produced_at
    }

    fn label(&self) -> &'static str {
        "molded production"
    }

    fn produced_stock(&self) -> ProducedStock {
        ProducedStock {
            item: ItemRef::MoldType(self.mold_type_id),
            location: self.warehouse_id.map(LocationRef::Warehouse),
            direction: Direction::In,
            quantity: self.total_weight_considered_kg,
            notes: format!("molded production output ({} pcs)", self.pieces),
        }
    }
}
