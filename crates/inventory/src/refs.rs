//! Typed references for the ledger's polymorphic columns.
//!
//! Rows store a `(kind, uuid)` pair; in Rust each pair is a sum type so an
//! item can never point at a silo, a reference can never point at a block
//! type, and so on. `kind()`/`from_parts()` are the only bridge to the
//! textual discriminators used by the persistence layer.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use plantledger_core::{DomainError, DomainResult};

use crate::ids::{
    BlockProductionId, BlockTypeId, MoldTypeId, MoldedProductionId, ProductionPointingId,
    RawMaterialId, SiloId, WarehouseId,
};

/// The stock item a movement quantity applies to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum ItemRef {
    RawMaterial(RawMaterialId),
    BlockType(BlockTypeId),
    MoldType(MoldTypeId),
}

impl ItemRef {
    pub const RAW_MATERIAL: &'static str = "raw_material";
    pub const BLOCK_TYPE: &'static str = "block_type";
    pub const MOLD_TYPE: &'static str = "mold_type";

    pub fn kind(&self) -> &'static str {
        match self {
            ItemRef::RawMaterial(_) => Self::RAW_MATERIAL,
            ItemRef::BlockType(_) => Self::BLOCK_TYPE,
            ItemRef::MoldType(_) => Self::MOLD_TYPE,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            ItemRef::RawMaterial(id) => *id.as_uuid(),
            ItemRef::BlockType(id) => *id.as_uuid(),
            ItemRef::MoldType(id) => *id.as_uuid(),
        }
    }

    pub fn from_parts(kind: &str, id: Uuid) -> DomainResult<Self> {
        match kind {
            Self::RAW_MATERIAL => Ok(ItemRef::RawMaterial(RawMaterialId::from_uuid(id))),
            Self::BLOCK_TYPE => Ok(ItemRef::BlockType(BlockTypeId::from_uuid(id))),
            Self::MOLD_TYPE => Ok(ItemRef::MoldType(MoldTypeId::from_uuid(id))),
            other => Err(DomainError::invalid_id(format!("unknown item type '{other}'"))),
        }
    }
}

/// Where a movement happened. Absent location is modelled as `Option::None`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum LocationRef {
    Silo(SiloId),
    Warehouse(WarehouseId),
}

impl LocationRef {
    pub const SILO: &'static str = "silo";
    pub const WAREHOUSE: &'static str = "warehouse";

    pub fn kind(&self) -> &'static str {
        match self {
            LocationRef::Silo(_) => Self::SILO,
            LocationRef::Warehouse(_) => Self::WAREHOUSE,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            LocationRef::Silo(id) => *id.as_uuid(),
            LocationRef::Warehouse(id) => *id.as_uuid(),
        }
    }

    /// Rebuild an optional location from nullable columns.
    ///
    /// Both columns must be present or both absent.
    pub fn from_parts(kind: Option<&str>, id: Option<Uuid>) -> DomainResult<Option<Self>> {
        match (kind, id) {
            (None, None) => Ok(None),
            (Some(Self::SILO), Some(id)) => Ok(Some(LocationRef::Silo(SiloId::from_uuid(id)))),
            (Some(Self::WAREHOUSE), Some(id)) => {
                Ok(Some(LocationRef::Warehouse(WarehouseId::from_uuid(id))))
            }
            (Some(other), Some(_)) => Err(DomainError::invalid_id(format!(
                "unknown location type '{other}'"
            ))),
            _ => Err(DomainError::invalid_id(
                "location type and id must both be set or both be empty",
            )),
        }
    }
}

/// The source event a movement is attributed to.
///
/// Movements are replaced wholesale per reference on every resync.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum MovementReference {
    ProductionPointing(ProductionPointingId),
    BlockProduction(BlockProductionId),
    MoldedProduction(MoldedProductionId),
}

impl MovementReference {
    pub const PRODUCTION_POINTING: &'static str = "production_pointing";
    pub const BLOCK_PRODUCTION: &'static str = "block_production";
    pub const MOLDED_PRODUCTION: &'static str = "molded_production";

    pub fn kind(&self) -> &'static str {
        match self {
            MovementReference::ProductionPointing(_) => Self::PRODUCTION_POINTING,
            MovementReference::BlockProduction(_) => Self::BLOCK_PRODUCTION,
            MovementReference::MoldedProduction(_) => Self::MOLDED_PRODUCTION,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            MovementReference::ProductionPointing(id) => *id.as_uuid(),
            MovementReference::BlockProduction(id) => *id.as_uuid(),
            MovementReference::MoldedProduction(id) => *id.as_uuid(),
        }
    }

    pub fn from_parts(kind: &str, id: Uuid) -> DomainResult<Self> {
        match kind {
            Self::PRODUCTION_POINTING => Ok(MovementReference::ProductionPointing(
                ProductionPointingId::from_uuid(id),
            )),
            Self::BLOCK_PRODUCTION => Ok(MovementReference::BlockProduction(
                BlockProductionId::from_uuid(id),
            )),
            Self::MOLDED_PRODUCTION => Ok(MovementReference::MoldedProduction(
                MoldedProductionId::from_uuid(id),
            )),
            other => Err(DomainError::invalid_id(format!(
                "unknown reference type '{other}'"
            ))),
        }
    }
}

impl core::fmt::Display for MovementReference {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.kind(), self.id())
    }
}
