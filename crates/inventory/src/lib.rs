//! Inventory reservation & movement ledger domain.
//!
//! This crate contains business rules for raw-material reservations and the
//! stock movement ledger, implemented purely as deterministic domain logic
//! (no IO, no storage). The infra crate applies the plans computed here
//! inside store transactions.

pub mod ids;
pub mod movement;
pub mod plan;
pub mod production;
pub mod refs;
pub mod reservation;

pub use ids::{
    BlockProductionId, BlockTypeId, MoldTypeId, MoldedProductionId, MovementId,
    ProductionPointingId, RawMaterialId, ReservationId, SiloId, WarehouseId,
};
pub use movement::{Direction, Movement, NewMovement, Unit, stock_balance};
pub use plan::{
    Consumption, QUANTITY_SCALE, ReservationPlan, SyncPlan, plan_production_sync, plan_reservation,
    split_across_silos,
};
pub use production::{
    BlockProduction, MoldedProduction, ProducedStock, ProductionEvent, ProductionPointing,
};
pub use refs::{ItemRef, LocationRef, MovementReference};
pub use reservation::{Reservation, ReservationStatus};
