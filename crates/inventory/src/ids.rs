//! Identifiers of the entities the ledger talks about.
//!
//! Catalog and production entities are owned by the surrounding application;
//! the ledger only stores their ids.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use plantledger_core::uuid_newtype;

macro_rules! ledger_ids {
    ($($(#[$meta:meta])* $t:ident => $name:literal;)+) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct $t(Uuid);

            uuid_newtype!($t, $name);
        )+
    };
}

ledger_ids! {
    /// Raw material (e.g. expandable polystyrene bead grade).
    RawMaterialId => "RawMaterialId";
    /// Block type produced by block production.
    BlockTypeId => "BlockTypeId";
    /// Mold type produced by molded production.
    MoldTypeId => "MoldTypeId";
    /// Storage silo holding raw material.
    SiloId => "SiloId";
    /// Finished-goods warehouse ("almoxarifado").
    WarehouseId => "WarehouseId";
    /// Production pointing: allocation of raw material to a production run.
    ProductionPointingId => "ProductionPointingId";
    BlockProductionId => "BlockProductionId";
    MoldedProductionId => "MoldedProductionId";
    MovementId => "MovementId";
    ReservationId => "ReservationId";
}
