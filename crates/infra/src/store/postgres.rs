//! Postgres-backed ledger store.
//!
//! Tables are created by [`PgLedgerStore::ensure_schema`] (see `schema.sql`).
//! Typed references are flattened into `(kind, uuid)` column pairs and parsed
//! back on read; a row that no longer parses surfaces as
//! [`StoreError::Corrupt`].
//!
//! ## Error Mapping
//!
//! | SQLx error | PostgreSQL code | StoreError |
//! |------------|-----------------|------------|
//! | Database (unique violation) | `23505` | `Concurrency` |
//! | Database (other) | any other | `Database` |
//! | PoolClosed / PoolTimedOut | n/a | `Unavailable` |
//! | anything else | n/a | `Database` |
//!
//! ## Isolation
//!
//! Each [`LedgerTx`] is one SQL transaction at the pool's default isolation
//! level. No row locks are taken; concurrent first reservations of the same
//! pointing are caught by the unique key on `production_pointing_id`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{FromRow, PgPool, Postgres, Row, Transaction};
use tracing::instrument;
use uuid::Uuid;

use plantledger_core::{DomainError, UserId};
use plantledger_inventory::{
    Direction, ItemRef, LocationRef, Movement, MovementId, MovementReference, NewMovement,
    ProductionPointingId, RawMaterialId, Reservation, ReservationId, ReservationStatus, Unit,
};

use super::{LedgerStore, LedgerTx, StoreError};
use crate::config::DatabaseConfig;

const SCHEMA: &str = include_str!("schema.sql");

const RESERVATION_COLUMNS: &str = r#"
    id,
    production_pointing_id,
    raw_material_id,
    reserved_kg,
    consumed_kg,
    status,
    created_at,
    updated_at
"#;

const MOVEMENT_COLUMNS: &str = r#"
    id,
    occurred_at,
    item_type,
    item_id,
    location_type,
    location_id,
    direction,
    quantity,
    unit,
    reference_type,
    reference_id,
    notes,
    created_by
"#;

/// Postgres-backed ledger store.
///
/// `Send + Sync`; clones share the same connection pool.
#[derive(Debug, Clone)]
pub struct PgLedgerStore {
    pool: Arc<PgPool>,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Open a connection pool sized by `config`.
    #[instrument(skip(config), fields(max_connections = config.max_connections), err)]
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect(&config.url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create the ledger tables and indexes if they do not exist yet.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }
}

/// One SQL transaction. Dropping it without `commit` rolls back.
pub struct PgLedgerTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerTx for PgLedgerTx {
    async fn find_reservation(
        &mut self,
        production_pointing_id: ProductionPointingId,
    ) -> Result<Option<Reservation>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM inventory_reservations WHERE production_pointing_id = $1"
        ))
        .bind(production_pointing_id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("find_reservation", e))?;

        row.map(|r| decode::<ReservationRow>(&r).and_then(Reservation::try_from))
            .transpose()
    }

    async fn save_reservation(&mut self, reservation: &Reservation) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO inventory_reservations (
                id,
                production_pointing_id,
                raw_material_id,
                reserved_kg,
                consumed_kg,
                status,
                created_at,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (production_pointing_id)
            DO UPDATE SET
                raw_material_id = EXCLUDED.raw_material_id,
                reserved_kg = EXCLUDED.reserved_kg,
                consumed_kg = EXCLUDED.consumed_kg,
                status = EXCLUDED.status,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(reservation.id().as_uuid())
        .bind(reservation.production_pointing_id().as_uuid())
        .bind(reservation.raw_material_id().as_uuid())
        .bind(reservation.reserved_kg())
        .bind(reservation.consumed_kg())
        .bind(reservation.status().as_str())
        .bind(reservation.created_at())
        .bind(reservation.updated_at())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("save_reservation", e))?;

        Ok(())
    }

    async fn delete_movements(&mut self, reference: MovementReference) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "DELETE FROM inventory_movements WHERE reference_type = $1 AND reference_id = $2",
        )
        .bind(reference.kind())
        .bind(reference.id())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("delete_movements", e))?;

        Ok(result.rows_affected())
    }

    async fn insert_movement(&mut self, movement: NewMovement) -> Result<Movement, StoreError> {
        let id = MovementId::new();

        sqlx::query(
            r#"
            INSERT INTO inventory_movements (
                id,
                occurred_at,
                item_type,
                item_id,
                location_type,
                location_id,
                direction,
                quantity,
                unit,
                reference_type,
                reference_id,
                notes,
                created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(id.as_uuid())
        .bind(movement.occurred_at)
        .bind(movement.item.kind())
        .bind(movement.item.id())
        .bind(movement.location.map(|l| l.kind()))
        .bind(movement.location.map(|l| l.id()))
        .bind(movement.direction.as_str())
        .bind(movement.quantity)
        .bind(movement.unit.as_str())
        .bind(movement.reference.kind())
        .bind(movement.reference.id())
        .bind(movement.notes.as_deref())
        .bind(movement.created_by.map(Uuid::from))
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_movement", e))?;

        Ok(Movement::from_new(id, movement))
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx
            .commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| map_sqlx_error("rollback", e))
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn begin(&self) -> Result<Box<dyn LedgerTx>, StoreError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;
        Ok(Box::new(PgLedgerTx { tx }))
    }

    #[instrument(skip(self), fields(production_pointing_id = %production_pointing_id), err)]
    async fn reservation(
        &self,
        production_pointing_id: ProductionPointingId,
    ) -> Result<Option<Reservation>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM inventory_reservations WHERE production_pointing_id = $1"
        ))
        .bind(production_pointing_id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("reservation", e))?;

        row.map(|r| decode::<ReservationRow>(&r).and_then(Reservation::try_from))
            .transpose()
    }

    #[instrument(skip(self), fields(reference = %reference), err)]
    async fn movements_for_reference(
        &self,
        reference: MovementReference,
    ) -> Result<Vec<Movement>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM inventory_movements \
             WHERE reference_type = $1 AND reference_id = $2 ORDER BY seq ASC"
        ))
        .bind(reference.kind())
        .bind(reference.id())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("movements_for_reference", e))?;

        decode_movements(rows)
    }

    #[instrument(skip(self), fields(item_type = item.kind(), item_id = %item.id()), err)]
    async fn movements_for_item(&self, item: ItemRef) -> Result<Vec<Movement>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM inventory_movements \
             WHERE item_type = $1 AND item_id = $2 ORDER BY occurred_at ASC, seq ASC"
        ))
        .bind(item.kind())
        .bind(item.id())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("movements_for_item", e))?;

        decode_movements(rows)
    }
}

fn decode<T>(row: &PgRow) -> Result<T, StoreError>
where
    T: for<'r> FromRow<'r, PgRow>,
{
    T::from_row(row).map_err(|e| StoreError::Corrupt(format!("failed to decode row: {e}")))
}

fn decode_movements(rows: Vec<PgRow>) -> Result<Vec<Movement>, StoreError> {
    rows.iter()
        .map(|r| decode::<MovementRow>(r).and_then(Movement::try_from))
        .collect()
}

fn corrupt(err: DomainError) -> StoreError {
    StoreError::Corrupt(err.to_string())
}

/// Map SQLx errors to StoreError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Concurrency(msg),
                _ => StoreError::Database(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("connection pool closed in {operation}"))
        }
        sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable(format!("timed out acquiring a connection in {operation}"))
        }
        other => StoreError::Database(format!("sqlx error in {operation}: {other}")),
    }
}

// SQLx row types

#[derive(Debug, Clone)]
struct ReservationRow {
    id: Uuid,
    production_pointing_id: Uuid,
    raw_material_id: Uuid,
    reserved_kg: Decimal,
    consumed_kg: Decimal,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for ReservationRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ReservationRow {
            id: row.try_get("id")?,
            production_pointing_id: row.try_get("production_pointing_id")?,
            raw_material_id: row.try_get("raw_material_id")?,
            reserved_kg: row.try_get("reserved_kg")?,
            consumed_kg: row.try_get("consumed_kg")?,
            status: row.try_get("status")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl TryFrom<ReservationRow> for Reservation {
    type Error = StoreError;

    fn try_from(row: ReservationRow) -> Result<Self, Self::Error> {
        Ok(Reservation::from_parts(
            ReservationId::from_uuid(row.id),
            ProductionPointingId::from_uuid(row.production_pointing_id),
            RawMaterialId::from_uuid(row.raw_material_id),
            row.reserved_kg,
            row.consumed_kg,
            ReservationStatus::parse(&row.status).map_err(corrupt)?,
            row.created_at,
            row.updated_at,
        ))
    }
}

#[derive(Debug, Clone)]
struct MovementRow {
    id: Uuid,
    occurred_at: DateTime<Utc>,
    item_type: String,
    item_id: Uuid,
    location_type: Option<String>,
    location_id: Option<Uuid>,
    direction: String,
    quantity: Decimal,
    unit: String,
    reference_type: String,
    reference_id: Uuid,
    notes: Option<String>,
    created_by: Option<Uuid>,
}

impl<'r> FromRow<'r, PgRow> for MovementRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(MovementRow {
            id: row.try_get("id")?,
            occurred_at: row.try_get("occurred_at")?,
            item_type: row.try_get("item_type")?,
            item_id: row.try_get("item_id")?,
            location_type: row.try_get("location_type")?,
            location_id: row.try_get("location_id")?,
            direction: row.try_get("direction")?,
            quantity: row.try_get("quantity")?,
            unit: row.try_get("unit")?,
            reference_type: row.try_get("reference_type")?,
            reference_id: row.try_get("reference_id")?,
            notes: row.try_get("notes")?,
            created_by: row.try_get("created_by")?,
        })
    }
}

impl TryFrom<MovementRow> for Movement {
    type Error = StoreError;

    fn try_from(row: MovementRow) -> Result<Self, Self::Error> {
        Ok(Movement {
            id: MovementId::from_uuid(row.id),
            occurred_at: row.occurred_at,
            item: ItemRef::from_parts(&row.item_type, row.item_id).map_err(corrupt)?,
            location: LocationRef::from_parts(row.location_type.as_deref(), row.location_id)
                .map_err(corrupt)?,
            direction: Direction::parse(&row.direction).map_err(corrupt)?,
            quantity: row.quantity,
            unit: Unit::parse(&row.unit).map_err(corrupt)?,
            reference: MovementReference::from_parts(&row.reference_type, row.reference_id)
                .map_err(corrupt)?,
            notes: row.notes,
            created_by: row.created_by.map(UserId::from_uuid),
        })
    }
}
