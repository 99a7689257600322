//! Apply the ledger schema to the configured Postgres database.
//!
//! Reads `PLANTLEDGER__DATABASE__URL` (or `database.url` in `plantledger.toml`).
//! Safe to run repeatedly.

use plantledger_infra::config::LedgerConfig;
use plantledger_infra::store::PgLedgerStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = LedgerConfig::load()?;
    plantledger_observability::init_with(&config.observability);

    tracing::info!(
        max_connections = config.database.max_connections,
        "connecting to ledger database"
    );
    let store = PgLedgerStore::connect(&config.database).await?;

    store.ensure_schema().await?;
    tracing::info!("ledger schema is up to date");

    Ok(())
}
