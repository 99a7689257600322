//! Configuration loading and representation.
//!
//! Sources, lowest precedence first:
//! 1. defaults in code
//! 2. an optional `plantledger.toml` (or the file named by `PLANTLEDGER_CONFIG`)
//! 3. `PLANTLEDGER__SECTION__KEY` environment variables (after `.env` is loaded)

use config::{ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

use plantledger_observability::ObservabilityConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    pub database: DatabaseConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL.
    pub url: String,

    /// Maximum number of pooled connections.
    pub max_connections: u32,

    /// Connections kept open while idle.
    pub min_connections: u32,
}

impl LedgerConfig {
    /// Load configuration from `.env`, the config file and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let file = std::env::var("PLANTLEDGER_CONFIG").unwrap_or_else(|_| "plantledger".into());
        let builder = config::Config::builder()
            .add_source(File::with_name(&file).required(false));

        Self::build(builder, Self::environment())
    }

    /// Load configuration from an inline TOML document plus an environment source.
    pub fn from_toml(toml: &str, env: Environment) -> Result<Self, ConfigError> {
        let builder = config::Config::builder().add_source(File::from_str(toml, FileFormat::Toml));
        Self::build(builder, env)
    }

    /// Environment source for `PLANTLEDGER__*` overrides.
    pub fn environment() -> Environment {
        Environment::with_prefix("PLANTLEDGER")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
    }

    fn build(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
        env: Environment,
    ) -> Result<Self, ConfigError> {
        builder
            .set_default("database.max_connections", 5)?
            .set_default("database.min_connections", 0)?
            .add_source(env)
            .build()?
            .try_deserialize()
    }
}
