//! Configuration management following 12-factor app principles
//!
//! All configuration is loaded from environment variables to ensure
//! clean separation between code and config.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;

/// Default bound on optimistic-concurrency retries per mutation
pub const DEFAULT_MAX_WRITE_ATTEMPTS: u32 = 3;

/// Which persistence backend the service runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreProvider {
    Postgres,
    Memory,
}

impl std::str::FromStr for StoreProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "postgres" => Ok(StoreProvider::Postgres),
            "memory" => Ok(StoreProvider::Memory),
            other => Err(anyhow::anyhow!(
                "Unknown STORE_PROVIDER: {}. Supported providers: postgres, memory",
                other
            )),
        }
    }
}

/// Workflow policy knobs handed to the curation service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurationSettings {
    /// Whether `revision-minor` projects may be published without another review
    pub publish_minor_revisions: bool,
    /// How many times a mutation is re-applied after a concurrent write
    pub max_write_attempts: u32,
}

impl Default for CurationSettings {
    fn default() -> Self {
        Self {
            publish_minor_revisions: true,
            max_write_attempts: DEFAULT_MAX_WRITE_ATTEMPTS,
        }
    }
}

/// A user registered at startup when running on the in-memory store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedUser {
    pub username: String,
    /// Role name as written in config, e.g. `business-unit`
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Persistence backend
    pub store_provider: StoreProvider,

    /// Database connection URL (required for the postgres store)
    pub database_url: Option<String>,

    /// JWT validation
    pub jwt_secret: String,
    pub jwt_issuer: Option<String>,
    pub jwt_audience: Option<String>,

    /// Workflow policy
    pub curation: CurationSettings,

    /// Users to register on the in-memory store (`MEMORY_SEED_USERS`)
    pub seed_users: Vec<SeedUser>,

    /// Runtime configuration
    pub rust_log: String,
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let store_provider: StoreProvider = env::var("STORE_PROVIDER")
            .unwrap_or_else(|_| "postgres".to_string())
            .parse()?;

        let database_url = env::var("DATABASE_URL").ok();
        if store_provider == StoreProvider::Postgres && database_url.is_none() {
            return Err(anyhow::anyhow!(
                "DATABASE_URL is required for the postgres store"
            ));
        }

        let config = Self {
            store_provider,
            database_url,

            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET is required"))?,
            jwt_issuer: env::var("JWT_ISSUER").ok(),
            jwt_audience: env::var("JWT_AUDIENCE").ok(),

            curation: CurationSettings {
                publish_minor_revisions: parse_bool(
                    env::var("CURATION_PUBLISH_MINOR_REVISIONS").ok().as_deref(),
                    true,
                ),
                max_write_attempts: env::var("CURATION_MAX_WRITE_ATTEMPTS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .filter(|n| *n > 0)
                    .unwrap_or(DEFAULT_MAX_WRITE_ATTEMPTS),
            },

            seed_users: parse_seed_users(env::var("MEMORY_SEED_USERS").ok().as_deref())?,

            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| "gagasan=debug".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
        };

        Ok(config)
    }
}

/// Parse `name:role` pairs separated by commas; blank entries are skipped
pub fn parse_seed_users(value: Option<&str>) -> Result<Vec<SeedUser>> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };

    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| -> Result<SeedUser> {
            let (username, role) = entry
                .split_once(':')
                .map(|(u, r)| (u.trim(), r.trim()))
                .filter(|(u, r)| !u.is_empty() && !r.is_empty())
                .ok_or_else(|| {
                    anyhow::anyhow!(
                        "Invalid MEMORY_SEED_USERS entry: {}. Expected username:role",
                        entry
                    )
                })?;
            Ok(SeedUser {
                username: username.to_string(),
                role: role.to_string(),
            })
        })
        .collect()
}

/// Lenient boolean parsing for feature flags; unknown values keep the default
fn parse_bool(value: Option<&str>, default: bool) -> bool {
    match value.map(|v| v.trim().to_ascii_lowercase()) {
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => true,
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => false,
        _ => default,
    }
}
