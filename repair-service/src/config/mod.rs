use repair_core::config as core_config;
use repair_core::error::AppError;
use secrecy::Secret;
use serde::Deserialize;
use std::env;
use std::time::Duration;

use crate::services::RetryPolicy;

#[derive(Debug, Clone, Deserialize)]
pub struct RepairConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub database: DatabaseConfig,
    pub reconcile: ReconcileConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,
    pub uri: Secret<String>,
    pub name: String,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Mongo,
    Memory,
}

impl std::str::FromStr for DatabaseBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(DatabaseBackend::Mongo),
            "memory" => Ok(DatabaseBackend::Memory),
            _ => Err(format!("Invalid database backend: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ReconcileConfig {
    pub max_retry_ms: u64,
    pub initial_backoff_ms: u64,
}

impl ReconcileConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            initial_interval: Duration::from_millis(self.initial_backoff_ms),
            max_elapsed: Duration::from_millis(self.max_retry_ms),
        }
    }
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            max_retry_ms: 2000,
            initial_backoff_ms: 5,
        }
    }
}

impl RepairConfig {
    pub fn load() -> Result<Self, AppError> {
        // Load common config (handles .env and APP__ prefix)
        let common_config = core_config::Config::load()?;

        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let backend: DatabaseBackend = get_env("DATABASE_BACKEND", Some("mongo"), is_prod)?
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        // The in-memory backend has no connection string to insist on.
        let uri = match backend {
            DatabaseBackend::Mongo => get_env("MONGODB_URI", None, is_prod)?,
            DatabaseBackend::Memory => env::var("MONGODB_URI").unwrap_or_default(),
        };

        let defaults = ReconcileConfig::default();

        Ok(RepairConfig {
            common: common_config,
            database: DatabaseConfig {
                backend,
                uri: Secret::new(uri),
                name: get_env("MONGODB_DATABASE", Some("repair_db"), is_prod)?,
            },
            reconcile: ReconcileConfig {
                max_retry_ms: parse_env("RECONCILE_MAX_RETRY_MS", defaults.max_retry_ms)?,
                initial_backoff_ms: parse_env(
                    "RECONCILE_INITIAL_BACKOFF_MS",
                    defaults.initial_backoff_ms,
                )?,
            },
        })
    }

    /// In-process configuration on a random port, for tests and local runs.
    pub fn in_memory() -> Self {
        RepairConfig {
            common: core_config::Config {
                port: 0,
                ..core_config::Config::default()
            },
            database: DatabaseConfig {
                backend: DatabaseBackend::Memory,
                uri: Secret::new(String::new()),
                name: "repair_db".to_string(),
            },
            reconcile: ReconcileConfig::default(),
        }
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}

fn parse_env(key: &str, default: u64) -> Result<u64, AppError> {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("{} must be a whole number: {}", key, e))
        }),
        Err(_) => Ok(default),
    }
}
