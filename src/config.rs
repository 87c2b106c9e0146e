//! Configuration loader for the `aria-pipeline` backend and batch loader.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). By consolidating configuration logic here, we
//! avoid scattering `env::var` calls throughout the codebase.
use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use chrono::{NaiveDate, NaiveDateTime};

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_u32 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u32>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// PostgreSQL connection string.
    pub db_url: String,

    /// Maximum number of database connections in the pool.
    pub db_pool_max: u32,

    /// Address the API server binds to.
    pub bind_addr: String,

    /// Path to the sensor registry CSV export (loader only).
    pub sensors_csv: Option<PathBuf>,

    /// Path to the raw measurements CSV export (loader only).
    pub measurements_csv: Option<PathBuf>,

    /// First calendar year excluded from the load.
    pub cutoff_year: i32,

    /// Measurements at or after this instant are excluded from the load.
    pub cutoff: NaiveDateTime,
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `DATABASE_URL` – PostgreSQL connection string
///
/// Optional:
/// - `DB_POOL_MAX` – max DB connections (default: 5)
/// - `BIND_ADDR` – API listen address (default: `0.0.0.0:8080`)
/// - `SENSORS_CSV` – sensor registry export, required by `load-data` only
/// - `MEASUREMENTS_CSV` – measurements export, required by `load-data` only
/// - `CUTOFF_YEAR` – first year excluded from the load (default: 2024)
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let db_url = require_env!("DATABASE_URL");
    let db_pool_max = parse_env_u32!("DB_POOL_MAX", 5);
    let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into());
    let sensors_csv = env::var("SENSORS_CSV").ok().map(PathBuf::from);
    let measurements_csv = env::var("MEASUREMENTS_CSV").ok().map(PathBuf::from);

    let cutoff_year = parse_env_u32!("CUTOFF_YEAR", 2024) as i32;
    let cutoff = NaiveDate::from_ymd_opt(cutoff_year, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| anyhow!("Invalid CUTOFF_YEAR: {}", cutoff_year))?;

    Ok(Config {
        db_url,
        db_pool_max,
        bind_addr,
        sensors_csv,
        measurements_csv,
        cutoff_year,
        cutoff,
    })
}

impl Config {
    /// Path to the sensor registry export, or an error when the loader was
    /// started without one.
    pub fn sensors_csv(&self) -> Result<&PathBuf> {
        // ---
        self.sensors_csv
            .as_ref()
            .ok_or_else(|| anyhow!("SENSORS_CSV must be set in .env or environment"))
    }

    /// Path to the measurements export, or an error when the loader was
    /// started without one.
    pub fn measurements_csv(&self) -> Result<&PathBuf> {
        // ---
        self.measurements_csv
            .as_ref()
            .ok_or_else(|| anyhow!("MEASUREMENTS_CSV must be set in .env or environment"))
    }

    /// Log the loaded configuration for debugging purposes.
    ///
    /// Masks sensitive information like database passwords while showing
    /// all configuration values that were loaded.
    pub fn log_config(&self) {
        // ---
        // Mask the password in the database URL for security
        let masked_db_url = if let Some(at_pos) = self.db_url.rfind('@') {
            if let Some(colon_pos) = self.db_url[..at_pos].rfind(':') {
                format!(
                    "{}:****{}",
                    &self.db_url[..colon_pos],
                    &self.db_url[at_pos..]
                )
            } else {
                self.db_url.clone()
            }
        } else {
            self.db_url.clone()
        };

        tracing::info!("Configuration loaded:");
        tracing::info!("  DATABASE_URL     : {}", masked_db_url);
        tracing::info!("  DB_POOL_MAX      : {}", self.db_pool_max);
        tracing::info!("  BIND_ADDR        : {}", self.bind_addr);
        tracing::info!("  SENSORS_CSV      : {:?}", self.sensors_csv);
        tracing::info!("  MEASUREMENTS_CSV : {:?}", self.measurements_csv);
        tracing::info!("  CUTOFF_YEAR      : {}", self.cutoff_year);
    }
}
