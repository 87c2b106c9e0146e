//! Entry point for the `load-data` batch job.
//!
//! One-shot offline run: reads the sensor registry and measurements CSV
//! exports, cleans and aggregates them, and replaces the measurement tables
//! in a single transaction. A failed run leaves the previously loaded
//! dataset untouched; rerun after fixing the source issue.
//!
//! # Environment Variables
//! - `DATABASE_URL` (**required**) – PostgreSQL connection string
//! - `SENSORS_CSV` (**required**) – path to the sensor registry export
//! - `MEASUREMENTS_CSV` (**required**) – path to the measurements export
//! - `CUTOFF_YEAR` (optional) – first year excluded from the load (default: 2024)
//! - `DB_POOL_MAX` (optional) – maximum number of DB connections (default: 5)
use anyhow::Result;
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;

use aria_pipeline::{config, init_tracing, pipeline, schema};

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    init_tracing();
    dotenv().ok();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    tracing::info!("Attempting to connect to database: {}", cfg.db_url);

    let pool = PgPoolOptions::new()
        .max_connections(cfg.db_pool_max)
        .connect(&cfg.db_url)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to database '{}': {}", cfg.db_url, e))?;

    tracing::info!("Successfully connected to database");

    schema::create_schema(&pool).await?;

    let report = pipeline::run(&pool, &cfg).await?;
    tracing::info!("Pipeline report: {:#?}", report);

    Ok(())
}
