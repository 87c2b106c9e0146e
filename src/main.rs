//! Application entry point for the `aria-pipeline` API server.
//!
//! This binary orchestrates the full startup sequence for the air quality
//! serving layer, including:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Establishing a PostgreSQL connection pool
//! - Creating the database schema if it does not exist
//! - Mounting all API routes via the `routes` gateway (EMBP pattern)
//! - Binding the Axum HTTP server and serving requests
//!
//! The server is read-only: the tables it serves are maintained by the
//! `load-data` batch binary (`src/bin/load_data.rs`).
//!
//! # Environment Variables
//! - `DATABASE_URL` (**required**) – PostgreSQL connection string
//! - `DB_POOL_MAX` (optional) – maximum number of DB connections (default: 5)
//! - `BIND_ADDR` (optional) – listen address (default: `0.0.0.0:8080`)
//! - `API_LOG_LEVEL` (optional) – log verbosity (default: `debug`)
//! - `API_SPAN_EVENTS` (optional) – span event mode for tracing
use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::Router;
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;

use aria_pipeline::{config, init_tracing, routes, schema};

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

    // Build app from routes gateway (EMBP)
    let app: Router = routes::router(pool.clone());

    let addr: SocketAddr = cfg
        .bind_addr
        .parse()
        .with_context(|| format!("Invalid BIND_ADDR '{}'", cfg.bind_addr))?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
