//! Database schema management for `aria-pipeline`.
//!
//! Ensures required tables and indexes exist before serving requests or
//! loading data. Applied once on startup from both binaries (EMBP: single
//! gateway call).

use anyhow::Result;
use sqlx::PgPool;

// ---

/// Create or update the database schema (idempotent).
///
/// Creates the sensor catalog, the raw and daily measurement tables, and the
/// sensor-pollutant lookup table. Safe to call on every startup; no-op if
/// objects already exist. The catalog carries a PostGIS point so the
/// dashboard can place stations on a map, so the `postgis` extension is
/// enabled here as well.
///
/// Errors are propagated if any SQL execution fails.
pub async fn create_schema(pool: &PgPool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    sqlx::query("CREATE EXTENSION IF NOT EXISTS postgis;")
        .execute(&mut *tx)
        .await?;

    // Station catalog, one row per sensor. `geom` is derived from
    // longitude/latitude at insert time (SRID 4326).
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sensors (
            sensor_id    VARCHAR(50) PRIMARY KEY,
            station_name VARCHAR(100) NOT NULL,
            province     VARCHAR(50),
            latitude     DOUBLE PRECISION NOT NULL,
            longitude    DOUBLE PRECISION NOT NULL,
            geom         GEOMETRY(Point, 4326)
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Hourly readings, fully replaced on every pipeline run
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS raw_measurements (
            measurement_id SERIAL PRIMARY KEY,
            sensor_id      VARCHAR(50) REFERENCES sensors(sensor_id),
            timestamp      TIMESTAMP NOT NULL,
            pollutant      VARCHAR(50) NOT NULL,
            value          DOUBLE PRECISION NOT NULL
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Precomputed daily aggregates, derived from raw_measurements
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS measurements (
            measurement_id SERIAL PRIMARY KEY,
            sensor_id      VARCHAR(50) REFERENCES sensors(sensor_id),
            timestamp      DATE NOT NULL,
            pollutant      VARCHAR(50) NOT NULL,
            daily_avg      DOUBLE PRECISION NOT NULL,
            daily_min      DOUBLE PRECISION NOT NULL,
            daily_max      DOUBLE PRECISION NOT NULL
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Which pollutants each sensor has ever reported
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sensor_pollutants (
            sensor_id VARCHAR(50) REFERENCES sensors(sensor_id),
            pollutant VARCHAR(50),
            PRIMARY KEY (sensor_id, pollutant)
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Basic indexes for the serving layer's filter/order patterns
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_raw_measurements_sensor_id
            ON raw_measurements (sensor_id);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_raw_measurements_timestamp
            ON raw_measurements (timestamp);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_measurements_sensor_id
            ON measurements (sensor_id);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_measurements_timestamp
            ON measurements (timestamp);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
