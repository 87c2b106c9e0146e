//! Store writers for the catalog and measurement tables.
//!
//! The three measurement tables are replaced in full on every run: delete
//! everything, then bulk-insert the new set. All writers run on the caller's
//! transaction, so a failed run rolls back to the previous complete dataset
//! instead of leaving a half-replaced table.

use anyhow::Result;
use sqlx::{Postgres, QueryBuilder, Transaction};
use tracing::debug;

use crate::models::{DailyAggregate, RawMeasurement, Sensor, SensorPollutant};

// ---

/// Rows per bulk INSERT statement. Throughput knob only; keeps each
/// statement well below the Postgres bind-parameter limit.
const INSERT_CHUNK: usize = 10_000;

/// Insert catalog entries, leaving already-known sensor ids untouched.
///
/// First-write-wins across runs: an existing row is never updated, so the
/// registry load stays idempotent. Returns how many rows were actually new.
pub async fn upsert_sensors(
    tx: &mut Transaction<'_, Postgres>,
    sensors: &[Sensor],
) -> Result<u64> {
    // ---
    let mut inserted = 0u64;

    for sensor in sensors {
        let result = sqlx::query(
            r#"
            INSERT INTO sensors (sensor_id, station_name, province, latitude, longitude, geom)
            VALUES ($1, $2, $3, $4, $5, ST_SetSRID(ST_MakePoint($6, $7), 4326))
            ON CONFLICT (sensor_id) DO NOTHING;
            "#,
        )
        .bind(&sensor.sensor_id)
        .bind(&sensor.station_name)
        .bind(&sensor.province)
        .bind(sensor.latitude)
        .bind(sensor.longitude)
        .bind(sensor.longitude) // point X
        .bind(sensor.latitude) // point Y
        .execute(&mut **tx)
        .await?;

        inserted += result.rows_affected();
    }

    Ok(inserted)
}

/// Replace the full contents of `raw_measurements` with the normalized set.
pub async fn replace_raw_measurements(
    tx: &mut Transaction<'_, Postgres>,
    records: &[RawMeasurement],
) -> Result<()> {
    // ---
    sqlx::query("DELETE FROM raw_measurements;")
        .execute(&mut **tx)
        .await?;

    for chunk in records.chunks(INSERT_CHUNK) {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO raw_measurements (sensor_id, timestamp, pollutant, value) ");
        qb.push_values(chunk, |mut b, r| {
            b.push_bind(&r.sensor_id)
                .push_bind(r.timestamp)
                .push_bind(&r.pollutant)
                .push_bind(r.value);
        });
        qb.build().execute(&mut **tx).await?;
        debug!("raw_measurements: inserted batch of {}", chunk.len());
    }

    Ok(())
}

/// Replace the full contents of the daily `measurements` table.
pub async fn replace_daily_aggregates(
    tx: &mut Transaction<'_, Postgres>,
    aggregates: &[DailyAggregate],
) -> Result<()> {
    // ---
    sqlx::query("DELETE FROM measurements;")
        .execute(&mut **tx)
        .await?;

    for chunk in aggregates.chunks(INSERT_CHUNK) {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO measurements (sensor_id, timestamp, pollutant, daily_avg, daily_min, daily_max) ",
        );
        qb.push_values(chunk, |mut b, a| {
            b.push_bind(&a.sensor_id)
                .push_bind(a.date)
                .push_bind(&a.pollutant)
                .push_bind(a.daily_avg)
                .push_bind(a.daily_min)
                .push_bind(a.daily_max);
        });
        qb.build().execute(&mut **tx).await?;
        debug!("measurements: inserted batch of {}", chunk.len());
    }

    Ok(())
}

/// Replace the sensor-pollutant lookup table.
///
/// Duplicates are not an error; the insert ignores conflicts on the
/// composite key.
pub async fn replace_sensor_pollutants(
    tx: &mut Transaction<'_, Postgres>,
    pairs: &[SensorPollutant],
) -> Result<()> {
    // ---
    sqlx::query("DELETE FROM sensor_pollutants;")
        .execute(&mut **tx)
        .await?;

    for chunk in pairs.chunks(INSERT_CHUNK) {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO sensor_pollutants (sensor_id, pollutant) ");
        qb.push_values(chunk, |mut b, p| {
            b.push_bind(&p.sensor_id).push_bind(&p.pollutant);
        });
        qb.push(" ON CONFLICT DO NOTHING");
        qb.build().execute(&mut **tx).await?;
    }

    Ok(())
}
