//! The offline ETL pipeline: ingest, clean, aggregate, load.
//!
//! `run` is the explicit driver for the whole batch: it sequences the named
//! stages in dependency order and fails fast when a stage errors, so no
//! later stage ever runs on partial input. The database writes of a run
//! share one transaction; a crash mid-write rolls back and leaves the
//! previous complete dataset in place.
//!
//! Gateway module (EMBP): the stages live in sibling files and only the
//! driver and its report type are exported to the binaries.

mod aggregate;
mod normalize;
mod registry;
mod store;

use anyhow::{Context, Result};
use sqlx::PgPool;
use tracing::{info, warn};

use crate::config::Config;

pub use normalize::NormalizeReport;

// ---

/// Counters describing one completed pipeline run.
///
/// Referential drops (`dropped_unmapped`) and validation drops are expected
/// filtering, but they are always reported: a sensor that loses every
/// record signals an upstream problem, not a pipeline one.
#[derive(Debug)]
pub struct PipelineReport {
    // ---
    /// Catalog-eligible sensors in the registry export.
    pub sensors_cataloged: usize,

    /// Sensors newly inserted this run (existing ids are left untouched).
    pub sensors_inserted: u64,

    /// Registry rows without coordinates, excluded from the catalog.
    pub sensors_skipped_missing_coords: usize,

    /// Raw measurement rows read from the export.
    pub rows_read: usize,

    /// Cleaned rows loaded into `raw_measurements`.
    pub raw_measurements: usize,

    /// Rows loaded into the daily `measurements` table.
    pub daily_aggregates: usize,

    /// Distinct pairs loaded into `sensor_pollutants`.
    pub sensor_pollutant_pairs: usize,

    /// Rows dropped for an empty sensor id or value.
    pub dropped_missing_field: usize,

    /// Rows at or past the configured cutoff.
    pub dropped_after_cutoff: usize,

    /// Rows whose sensor declares no pollutant type.
    pub dropped_unmapped: usize,

    /// Rows with a negative or sentinel value.
    pub dropped_invalid_value: usize,
}

/// Run the full batch: registry load, normalization, daily aggregation,
/// and the full-replace of the measurement tables.
///
/// Requires `SENSORS_CSV` and `MEASUREMENTS_CSV` to be configured. Source
/// format errors and storage errors abort the run; the previous dataset
/// stays intact because every write happens on one transaction committed
/// at the end.
pub async fn run(pool: &PgPool, cfg: &Config) -> Result<PipelineReport> {
    // ---
    let sensors_csv = cfg.sensors_csv()?;
    let measurements_csv = cfg.measurements_csv()?;

    info!("Stage 1/4: reading sensor registry {}", sensors_csv.display());
    let registry = registry::read_registry_file(sensors_csv)?;
    info!(
        "Registry: {} sensors with coordinates, {} skipped (no coordinates), {} declared pollutant types",
        registry.sensors.len(),
        registry.skipped_missing_coords,
        registry.pollutant_types.len()
    );

    info!(
        "Stage 2/4: normalizing measurements {} (cutoff {})",
        measurements_csv.display(),
        cfg.cutoff
    );
    let (records, norm) =
        normalize::normalize_file(measurements_csv, &registry.pollutant_types, cfg.cutoff)?;
    info!(
        "Normalized {} of {} rows ({} missing fields, {} past cutoff, {} unmapped, {} invalid values)",
        records.len(),
        norm.rows_read,
        norm.dropped_missing_field,
        norm.dropped_after_cutoff,
        norm.dropped_unmapped,
        norm.dropped_invalid_value
    );
    if !norm.unmapped_sensor_ids.is_empty() {
        warn!(
            "{} records referenced {} sensors with no declared pollutant type: {:?}",
            norm.dropped_unmapped, norm.unmapped_sensor_ids.len(), norm.unmapped_sensor_ids
        );
    }

    info!("Stage 3/4: aggregating daily statistics");
    let daily = aggregate::aggregate_daily(&records);
    let pairs = aggregate::sensor_pollutant_pairs(&records);
    info!(
        "Computed {} daily aggregates and {} sensor-pollutant pairs",
        daily.len(),
        pairs.len()
    );

    info!("Stage 4/4: replacing measurement tables");
    let mut tx = pool
        .begin()
        .await
        .context("failed to open the load transaction")?;

    let sensors_inserted = store::upsert_sensors(&mut tx, &registry.sensors)
        .await
        .context("failed to upsert the sensor catalog")?;
    store::replace_raw_measurements(&mut tx, &records)
        .await
        .context("failed to replace raw_measurements")?;
    store::replace_daily_aggregates(&mut tx, &daily)
        .await
        .context("failed to replace measurements")?;
    store::replace_sensor_pollutants(&mut tx, &pairs)
        .await
        .context("failed to replace sensor_pollutants")?;

    tx.commit()
        .await
        .context("failed to commit the load transaction")?;

    let report = PipelineReport {
        sensors_cataloged: registry.sensors.len(),
        sensors_inserted,
        sensors_skipped_missing_coords: registry.skipped_missing_coords,
        rows_read: norm.rows_read,
        raw_measurements: records.len(),
        daily_aggregates: daily.len(),
        sensor_pollutant_pairs: pairs.len(),
        dropped_missing_field: norm.dropped_missing_field,
        dropped_after_cutoff: norm.dropped_after_cutoff,
        dropped_unmapped: norm.dropped_unmapped,
        dropped_invalid_value: norm.dropped_invalid_value,
    };

    info!(
        "Load complete: {} raw rows, {} daily rows, {} pairs ({} new sensors)",
        report.raw_measurements,
        report.daily_aggregates,
        report.sensor_pollutant_pairs,
        report.sensors_inserted
    );

    Ok(report)
}
