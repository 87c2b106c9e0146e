//! Measurement normalization.
//!
//! Turns the raw measurements export into the cleaned, pollutant-resolved
//! record set that both store writers and the daily aggregator consume.
//! This is a pure transform: the same export and registry always produce
//! the same record set, regardless of row order.

use std::collections::{BTreeSet, HashMap};
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use csv::Reader;

use crate::models::{
    canonical_sensor_id, value_is_valid, MeasurementCsvRow, RawMeasurement, TIMESTAMP_FORMAT,
};

// ---

/// Per-rule drop counts for one normalization pass.
///
/// Validation drops are a data-quality rule, not errors, but the counts are
/// still surfaced in the run summary. A sensor showing up in
/// `unmapped_sensor_ids` lost every one of its records and usually points
/// at a registry/export mismatch upstream.
#[derive(Debug, Default)]
pub struct NormalizeReport {
    // ---
    pub rows_read: usize,
    pub dropped_missing_field: usize,
    pub dropped_after_cutoff: usize,
    pub dropped_unmapped: usize,
    pub dropped_invalid_value: usize,
    pub unmapped_sensor_ids: BTreeSet<String>,
}

/// Read and normalize the measurements export at `path`.
pub fn normalize_file(
    path: &Path,
    pollutant_types: &HashMap<String, String>,
    cutoff: NaiveDateTime,
) -> Result<(Vec<RawMeasurement>, NormalizeReport)> {
    // ---
    let rdr = Reader::from_path(path)
        .with_context(|| format!("failed to open measurements export {}", path.display()))?;
    normalize(rdr, pollutant_types, cutoff)
}

/// Normalize measurement rows from an open CSV reader.
///
/// Per record, in order:
/// 1. parse the timestamp with the fixed day-first layout; a mismatch
///    aborts the run (the export either matches the layout or it is the
///    wrong file)
/// 2. drop records with an empty sensor id or value
/// 3. keep only records strictly before `cutoff`
/// 4. resolve the sensor's declared pollutant type; unresolvable records
///    are dropped and counted
/// 5. drop negative and sentinel values (zero is a real reading)
pub fn normalize<R: Read>(
    mut rdr: Reader<R>,
    pollutant_types: &HashMap<String, String>,
    cutoff: NaiveDateTime,
) -> Result<(Vec<RawMeasurement>, NormalizeReport)> {
    // ---
    let mut records = Vec::new();
    let mut report = NormalizeReport::default();

    for (i, result) in rdr.deserialize::<MeasurementCsvRow>().enumerate() {
        let row = result.with_context(|| format!("measurements row {}", i + 1))?;
        report.rows_read += 1;

        let timestamp = NaiveDateTime::parse_from_str(row.timestamp.trim(), TIMESTAMP_FORMAT)
            .with_context(|| {
                format!(
                    "measurements row {}: timestamp {:?} does not match {}",
                    i + 1,
                    row.timestamp,
                    TIMESTAMP_FORMAT
                )
            })?;

        let (sensor_id, value) = match (row.sensor_id, row.value) {
            (Some(id), Some(value)) => (id, value),
            _ => {
                report.dropped_missing_field += 1;
                continue;
            }
        };

        if timestamp >= cutoff {
            report.dropped_after_cutoff += 1;
            continue;
        }

        let sensor_id = canonical_sensor_id(&sensor_id);
        let Some(pollutant) = pollutant_types.get(&sensor_id) else {
            report.dropped_unmapped += 1;
            report.unmapped_sensor_ids.insert(sensor_id);
            continue;
        };

        if !value_is_valid(value) {
            report.dropped_invalid_value += 1;
            continue;
        }

        records.push(RawMeasurement {
            sensor_id,
            timestamp,
            pollutant: pollutant.clone(),
            value,
        });
    }

    Ok((records, report))
}
