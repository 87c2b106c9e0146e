//! Sensor registry loading.
//!
//! Parses the station metadata export into catalog entries and the
//! sensor-to-pollutant-type map the normalizer joins against.

use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use csv::Reader;

use crate::models::{canonical_sensor_id, Sensor, SensorCsvRow};

// ---

/// Parsed view of the sensor registry export.
#[derive(Debug)]
pub struct Registry {
    // ---
    /// Stations with coordinates, deduplicated by sensor id (first row wins).
    pub sensors: Vec<Sensor>,

    /// Declared pollutant type per sensor id. Taken from every registry row,
    /// geolocated or not: measurements are joined on the declared type, not
    /// on catalog membership.
    pub pollutant_types: HashMap<String, String>,

    /// Rows excluded from the catalog because the station cannot be placed
    /// on a map.
    pub skipped_missing_coords: usize,
}

/// Read and parse the sensor registry export at `path`.
pub fn read_registry_file(path: &Path) -> Result<Registry> {
    // ---
    let rdr = Reader::from_path(path)
        .with_context(|| format!("failed to open sensor registry {}", path.display()))?;
    read_registry(rdr)
}

/// Parse registry rows from an open CSV reader.
///
/// A row with an empty latitude or longitude is excluded from the catalog
/// and counted; a non-numeric coordinate is a parse error that aborts the
/// whole run rather than silently thinning the catalog.
pub fn read_registry<R: Read>(mut rdr: Reader<R>) -> Result<Registry> {
    // ---
    let mut sensors = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut pollutant_types: HashMap<String, String> = HashMap::new();
    let mut skipped_missing_coords = 0usize;

    for (i, result) in rdr.deserialize::<SensorCsvRow>().enumerate() {
        let row = result.with_context(|| format!("sensor registry row {}", i + 1))?;

        let sensor_id = canonical_sensor_id(&row.sensor_id);
        if let Some(pollutant) = row.pollutant.clone() {
            pollutant_types.entry(sensor_id).or_insert(pollutant);
        }

        match row.into_sensor() {
            Some(sensor) => {
                if seen.insert(sensor.sensor_id.clone()) {
                    sensors.push(sensor);
                }
            }
            None => skipped_missing_coords += 1,
        }
    }

    Ok(Registry {
        sensors,
        pollutant_types,
        skipped_missing_coords,
    })
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    const HEADER: &str = "IdSensore,NomeStazione,Provincia,lat,lng,NomeTipoSensore\n";

    fn parse(rows: &str) -> Result<Registry> {
        // ---
        let data = format!("{HEADER}{rows}");
        read_registry(Reader::from_reader(data.as_bytes()))
    }

    #[test]
    fn test_missing_coordinates_excluded_but_type_kept() {
        // ---
        let registry = parse(
            "10320,Milano - Verziere,MI,45.46,9.19,PM10\n\
             20011,Bergamo - Garibaldi,BG,,,NO2\n",
        )
        .unwrap();

        assert_eq!(registry.sensors.len(), 1);
        assert_eq!(registry.sensors[0].sensor_id, "10320");
        assert_eq!(registry.skipped_missing_coords, 1);

        // The unlocatable sensor still declares a pollutant type
        assert_eq!(registry.pollutant_types["20011"], "NO2");
    }

    #[test]
    fn test_non_numeric_coordinate_is_fatal() {
        // ---
        let err = parse("10320,Milano - Verziere,MI,not-a-number,9.19,PM10\n").unwrap_err();
        assert!(err.to_string().contains("row 1"), "got: {err:#}");
    }

    #[test]
    fn test_duplicate_ids_first_row_wins() {
        // ---
        let registry = parse(
            "10320,Milano - Verziere,MI,45.46,9.19,PM10\n\
             10320,Milano - Duplicato,MI,40.0,8.0,NO2\n",
        )
        .unwrap();

        assert_eq!(registry.sensors.len(), 1);
        assert_eq!(registry.sensors[0].station_name, "Milano - Verziere");
        assert_eq!(registry.pollutant_types["10320"], "PM10");
    }

    #[test]
    fn test_float_rendered_ids_normalize() {
        // ---
        let registry = parse("10320.0,Milano - Verziere,MI,45.46,9.19,PM10\n").unwrap();
        assert_eq!(registry.sensors[0].sensor_id, "10320");
        assert!(registry.pollutant_types.contains_key("10320"));
    }
}
