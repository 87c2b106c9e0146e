//! Data models for the air quality pipeline.
//!
//! The two `*CsvRow` structs mirror the raw CSV exports field-for-field;
//! everything downstream of the normalization boundary works on the typed
//! records (`Sensor`, `RawMeasurement`, `DailyAggregate`,
//! `SensorPollutant`) constructed here.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

// ---

/// Timestamp layout used by the measurements export, e.g. `07/05/2023 14:00:00`.
pub const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Magic value the upstream exporter writes for "no reading".
pub const MISSING_VALUE_SENTINEL: f64 = -9999.0;

/// One row of the sensor registry export.
#[derive(Debug, Deserialize)]
pub struct SensorCsvRow {
    // ---
    #[serde(rename = "IdSensore")]
    pub sensor_id: String,
    #[serde(rename = "NomeStazione")]
    pub station_name: String,
    #[serde(rename = "Provincia")]
    pub province: Option<String>,
    #[serde(rename = "lat")]
    pub latitude: Option<f64>,
    #[serde(rename = "lng")]
    pub longitude: Option<f64>,
    #[serde(rename = "NomeTipoSensore")]
    pub pollutant: Option<String>,
}

/// One row of the raw measurements export.
#[derive(Debug, Deserialize)]
pub struct MeasurementCsvRow {
    // ---
    #[serde(rename = "idSensore")]
    pub sensor_id: Option<String>,
    #[serde(rename = "Data")]
    pub timestamp: String,
    #[serde(rename = "Valore")]
    pub value: Option<f64>,
}

/// A monitoring station that made it into the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct Sensor {
    // ---
    pub sensor_id: String,
    pub station_name: String,
    pub province: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

/// A single cleaned, pollutant-resolved reading.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMeasurement {
    // ---
    pub sensor_id: String,
    pub timestamp: NaiveDateTime,
    pub pollutant: String,
    pub value: f64,
}

/// Mean/min/max of one sensor/pollutant's readings within one calendar day.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyAggregate {
    // ---
    pub sensor_id: String,
    pub date: NaiveDate,
    pub pollutant: String,
    pub daily_avg: f64,
    pub daily_min: f64,
    pub daily_max: f64,
}

/// A pollutant a sensor has reported at least once.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SensorPollutant {
    // ---
    pub sensor_id: String,
    pub pollutant: String,
}

// ---

/// Coerce a sensor id to its canonical string form.
///
/// Both CSV exports reference sensors by the same integer id, but a
/// float-typed export renders it as e.g. `"10320.0"`. Ids must compare
/// equal across the two files or the pollutant join drops every record for
/// the sensor, so the trailing `.0` is stripped when the rest is a plain
/// integer. Anything else is kept as-is (trimmed).
pub fn canonical_sensor_id(raw: &str) -> String {
    // ---
    let trimmed = raw.trim();
    match trimmed.strip_suffix(".0") {
        Some(head) if !head.is_empty() && head.chars().all(|c| c.is_ascii_digit()) => {
            head.to_string()
        }
        _ => trimmed.to_string(),
    }
}

/// Whether a reading holds a real measurement.
///
/// Negative readings and the `-9999` sentinel are data-quality noise, not
/// errors. Zero is a legitimate reading.
pub fn value_is_valid(value: f64) -> bool {
    // ---
    value >= 0.0 && value != MISSING_VALUE_SENTINEL
}

impl SensorCsvRow {
    /// Build a catalog entry, or `None` when the station cannot be
    /// geolocated (missing latitude or longitude).
    pub fn into_sensor(self) -> Option<Sensor> {
        // ---
        let latitude = self.latitude?;
        let longitude = self.longitude?;

        Some(Sensor {
            sensor_id: canonical_sensor_id(&self.sensor_id),
            station_name: self.station_name,
            province: self.province,
            latitude,
            longitude,
        })
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    fn registry_row(lat: Option<f64>, lng: Option<f64>) -> SensorCsvRow {
        // ---
        SensorCsvRow {
            sensor_id: "10320".to_string(),
            station_name: "Milano - Verziere".to_string(),
            province: Some("MI".to_string()),
            latitude: lat,
            longitude: lng,
            pollutant: Some("PM10".to_string()),
        }
    }

    #[test]
    fn test_canonical_sensor_id() {
        // ---
        assert_eq!(canonical_sensor_id("10320"), "10320");
        assert_eq!(canonical_sensor_id(" 10320 "), "10320");
        assert_eq!(canonical_sensor_id("10320.0"), "10320");

        // Not float-rendered integers, kept verbatim
        assert_eq!(canonical_sensor_id("10320.5"), "10320.5");
        assert_eq!(canonical_sensor_id("abc.0"), "abc.0");
        assert_eq!(canonical_sensor_id(".0"), ".0");
    }

    #[test]
    fn test_value_validity() {
        // ---
        assert!(value_is_valid(12.5));
        assert!(value_is_valid(0.0)); // zero is a real reading
        assert!(!value_is_valid(-0.1));
        assert!(!value_is_valid(-9999.0));
    }

    #[test]
    fn test_sensor_without_coordinates_is_dropped() {
        // ---
        assert!(registry_row(None, Some(9.19)).into_sensor().is_none());
        assert!(registry_row(Some(45.46), None).into_sensor().is_none());
        assert!(registry_row(None, None).into_sensor().is_none());

        let sensor = registry_row(Some(45.46), Some(9.19)).into_sensor().unwrap();
        assert_eq!(sensor.sensor_id, "10320");
        assert_eq!(sensor.latitude, 45.46);
        assert_eq!(sensor.longitude, 9.19);
    }

    #[test]
    fn test_timestamp_format_matches_export() {
        // ---
        let parsed = NaiveDateTime::parse_from_str("07/05/2023 14:30:00", TIMESTAMP_FORMAT)
            .expect("export layout should parse");
        assert_eq!(parsed.to_string(), "2023-05-07 14:30:00");

        // ISO order is not accepted, the export is day-first
        assert!(NaiveDateTime::parse_from_str("2023-05-07 14:30:00", TIMESTAMP_FORMAT).is_err());
    }
}
