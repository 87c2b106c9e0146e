//! HTTP contract tests for the air quality API.
//!
//! These run against a live stack: start the server, run `load-data` with
//! the CSV exports, then point `BASE_URL` here (default
//! `http://localhost:8080`). `CUTOFF_YEAR` should match the loader's
//! setting (default 2024).

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use reqwest::Client;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Sensor {
    sensor_id: String,
    station_name: String,
    latitude: f64,
    longitude: f64,
    geometry: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawMeasurement {
    sensor_id: String,
    timestamp: NaiveDateTime,
    pollutant: String,
    value: f64,
}

#[derive(Debug, Deserialize)]
struct DailyMeasurement {
    sensor_id: String,
    date: NaiveDate,
    pollutant: String,
    daily_avg: f64,
    daily_min: f64,
    daily_max: f64,
}

#[derive(Debug, Deserialize)]
struct DateRange {
    first_date: Option<NaiveDate>,
    last_date: Option<NaiveDate>,
}

fn base_url() -> String {
    // ---
    std::env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:8080".into())
}

fn cutoff() -> NaiveDateTime {
    // ---
    let year: i32 = std::env::var("CUTOFF_YEAR")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(2024);
    NaiveDate::from_ymd_opt(year, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

#[tokio::test]
async fn health_endpoint_ok() -> Result<()> {
    // ---
    let resp = Client::new()
        .get(format!("{}/health", base_url()))
        .send()
        .await?;

    assert!(resp.status().is_success());
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["status"], "ok");

    Ok(())
}

#[tokio::test]
async fn sensors_are_geolocated() -> Result<()> {
    // ---
    let url = format!("{}/api/sensors", base_url());
    let sensors: Vec<Sensor> = Client::new().get(&url).send().await?.json().await?;

    assert!(!sensors.is_empty(), "No sensors returned from {}", url);

    for s in &sensors {
        // ---
        assert!(!s.sensor_id.is_empty(), "sensor_id should not be empty");
        assert!(!s.station_name.is_empty(), "station_name should not be empty");

        // Sensors without coordinates never reach the catalog
        assert!(
            s.latitude.is_finite() && s.longitude.is_finite(),
            "sensor {} should be geolocated",
            s.sensor_id
        );

        // The stored point is (longitude, latitude) in SRID 4326
        if let Some(geom) = &s.geometry {
            assert_eq!(geom["type"], "Point", "sensor {} geometry", s.sensor_id);
            let coords = geom["coordinates"]
                .as_array()
                .expect("geometry coordinates");
            assert!((coords[0].as_f64().unwrap() - s.longitude).abs() < 1e-6);
            assert!((coords[1].as_f64().unwrap() - s.latitude).abs() < 1e-6);
        }
    }

    Ok(())
}

#[tokio::test]
async fn raw_measurements_respect_cleaning_rules() -> Result<()> {
    // ---
    let client = Client::new();

    let range: DateRange = client
        .get(format!("{}/api/date_range", base_url()))
        .send()
        .await?
        .json()
        .await?;
    let first = range.first_date.expect("no data loaded");
    assert!(range.last_date.is_some());

    // One day of hourly data is enough to exercise the validation rules
    let url = format!(
        "{}/api/raw_measurements?start={}&end={}",
        base_url(),
        first,
        first
    );
    let rows: Vec<RawMeasurement> = client.get(&url).send().await?.json().await?;
    assert!(!rows.is_empty(), "No raw measurements returned from {}", url);

    let cutoff = cutoff();
    let mut previous: Option<NaiveDateTime> = None;
    for r in &rows {
        // ---
        assert!(r.value >= 0.0, "negative value survived cleaning: {:?}", r);
        assert!(r.value != -9999.0, "sentinel survived cleaning: {:?}", r);
        assert!(
            r.timestamp < cutoff,
            "row past the cutoff survived cleaning: {:?}",
            r
        );
        assert!(!r.sensor_id.is_empty() && !r.pollutant.is_empty());

        // Serving contract: ascending timestamps
        if let Some(prev) = previous {
            assert!(prev <= r.timestamp, "rows not ordered by timestamp");
        }
        previous = Some(r.timestamp);
    }

    Ok(())
}

#[tokio::test]
async fn daily_aggregates_are_consistent() -> Result<()> {
    // ---
    let url = format!("{}/api/measurements", base_url());
    let rows: Vec<DailyMeasurement> = Client::new().get(&url).send().await?.json().await?;

    assert!(!rows.is_empty(), "No daily aggregates returned from {}", url);

    let mut previous: Option<NaiveDate> = None;
    for r in &rows {
        // ---
        assert!(
            r.daily_min <= r.daily_avg && r.daily_avg <= r.daily_max,
            "min/avg/max out of order: {:?}",
            r
        );
        assert!(r.daily_min >= 0.0, "negative daily_min: {:?}", r);
        assert!(!r.sensor_id.is_empty() && !r.pollutant.is_empty());

        if let Some(prev) = previous {
            assert!(prev <= r.date, "rows not ordered by date");
        }
        previous = Some(r.date);
    }

    Ok(())
}

#[tokio::test]
async fn sensor_filter_applies() -> Result<()> {
    // ---
    let client = Client::new();

    let sensors: Vec<Sensor> = client
        .get(format!("{}/api/sensors", base_url()))
        .send()
        .await?
        .json()
        .await?;
    let sensor_id = &sensors.first().expect("no sensors loaded").sensor_id;

    let url = format!("{}/api/measurements?sensor_id={}", base_url(), sensor_id);
    let rows: Vec<DailyMeasurement> = client.get(&url).send().await?.json().await?;

    for r in &rows {
        assert_eq!(&r.sensor_id, sensor_id, "filter leaked another sensor");
    }

    Ok(())
}

#[tokio::test]
async fn unknown_sensor_returns_404() -> Result<()> {
    // ---
    let client = Client::new();

    let resp = client
        .get(format!("{}/api/sensors/__does_not_exist__", base_url()))
        .send()
        .await?;
    assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);

    let resp = client
        .get(format!(
            "{}/api/sensors/__does_not_exist__/measurements",
            base_url()
        ))
        .send()
        .await?;
    assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);

    Ok(())
}
