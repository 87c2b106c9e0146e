//! Sensor catalog endpoints.
//!
//! Sibling module in the `routes` directory (EMBP): internal to this file
//! are the row/response types and handlers for the `/api/sensors` family;
//! the gateway (`mod.rs`) only sees the exported subrouter.

use axum::{
    extract::Path, extract::Query, extract::State, http::StatusCode, response::IntoResponse,
    routing::get, Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::error;

use super::ErrorBody;

// ---

pub fn router() -> Router<PgPool> {
    // ---
    Router::new()
        .route("/api/sensors", get(list_sensors))
        .route("/api/sensors/{sensor_id}", get(get_sensor))
        .route(
            "/api/sensors/{sensor_id}/measurements",
            get(list_sensor_measurements),
        )
}

/// Catalog row as stored; `geometry` arrives as a GeoJSON string from
/// `ST_AsGeoJSON`.
#[derive(Debug, sqlx::FromRow)]
struct SensorRow {
    // ---
    sensor_id: String,
    station_name: String,
    province: Option<String>,
    latitude: f64,
    longitude: f64,
    geometry: Option<String>,
}

/// Catalog row as served, with the geometry parsed into a JSON object.
#[derive(Serialize)]
struct SensorResponse {
    // ---
    sensor_id: String,
    station_name: String,
    province: Option<String>,
    latitude: f64,
    longitude: f64,
    geometry: Option<serde_json::Value>,
}

impl From<SensorRow> for SensorResponse {
    fn from(row: SensorRow) -> Self {
        // ---
        let geometry = row
            .geometry
            .as_deref()
            .and_then(|g| serde_json::from_str(g).ok());

        SensorResponse {
            sensor_id: row.sensor_id,
            station_name: row.station_name,
            province: row.province,
            latitude: row.latitude,
            longitude: row.longitude,
            geometry,
        }
    }
}

/// Handle `GET /api/sensors`.
async fn list_sensors(State(pool): State<PgPool>) -> impl IntoResponse {
    // ---
    let result = sqlx::query_as::<_, SensorRow>(
        r#"
        SELECT sensor_id, station_name, province, latitude, longitude,
               ST_AsGeoJSON(geom) AS geometry
        FROM sensors
        ORDER BY sensor_id;
        "#,
    )
    .fetch_all(&pool)
    .await;

    match result {
        Ok(rows) => {
            let sensors: Vec<SensorResponse> = rows.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(sensors)).into_response()
        }
        Err(e) => {
            error!("Failed to fetch sensors: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// Handle `GET /api/sensors/{sensor_id}`.
async fn get_sensor(
    Path(sensor_id): Path<String>,
    State(pool): State<PgPool>,
) -> impl IntoResponse {
    // ---
    let result = sqlx::query_as::<_, SensorRow>(
        r#"
        SELECT sensor_id, station_name, province, latitude, longitude,
               ST_AsGeoJSON(geom) AS geometry
        FROM sensors
        WHERE sensor_id = $1;
        "#,
    )
    .bind(&sensor_id)
    .fetch_optional(&pool)
    .await;

    match result {
        Ok(Some(row)) => (StatusCode::OK, Json(SensorResponse::from(row))).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorBody {
                error: "sensor not found".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to fetch sensor {}: {}", sensor_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// Optional date window; `end` is inclusive (the filter extends it by one
/// day, matching how the dashboard sends `YYYY-MM-DD` bounds).
#[derive(Debug, Deserialize)]
struct DateWindowQuery {
    // ---
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

/// Daily aggregates for one sensor; the sensor id is already in the path.
#[derive(Serialize, sqlx::FromRow)]
struct SensorDailyRow {
    // ---
    date: NaiveDate,
    pollutant: String,
    daily_avg: f64,
    daily_min: f64,
    daily_max: f64,
}

/// Handle `GET /api/sensors/{sensor_id}/measurements`.
///
/// Returns 404 when the sensor has no daily aggregates in the window,
/// mirroring the single-sensor lookup.
async fn list_sensor_measurements(
    Path(sensor_id): Path<String>,
    Query(params): Query<DateWindowQuery>,
    State(pool): State<PgPool>,
) -> impl IntoResponse {
    // ---
    let result = sqlx::query_as::<_, SensorDailyRow>(
        r#"
        SELECT timestamp::date AS date, pollutant, daily_avg, daily_min, daily_max
        FROM measurements
        WHERE sensor_id = $1
          AND ($2::date IS NULL OR timestamp >= $2)
          AND ($3::date IS NULL OR timestamp < $3::date + INTERVAL '1 day')
        ORDER BY date;
        "#,
    )
    .bind(&sensor_id)
    .bind(params.start)
    .bind(params.end)
    .fetch_all(&pool)
    .await;

    match result {
        Ok(rows) if rows.is_empty() => (
            StatusCode::NOT_FOUND,
            Json(ErrorBody {
                error: "no measurements found".to_string(),
            }),
        )
            .into_response(),
        Ok(rows) => (StatusCode::OK, Json(rows)).into_response(),
        Err(e) => {
            error!("Failed to fetch measurements for sensor {}: {}", sensor_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}
