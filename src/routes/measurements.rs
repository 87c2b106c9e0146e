//! Measurement endpoints: hourly rows, daily aggregates, and the loaded
//! date range.
//!
//! Sibling module in the `routes` directory (EMBP). All three endpoints are
//! read-only queries over the tables the `load-data` batch job maintains;
//! rows come back ordered by timestamp/date ascending, which is what the
//! dashboard's time-series charts expect.

use axum::{
    extract::Query, extract::State, http::StatusCode, response::IntoResponse, routing::get, Json,
    Router,
};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::error;

use super::ErrorBody;

// ---

pub fn router() -> Router<PgPool> {
    // ---
    Router::new()
        .route("/api/raw_measurements", get(list_raw_measurements))
        .route("/api/measurements", get(list_daily_measurements))
        .route("/api/date_range", get(get_date_range))
}

/// Optional filters shared by both measurement listings. `end` is an
/// inclusive calendar date; the SQL filter extends it by one day.
#[derive(Debug, Deserialize)]
struct MeasurementsQuery {
    // ---
    sensor_id: Option<String>,
    pollutant: Option<String>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

#[derive(Serialize, sqlx::FromRow)]
struct RawMeasurementRow {
    // ---
    measurement_id: i32,
    sensor_id: String,
    timestamp: NaiveDateTime,
    pollutant: String,
    value: f64,
}

#[derive(Serialize, sqlx::FromRow)]
struct DailyMeasurementRow {
    // ---
    sensor_id: String,
    date: NaiveDate,
    pollutant: String,
    daily_avg: f64,
    daily_min: f64,
    daily_max: f64,
}

/// First and last calendar day present in `raw_measurements`; both null
/// when nothing has been loaded yet.
#[derive(Serialize)]
struct DateRange {
    // ---
    first_date: Option<NaiveDate>,
    last_date: Option<NaiveDate>,
}

/// Handle `GET /api/raw_measurements`.
async fn list_raw_measurements(
    Query(params): Query<MeasurementsQuery>,
    State(pool): State<PgPool>,
) -> impl IntoResponse {
    // ---
    let result = sqlx::query_as::<_, RawMeasurementRow>(
        r#"
        SELECT measurement_id, sensor_id, timestamp, pollutant, value
        FROM raw_measurements
        WHERE ($1::text IS NULL OR sensor_id = $1)
          AND ($2::text IS NULL OR pollutant = $2)
          AND ($3::date IS NULL OR timestamp >= $3)
          AND ($4::date IS NULL OR timestamp < $4::date + INTERVAL '1 day')
        ORDER BY timestamp;
        "#,
    )
    .bind(&params.sensor_id)
    .bind(&params.pollutant)
    .bind(params.start)
    .bind(params.end)
    .fetch_all(&pool)
    .await;

    match result {
        Ok(rows) => (StatusCode::OK, Json(rows)).into_response(),
        Err(e) => {
            error!("Failed to fetch raw measurements: {}", e);
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

/// Handle `GET /api/measurements`.
///
/// Returns daily aggregates from the precomputed `measurements` table.
async fn list_daily_measurements(
    Query(params): Query<MeasurementsQuery>,
    State(pool): State<PgPool>,
) -> impl IntoResponse {
    // ---
    let result = sqlx::query_as::<_, DailyMeasurementRow>(
        r#"
        SELECT sensor_id, timestamp AS date, pollutant, daily_avg, daily_min, daily_max
        FROM measurements
        WHERE ($1::text IS NULL OR sensor_id = $1)
          AND ($2::text IS NULL OR pollutant = $2)
          AND ($3::date IS NULL OR timestamp >= $3)
          AND ($4::date IS NULL OR timestamp < $4::date + INTERVAL '1 day')
        ORDER BY date;
        "#,
    )
    .bind(&params.sensor_id)
    .bind(&params.pollutant)
    .bind(params.start)
    .bind(params.end)
    .fetch_all(&pool)
    .await;

    match result {
        Ok(rows) => (StatusCode::OK, Json(rows)).into_response(),
        Err(e) => {
            error!("Failed to fetch daily measurements: {}", e);
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

/// Handle `GET /api/date_range`.
///
/// The dashboard uses this to bound its date picker. The range comes from
/// the hourly table; the daily table can only ever be a subset of it.
async fn get_date_range(State(pool): State<PgPool>) -> impl IntoResponse {
    // ---
    let result = sqlx::query_as::<_, (Option<NaiveDate>, Option<NaiveDate>)>(
        "SELECT MIN(timestamp)::date, MAX(timestamp)::date FROM raw_measurements;",
    )
    .fetch_one(&pool)
    .await;

    match result {
        Ok((first_date, last_date)) => (
            StatusCode::OK,
            Json(DateRange {
                first_date,
                last_date,
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to fetch date range: {}", e);
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
