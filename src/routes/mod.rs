//! Route gateway for the air quality API (EMBP).
//!
//! Each endpoint family lives in a sibling file that exports a subrouter;
//! the gateway merges them and attaches the shared state so `main.rs` never
//! needs to know about individual endpoints. CORS is permissive because the
//! dashboard frontend is served from a different origin.

use axum::Router;
use serde::Serialize;
use sqlx::PgPool;
use tower_http::cors::CorsLayer;

mod health;
mod measurements;
mod sensors;

// ---

/// JSON error body returned by failing handlers.
#[derive(Serialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}

pub fn router(pool: PgPool) -> Router {
    // ---
    Router::new()
        .merge(sensors::router())
        .merge(measurements::router())
        .merge(health::router())
        .layer(CorsLayer::permissive())
        .with_state(pool)
}
