//! Library crate for the `aria-pipeline` air quality backend.
//!
//! Two binaries are built on top of this crate:
//! - the API server (`src/main.rs`), a read-only serving layer over the
//!   measurement tables
//! - `load-data` (`src/bin/load_data.rs`), the offline batch job that
//!   ingests the CSV exports, cleans and aggregates them, and replaces the
//!   measurement tables
//!
//! This module follows the Explicit Module Boundary Pattern (EMBP): each
//! concern lives in its own module (`config`, `models`, `schema`,
//! `pipeline`, `routes`) and the crate root re-exports the types the
//! binaries need, so the binaries never reach into submodules directly.
use std::{env, io::IsTerminal};

use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

pub mod config;
pub mod models;
pub mod pipeline;
pub mod routes;
pub mod schema;

pub use config::Config;
pub use models::{DailyAggregate, RawMeasurement, Sensor, SensorPollutant};
pub use pipeline::PipelineReport;

// ---

/// Initialize the global tracing subscriber for structured logging.
///
/// This function configures the [`tracing_subscriber`] with:
/// - Log target, file, and line number output enabled
/// - Color output controlled by TTY detection and `FORCE_COLOR` env var:
///   - `FORCE_COLOR=1|true|yes`: force colors on
///   - `FORCE_COLOR=0|false|no`: force colors off
///   - unset or other values: auto-detect TTY
/// - Span event emission mode controlled by the `API_SPAN_EVENTS` env var:
///   - `"full"`       : emit ENTER, EXIT, and CLOSE events with timing
///   - `"enter_exit"` : emit ENTER and EXIT only
///   - unset or other values: emit CLOSE events only (default)
/// - Log level controlled by the `API_LOG_LEVEL` env var
///
/// Called once at startup by both binaries before any logging or tracing
/// macros are invoked. It installs the subscriber globally for the
/// lifetime of the process.
pub fn init_tracing() {
    // ---
    let span_events = match env::var("API_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    };

    // Determine if we should use colors
    let use_color = match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stdout().is_terminal(),
    };

    // Use RUST_LOG if available, otherwise fall back to API_LOG_LEVEL
    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match env::var("API_LOG_LEVEL").ok().as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("info") => "info",
            Some("warn") => "warn",
            Some("error") => "error",
            _ => "debug",
        };
        EnvFilter::new(format!("{level},sqlx::query=warn"))
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .init();
}
