#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Report statistics for the admin dashboard.
//!
//! Every function here is pure over a report list. Time-based buckets take
//! the current instant as a parameter so callers choose the local time
//! zone and tests stay deterministic. A report whose creation time is
//! missing or unparseable is counted as created "now".

pub mod charts;
pub mod export;

use thiserror::Error;

pub use charts::{
    counts_by_size, counts_by_status, counts_by_type, daily_counts, dashboard_stats,
    dashboard_summary, monthly_status_matrix,
};
pub use export::export_csv;

/// Errors that can occur while exporting statistics.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// CSV encoding failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Flushing the CSV buffer failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The CSV output was not valid UTF-8.
    #[error("Encoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
