#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Report sources and the aggregator that chains them.
//!
//! Each provider implements the [`ReportSource`] trait. Which providers run,
//! and in what order, is driven by TOML definitions (see [`registry`]). The
//! [`aggregator::ReportAggregator`] walks the chain and the
//! [`feed::ReportFeed`] publishes the newest result to observers.

pub mod aggregator;
pub mod feed;
pub mod local;
pub mod realtime_db;
pub mod registry;
pub mod rest;
pub mod retry;
pub mod source_def;

use async_trait::async_trait;
use basurant_report_models::Report;
use serde_json::Value;
use strum_macros::{AsRefStr, Display, EnumString};

pub use aggregator::ReportAggregator;
pub use feed::{FeedSnapshot, ReportFeed};

/// Errors that can occur during data source operations.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// I/O error (file read/write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The server answered, but not with what we asked for.
    #[error("Unexpected response: {message}")]
    Response {
        /// Description of what went wrong.
        message: String,
    },
}

/// Transport a source reads through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum SourceKind {
    /// JSON report API.
    Rest,
    /// Realtime database snapshot.
    RealtimeDb,
    /// The local [`basurant_store::ReportStore`].
    LocalStore,
}

impl SourceKind {
    /// Returns `true` for sources reached over the network.
    #[must_use]
    pub const fn is_remote(self) -> bool {
        !matches!(self, Self::LocalStore)
    }
}

/// Trait that all report sources must implement.
#[async_trait]
pub trait ReportSource: Send + Sync {
    /// Returns a unique identifier for this source (e.g., `"rest_api"`).
    fn id(&self) -> &str;

    /// Returns the human-readable name of this source.
    fn name(&self) -> &str;

    fn kind(&self) -> SourceKind;

    /// Fetches every report the source holds.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the source cannot be reached or answers
    /// with something other than a report list.
    async fn fetch(&self) -> Result<Vec<Report>, SourceError>;
}

/// Converts raw JSON records into reports, dropping the unreadable ones.
pub fn parse_reports(values: impl IntoIterator<Item = Value>) -> Vec<Report> {
    values
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<Report>(value) {
            Ok(report) => Some(report),
            Err(e) => {
                log::debug!("Dropping unreadable report: {e}");
                None
            }
        })
        .collect()
}
