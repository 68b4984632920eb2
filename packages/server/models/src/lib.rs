#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the report server.
//!
//! Reports travel as raw JSON objects so fields written by other producers
//! survive a round trip through the server untouched.

use basurant_analytics_models::DashboardStats;
use basurant_report_models::{CanonicalStatus, StatusAction};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `GET /api/reports` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiReportList {
    pub reports: Vec<Value>,
}

/// `GET /api/reports/next-id` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiNextId {
    /// `R-<5-digit sequence><MMDDYYYY>`.
    pub id: String,
}

/// Plain success acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiOk {
    pub ok: bool,
}

impl ApiOk {
    pub const OK: Self = Self { ok: true };
}

/// `POST /api/reports/bulk` request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiBulkRequest {
    #[serde(default)]
    pub reports: Vec<Value>,
}

/// `POST /api/reports/bulk` response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiBulkResult {
    pub ok: bool,
    /// Number of reports stored after the merge.
    pub count: usize,
}

/// `POST /api/reports/{id}/status` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiStatusChange {
    pub action: StatusAction,
}

/// `POST /api/reports/{id}/status` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiStatusResult {
    pub ok: bool,
    /// Raw status now stored on the report.
    pub status: String,
    pub canonical_status: CanonicalStatus,
}

/// `GET /api/stats` response.
pub type ApiStats = DashboardStats;

/// Error body returned with every 4xx/5xx.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

impl ApiError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
    /// Number of stored reports.
    pub reports: usize,
}
