#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Dashboard statistics and chart dataset types.
//!
//! These are the shapes the admin dashboard draws and the `/api/stats`
//! endpoint returns. They carry no behaviour beyond a few lookups; the
//! counting lives in `basurant_analytics`.

use basurant_report_models::CanonicalStatus;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Label used for reports with no type.
pub const UNKNOWN_TYPE: &str = "Unknown";

/// Label used for reports with no recognizable size.
pub const UNKNOWN_SIZE: &str = "unknown";

/// Number of days in the daily time series.
pub const DAILY_WINDOW_DAYS: u32 = 30;

/// Number of months in the monthly status matrix.
pub const MONTHLY_WINDOW_MONTHS: u32 = 6;

/// A label with a report count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelCount {
    pub label: String,
    pub count: u64,
}

impl LabelCount {
    #[must_use]
    pub fn new(label: impl Into<String>, count: u64) -> Self {
        Self {
            label: label.into(),
            count,
        }
    }
}

/// Reports created on one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: u64,
}

/// Report count per canonical status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    pub status: CanonicalStatus,
    pub count: u64,
}

/// A calendar month in the monthly matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthBucket {
    /// `YYYY-MM`.
    pub key: String,
    /// Short display label such as `Mar 2025`.
    pub label: String,
}

/// One stacked series of the monthly matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSeries {
    pub status: CanonicalStatus,
    /// One count per entry of [`MonthlyStatusMatrix::months`].
    pub counts: Vec<u64>,
}

/// Monthly report counts per canonical status, oldest month first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyStatusMatrix {
    pub months: Vec<MonthBucket>,
    pub series: Vec<StatusSeries>,
}

impl MonthlyStatusMatrix {
    /// Count for `status` in the month keyed `YYYY-MM`.
    #[must_use]
    pub fn count(&self, status: CanonicalStatus, month_key: &str) -> Option<u64> {
        let month = self.months.iter().position(|m| m.key == month_key)?;
        self.series
            .iter()
            .find(|s| s.status == status)
            .and_then(|s| s.counts.get(month).copied())
    }
}

/// Headline numbers of the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total: u64,
    pub pending: u64,
    pub ongoing: u64,
    pub cleaned: u64,
}

impl DashboardSummary {
    /// Adds one report with the given status.
    pub const fn record(&mut self, status: CanonicalStatus) {
        self.total += 1;
        match status {
            CanonicalStatus::Pending => self.pending += 1,
            CanonicalStatus::Ongoing => self.ongoing += 1,
            CanonicalStatus::Cleaned => self.cleaned += 1,
        }
    }
}

/// Every dataset the dashboard draws.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub summary: DashboardSummary,
    pub by_type: Vec<LabelCount>,
    pub daily: Vec<DailyCount>,
    pub by_status: Vec<StatusCount>,
    pub by_size: Vec<LabelCount>,
    pub monthly: MonthlyStatusMatrix,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_records_each_status() {
        let mut summary = DashboardSummary::default();
        summary.record(CanonicalStatus::Pending);
        summary.record(CanonicalStatus::Cleaned);
        summary.record(CanonicalStatus::Cleaned);

        assert_eq!(
            summary,
            DashboardSummary {
                total: 3,
                pending: 1,
                ongoing: 0,
                cleaned: 2,
            }
        );
    }

    #[test]
    fn matrix_lookup_by_month_key() {
        let matrix = MonthlyStatusMatrix {
            months: vec![
                MonthBucket {
                    key: "2025-02".to_string(),
                    label: "Feb 2025".to_string(),
                },
                MonthBucket {
                    key: "2025-03".to_string(),
                    label: "Mar 2025".to_string(),
                },
            ],
            series: vec![StatusSeries {
                status: CanonicalStatus::Ongoing,
                counts: vec![0, 4],
            }],
        };

        assert_eq!(matrix.count(CanonicalStatus::Ongoing, "2025-03"), Some(4));
        assert_eq!(matrix.count(CanonicalStatus::Cleaned, "2025-03"), None);
        assert_eq!(matrix.count(CanonicalStatus::Ongoing, "2024-12"), None);
    }

    #[test]
    fn serializes_camel_case() {
        let daily = DailyCount {
            date: NaiveDate::from_ymd_opt(2025, 3, 9).unwrap(),
            count: 2,
        };
        let json = serde_json::to_value(daily).unwrap();
        assert_eq!(json["date"], "2025-03-09");

        let status = serde_json::to_value(StatusCount {
            status: CanonicalStatus::Cleaned,
            count: 1,
        })
        .unwrap();
        assert_eq!(status["status"], "cleaned");
    }
}
