//! Chart datasets.
//!
//! Counting follows the dashboard: types keep first-occurrence order,
//! statuses and sizes use their fixed order, and time buckets are keyed by
//! the calendar date in the time zone of `now`.

use basurant_analytics_models::{
    DAILY_WINDOW_DAYS, DailyCount, DashboardStats, DashboardSummary, LabelCount,
    MONTHLY_WINDOW_MONTHS, MonthBucket, MonthlyStatusMatrix, StatusCount, StatusSeries,
    UNKNOWN_SIZE, UNKNOWN_TYPE,
};
use basurant_report_models::{CanonicalStatus, Report, ReportSize};
use chrono::{DateTime, Datelike as _, Days, NaiveDate, TimeZone, Utc};

/// Calendar date of a report in the time zone of `now`.
fn local_date<Tz: TimeZone>(report: &Report, now: &DateTime<Tz>) -> NaiveDate {
    report
        .created_or(now.with_timezone(&Utc))
        .with_timezone(&now.timezone())
        .date_naive()
}

/// Counts reports per type in first-occurrence order. Reports without a
/// type count as [`UNKNOWN_TYPE`].
#[must_use]
pub fn counts_by_type(reports: &[Report]) -> Vec<LabelCount> {
    let mut counts: Vec<LabelCount> = Vec::new();

    for report in reports {
        let label = report
            .report_type
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(UNKNOWN_TYPE);

        match counts.iter_mut().find(|c| c.label == label) {
            Some(entry) => entry.count += 1,
            None => counts.push(LabelCount::new(label, 1)),
        }
    }

    counts
}

/// Reports per day for the trailing [`DAILY_WINDOW_DAYS`] days ending
/// today, oldest first. Days without reports are present with a zero
/// count; reports outside the window are ignored.
#[must_use]
pub fn daily_counts<Tz: TimeZone>(reports: &[Report], now: &DateTime<Tz>) -> Vec<DailyCount> {
    let today = now.date_naive();
    let mut days: Vec<DailyCount> = (0..DAILY_WINDOW_DAYS)
        .rev()
        .filter_map(|back| today.checked_sub_days(Days::new(u64::from(back))))
        .map(|date| DailyCount { date, count: 0 })
        .collect();

    for report in reports {
        let date = local_date(report, now);
        if let Some(day) = days.iter_mut().find(|d| d.date == date) {
            day.count += 1;
        }
    }

    days
}

/// Reports per canonical status, every status present, in dashboard order.
#[must_use]
pub fn counts_by_status(reports: &[Report]) -> Vec<StatusCount> {
    CanonicalStatus::all()
        .iter()
        .map(|&status| StatusCount {
            status,
            count: reports
                .iter()
                .filter(|r| r.canonical_status() == status)
                .count() as u64,
        })
        .collect()
}

/// Reports per size, smallest first. An [`UNKNOWN_SIZE`] bucket follows
/// when any report has no recognizable size.
#[must_use]
pub fn counts_by_size(reports: &[Report]) -> Vec<LabelCount> {
    let mut counts: Vec<LabelCount> = ReportSize::all()
        .iter()
        .map(|&size| {
            LabelCount::new(
                size.to_string(),
                reports.iter().filter(|r| r.size == Some(size)).count() as u64,
            )
        })
        .collect();

    let unknown = reports.iter().filter(|r| r.size.is_none()).count() as u64;
    if unknown > 0 {
        counts.push(LabelCount::new(UNKNOWN_SIZE, unknown));
    }

    counts
}

/// First day of the month `back` months before `date`.
fn month_start(date: NaiveDate, back: u32) -> Option<NaiveDate> {
    let index = date.year() * 12 + i32::try_from(date.month0()).ok()?
        - i32::try_from(back).ok()?;
    let year = index.div_euclid(12);
    let month = u32::try_from(index.rem_euclid(12)).ok()? + 1;
    NaiveDate::from_ymd_opt(year, month, 1)
}

fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Reports per canonical status for each of the trailing
/// [`MONTHLY_WINDOW_MONTHS`] months including the current one.
#[must_use]
pub fn monthly_status_matrix<Tz: TimeZone>(
    reports: &[Report],
    now: &DateTime<Tz>,
) -> MonthlyStatusMatrix {
    let today = now.date_naive();
    let months: Vec<MonthBucket> = (0..MONTHLY_WINDOW_MONTHS)
        .rev()
        .filter_map(|back| month_start(today, back))
        .map(|start| MonthBucket {
            key: month_key(start),
            label: start.format("%b %Y").to_string(),
        })
        .collect();

    let mut series: Vec<StatusSeries> = CanonicalStatus::all()
        .iter()
        .map(|&status| StatusSeries {
            status,
            counts: vec![0; months.len()],
        })
        .collect();

    for report in reports {
        let key = month_key(local_date(report, now));
        let Some(month) = months.iter().position(|m| m.key == key) else {
            continue;
        };
        let status = report.canonical_status();
        if let Some(s) = series.iter_mut().find(|s| s.status == status) {
            s.counts[month] += 1;
        }
    }

    MonthlyStatusMatrix { months, series }
}

/// Total and per-status headline counts.
#[must_use]
pub fn dashboard_summary(reports: &[Report]) -> DashboardSummary {
    let mut summary = DashboardSummary::default();
    for report in reports {
        summary.record(report.canonical_status());
    }
    summary
}

/// Every dashboard dataset for `reports`.
#[must_use]
pub fn dashboard_stats<Tz: TimeZone>(reports: &[Report], now: &DateTime<Tz>) -> DashboardStats {
    log::debug!("Computing dashboard stats for {} reports", reports.len());
    DashboardStats {
        summary: dashboard_summary(reports),
        by_type: counts_by_type(reports),
        daily: daily_counts(reports, now),
        by_status: counts_by_status(reports),
        by_size: counts_by_size(reports),
        monthly: monthly_status_matrix(reports, now),
    }
}
