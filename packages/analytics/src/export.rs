//! CSV export of the report list.

use basurant_report_models::{MediaRef, Report};
use serde::Serialize;

use crate::AnalyticsError;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CsvRow<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    report_type: Option<&'a str>,
    size: Option<String>,
    status: &'a str,
    canonical_status: String,
    barangay: Option<&'a str>,
    description: &'a str,
    lat: Option<f64>,
    lng: Option<f64>,
    created_at: Option<String>,
    reporter_name: Option<&'a str>,
    photo_url: Option<&'a str>,
    video_url: Option<&'a str>,
}

/// Only hosted media is exported; embedded blobs would swamp the sheet.
fn url_of(media: Option<&MediaRef>) -> Option<&str> {
    match media {
        Some(MediaRef::Url(url)) => Some(url),
        _ => None,
    }
}

impl<'a> From<&'a Report> for CsvRow<'a> {
    fn from(report: &'a Report) -> Self {
        Self {
            id: &report.id,
            report_type: report.report_type.as_deref(),
            size: report.size.map(|s| s.to_string()),
            status: &report.status,
            canonical_status: report.canonical_status().to_string(),
            barangay: report.barangay.as_deref(),
            description: &report.description,
            lat: report.lat.filter(|v| v.is_finite()),
            lng: report.lng.filter(|v| v.is_finite()),
            created_at: report.created_at.map(|t| t.to_rfc3339()),
            reporter_name: report.reporter_name.as_deref(),
            photo_url: url_of(report.photo.as_ref()),
            video_url: url_of(report.video.as_ref()),
        }
    }
}

/// Renders `reports` as CSV with a header row.
///
/// # Errors
///
/// * If a row fails to encode
/// * If the output buffer cannot be flushed
pub fn export_csv(reports: &[Report]) -> Result<String, AnalyticsError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for report in reports {
        writer.serialize(CsvRow::from(report))?;
    }
    let bytes = writer.into_inner().map_err(csv::IntoInnerError::into_error)?;
    log::debug!("Exported {} reports as CSV ({} bytes)", reports.len(), bytes.len());
    Ok(String::from_utf8(bytes)?)
}
