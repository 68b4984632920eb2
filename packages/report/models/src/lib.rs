#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared report types for `BasuRANT`.
//!
//! A [`Report`] is a geotagged waste-dumpsite sighting. Reports reach us from
//! several producers (the submission form, older local-storage schemas, the
//! REST server, the realtime database) which disagree on field names and on
//! how `createdAt` is encoded. [`Report`] is the single normalized shape;
//! the conversion from those wire variants happens once, during
//! deserialization.

pub mod barangay;
pub mod geofence;
pub mod id;
pub mod status;
pub mod text;
pub mod timestamp;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::{AsRefStr, Display, EnumString};

pub use geofence::{BAGUIO_GEOFENCE, Geofence, is_within_bounds};
pub use status::{CanonicalStatus, StatusAction, canonical_status};
pub use text::DescriptionParts;
pub use timestamp::Timestamp;

/// Raw status given to newly created reports.
pub const DEFAULT_STATUS: &str = "pending";

/// Errors produced while reading a report from the wire.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// None of `id`, `reportId` or `_id` carried a usable value.
    #[error("Report has no id")]
    MissingId,
}

/// Size class of a dumpsite.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ReportSize {
    Small,
    Medium,
    Large,
}

impl ReportSize {
    /// Returns all variants, smallest first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Small, Self::Medium, Self::Large]
    }

    /// Parses a free-form size. Anything unrecognized is `None`.
    #[must_use]
    pub fn parse_lenient(raw: &str) -> Option<Self> {
        raw.trim().parse().ok()
    }
}

/// A photo, video or image attached to a report.
///
/// Small media is embedded as a data URL; uploaded media is a plain URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum MediaRef {
    /// Encoded blob (`data:image/jpeg;base64,...`).
    Embedded(String),
    /// Remote location.
    Url(String),
}

impl MediaRef {
    /// Picks the URL over the embedded blob when both are present.
    fn pick(embedded: Option<String>, url: Option<String>) -> Option<Self> {
        non_blank(url)
            .map(Self::Url)
            .or_else(|| non_blank(embedded).map(Self::Embedded))
    }

    /// Size in bytes of the reference as stored.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        match self {
            Self::Embedded(s) | Self::Url(s) => s.len(),
        }
    }

    /// Splits into `(embedded, url)` wire fields.
    fn split(this: Option<Self>) -> (Option<String>, Option<String>) {
        match this {
            Some(Self::Embedded(s)) => (Some(s), None),
            Some(Self::Url(s)) => (None, Some(s)),
            None => (None, None),
        }
    }
}

/// Metadata recorded for an attached video.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// MIME type.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub mime: Option<String>,
}

/// A waste-dumpsite report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawReport", into = "RawReport")]
pub struct Report {
    /// Unique id, normally `R-<5-digit sequence><MMDDYYYY>`.
    pub id: String,
    /// Free-text waste category.
    pub report_type: Option<String>,
    /// `None` when missing or unrecognized.
    pub size: Option<ReportSize>,
    /// Composed description (see [`DescriptionParts::compose`]).
    pub description: String,
    pub details: DescriptionParts,
    pub barangay: Option<String>,
    pub photo: Option<MediaRef>,
    pub video: Option<MediaRef>,
    pub video_meta: Option<VideoMeta>,
    pub additional_image: Option<MediaRef>,
    /// Raw status as written by the producer.
    pub status: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    /// `None` when the producer wrote no date or an unreadable one.
    pub created_at: Option<DateTime<Utc>>,
    pub reporter_name: Option<String>,
}

impl Report {
    /// Creates an empty pending report with the given id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            report_type: None,
            size: None,
            description: String::new(),
            details: DescriptionParts::default(),
            barangay: None,
            photo: None,
            video: None,
            video_meta: None,
            additional_image: None,
            status: DEFAULT_STATUS.to_string(),
            lat: None,
            lng: None,
            created_at: None,
            reporter_name: None,
        }
    }

    #[must_use]
    pub fn canonical_status(&self) -> CanonicalStatus {
        canonical_status(&self.status)
    }

    /// Returns the coordinates when both are present and finite.
    #[must_use]
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => Some((lat, lng)),
            _ => None,
        }
    }

    /// Returns `true` if the report can be placed on the map.
    #[must_use]
    pub fn is_mappable(&self) -> bool {
        self.coordinates()
            .is_some_and(|(lat, lng)| is_within_bounds(lat, lng))
    }

    /// The report's date, or `now` when it has none.
    #[must_use]
    pub fn created_or(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.created_at.unwrap_or(now)
    }

    /// Drops the attached video and its metadata.
    pub fn strip_video(&mut self) {
        self.video = None;
        self.video_meta = None;
    }

    /// Drops the embedded photo and additional image. URL references are
    /// small and are kept.
    pub fn strip_embedded_images(&mut self) {
        if matches!(self.photo, Some(MediaRef::Embedded(_))) {
            self.photo = None;
        }
        if matches!(self.additional_image, Some(MediaRef::Embedded(_))) {
            self.additional_image = None;
        }
    }
}

/// Every field name any producer has written.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<Value>,
    #[serde(default, skip_serializing)]
    report_id: Option<Value>,
    #[serde(default, rename = "_id", skip_serializing)]
    underscore_id: Option<Value>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    report_type: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    size: Option<Value>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    material_desc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    spot_desc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    land_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    landmark: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    barangay: Option<String>,
    #[serde(default, skip_serializing)]
    brgy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    photo_data_url: Option<String>,
    #[serde(default, skip_serializing)]
    photo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    photo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    video: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    video_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    video_meta: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    additional_image_data_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    additional_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lat: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lng: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reporter_name: Option<String>,
}

impl TryFrom<RawReport> for Report {
    type Error = ReportError;

    fn try_from(raw: RawReport) -> Result<Self, Self::Error> {
        let id = [raw.id, raw.report_id, raw.underscore_id]
            .into_iter()
            .find_map(|v| v.and_then(value_to_string))
            .ok_or(ReportError::MissingId)?;

        let details = DescriptionParts {
            materials: non_blank(raw.material_desc),
            spot: non_blank(raw.spot_desc),
            land_type: non_blank(raw.land_type),
            landmark: non_blank(raw.landmark),
        };
        let description = non_blank(raw.description).unwrap_or_else(|| details.compose());

        let created_at = raw
            .created_at
            .and_then(|v| serde_json::from_value::<Timestamp>(v).ok())
            .and_then(|ts| ts.to_datetime());

        Ok(Self {
            id,
            report_type: raw.report_type.and_then(value_to_string),
            size: raw
                .size
                .and_then(value_to_string)
                .and_then(|s| ReportSize::parse_lenient(&s)),
            description,
            details,
            barangay: non_blank(raw.barangay).or_else(|| non_blank(raw.brgy)),
            photo: MediaRef::pick(raw.photo_data_url.or(raw.photo), raw.photo_url),
            video: MediaRef::pick(raw.video, raw.video_url),
            video_meta: raw
                .video_meta
                .and_then(|v| serde_json::from_value(v).ok()),
            additional_image: MediaRef::pick(
                raw.additional_image_data_url,
                raw.additional_image_url,
            ),
            status: raw
                .status
                .and_then(value_to_string)
                .unwrap_or_else(|| DEFAULT_STATUS.to_string()),
            lat: raw.lat.and_then(value_to_f64),
            lng: raw.lng.and_then(value_to_f64),
            created_at,
            reporter_name: raw
                .reporter_name
                .as_deref()
                .and_then(text::sanitize_reporter_name),
        })
    }
}

impl From<Report> for RawReport {
    fn from(report: Report) -> Self {
        let (photo_data_url, photo_url) = MediaRef::split(report.photo);
        let (video, video_url) = MediaRef::split(report.video);
        let (additional_image_data_url, additional_image_url) =
            MediaRef::split(report.additional_image);

        Self {
            id: Some(Value::String(report.id)),
            report_type: report.report_type.map(Value::String),
            size: report.size.map(|s| Value::String(s.to_string())),
            description: Some(report.description),
            material_desc: report.details.materials,
            spot_desc: report.details.spot,
            land_type: report.details.land_type,
            landmark: report.details.landmark,
            barangay: report.barangay,
            photo_data_url,
            photo_url,
            video,
            video_url,
            video_meta: report
                .video_meta
                .and_then(|m| serde_json::to_value(m).ok()),
            additional_image_data_url,
            additional_image_url,
            status: Some(Value::String(report.status)),
            lat: report.lat.and_then(f64_to_value),
            lng: report.lng.and_then(f64_to_value),
            created_at: report
                .created_at
                .map(|dt| Value::from(dt.timestamp_millis())),
            reporter_name: report.reporter_name,
            ..Self::default()
        }
    }
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn value_to_string(v: Value) -> Option<String> {
    match v {
        Value::String(s) => non_blank(Some(s)),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn value_to_f64(v: Value) -> Option<f64> {
    let parsed = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|f| f.is_finite())
}

fn f64_to_value(f: f64) -> Option<Value> {
    serde_json::Number::from_f64(f).map(Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_current_schema() {
        let report: Report = serde_json::from_str(
            r#"{
                "id": "R-0000101012025",
                "type": "Household",
                "size": "Large",
                "materialDesc": "plastic",
                "landmark": "chapel",
                "barangay": "Irisan",
                "photoDataUrl": "data:image/jpeg;base64,AAAA",
                "status": "in_progress",
                "lat": 16.40,
                "lng": "120.59",
                "createdAt": 1700000000000,
                "reporterName": "Juan  Dela Cruz"
            }"#,
        )
        .unwrap();

        assert_eq!(report.id, "R-0000101012025");
        assert_eq!(report.report_type.as_deref(), Some("Household"));
        assert_eq!(report.size, Some(ReportSize::Large));
        assert_eq!(report.description, "Materials: plastic | Landmark: chapel");
        assert_eq!(
            report.photo,
            Some(MediaRef::Embedded("data:image/jpeg;base64,AAAA".to_string()))
        );
        assert_eq!(report.canonical_status(), CanonicalStatus::Ongoing);
        assert_eq!(report.coordinates(), Some((16.40, 120.59)));
        assert!(report.is_mappable());
        assert_eq!(
            report.created_at,
            DateTime::from_timestamp_millis(1_700_000_000_000)
        );
        assert_eq!(report.reporter_name.as_deref(), Some("Juan Dela Cruz"));
    }

    #[test]
    fn reads_legacy_aliases() {
        let report: Report = serde_json::from_str(
            r#"{
                "_id": 42,
                "brgy": "Kias",
                "photo": "data:image/png;base64,BBBB",
                "photoUrl": "https://cdn.example/p.jpg",
                "createdAt": {"seconds": 1700000000, "nanoseconds": 0}
            }"#,
        )
        .unwrap();

        assert_eq!(report.id, "42");
        assert_eq!(report.barangay.as_deref(), Some("Kias"));
        assert_eq!(
            report.photo,
            Some(MediaRef::Url("https://cdn.example/p.jpg".to_string()))
        );
        assert_eq!(report.status, DEFAULT_STATUS);
        assert!(report.created_at.is_some());
    }

    #[test]
    fn missing_id_is_rejected() {
        let result: Result<Report, _> = serde_json::from_str(r#"{"type": "x", "id": "  "}"#);
        assert!(result.is_err());
    }

    #[test]
    fn unreadable_fields_do_not_drop_the_report() {
        let report: Report = serde_json::from_str(
            r#"{"id": "R-1", "size": "gigantic", "lat": "north", "createdAt": "someday", "videoMeta": 5}"#,
        )
        .unwrap();

        assert_eq!(report.size, None);
        assert_eq!(report.lat, None);
        assert_eq!(report.created_at, None);
        assert_eq!(report.video_meta, None);
        assert!(!report.is_mappable());
    }

    #[test]
    fn writes_current_schema() {
        let mut report = Report::new("R-0000101012025");
        report.size = Some(ReportSize::Small);
        report.photo = Some(MediaRef::Url("https://cdn.example/p.jpg".to_string()));
        report.lat = Some(16.4);
        report.lng = Some(120.6);
        report.created_at = DateTime::from_timestamp_millis(1_700_000_000_000);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["id"], "R-0000101012025");
        assert_eq!(json["size"], "small");
        assert_eq!(json["photoUrl"], "https://cdn.example/p.jpg");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["createdAt"], 1_700_000_000_000_i64);
        assert!(json.get("photoDataUrl").is_none());
        assert!(json.get("_id").is_none());

        let back: Report = serde_json::from_value(json).unwrap();
        assert_eq!(back, report);
    }

    #[test]
    fn out_of_bounds_report_is_not_mappable() {
        let mut report = Report::new("R-1");
        report.lat = Some(0.0);
        report.lng = Some(0.0);
        assert!(report.coordinates().is_some());
        assert!(!report.is_mappable());
    }

    #[test]
    fn stripping_keeps_urls() {
        let mut report = Report::new("R-1");
        report.photo = Some(MediaRef::Url("https://x/p.jpg".to_string()));
        report.additional_image = Some(MediaRef::Embedded("data:xx".to_string()));
        report.video = Some(MediaRef::Embedded("data:video".to_string()));
        report.video_meta = Some(VideoMeta::default());

        report.strip_video();
        report.strip_embedded_images();

        assert!(report.video.is_none());
        assert!(report.video_meta.is_none());
        assert!(report.additional_image.is_none());
        assert!(report.photo.is_some());
    }
}
