#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Report submission.
//!
//! A [`SubmissionForm`] is validated synchronously, given an id (the server's
//! `next-id` when reachable, otherwise the local counter plus today's date),
//! appended to the local store, and finally pushed to the REST endpoints.
//! Nothing is persisted when validation fails.

use std::sync::Arc;

use basurant_report_models::barangay::BarangayList;
use basurant_report_models::id::format_report_id;
use basurant_report_models::text::sanitize_reporter_name;
use basurant_report_models::{
    DEFAULT_STATUS, DescriptionParts, MediaRef, Report, ReportSize, VideoMeta, is_within_bounds,
};
use basurant_source::SourceError;
use basurant_source::rest::RestSource;
use basurant_store::ReportStore;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::Deserialize;
use thiserror::Error;

/// Reasons a submission is refused or only partly saved.
///
/// Validation variants display the message shown to the reporter.
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// All description fields are empty.
    #[error("Please complete the description fields.")]
    MissingDescription,

    /// No barangay was selected.
    #[error("Please select a barangay.")]
    MissingBarangay,

    /// The barangay is not in the known list.
    #[error("Unknown barangay: {0}")]
    UnknownBarangay(String),

    /// No photo was attached.
    #[error("Please add a photo")]
    MissingPhoto,

    /// No device location was provided.
    #[error("Location is required to verify that reports are inside Baguio City.")]
    MissingLocation,

    /// The location lies outside the service area.
    #[error("Reports are limited to Baguio City. Your current location appears to be outside Baguio.")]
    OutsideServiceArea {
        /// Latitude that was rejected.
        lat: f64,
        /// Longitude that was rejected.
        lng: f64,
    },

    /// No storage tier accepted the updated list.
    #[error("Save failed: report {id} could not be stored locally")]
    LocalSave {
        /// Id of the report that was not stored.
        id: String,
    },

    /// Every REST endpoint refused the report. It is still stored locally.
    #[error("Save failed: {0}")]
    Remote(#[from] SourceError),
}

/// What a reporter fills in.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionForm {
    #[serde(default, rename = "type")]
    pub report_type: Option<String>,
    #[serde(default)]
    pub size: Option<ReportSize>,
    #[serde(flatten)]
    pub details: DescriptionParts,
    #[serde(default)]
    pub barangay: Option<String>,
    #[serde(default)]
    pub photo_data_url: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub video_meta: Option<VideoMeta>,
    #[serde(default)]
    pub additional_image_data_url: Option<String>,
    #[serde(default)]
    pub additional_image_url: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub reporter_name: Option<String>,
}

fn filled(value: Option<&String>) -> Option<String> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty()).map(str::to_string)
}

/// URL wins over the embedded copy.
fn media(embedded: Option<&String>, url: Option<&String>) -> Option<MediaRef> {
    filled(url)
        .map(MediaRef::Url)
        .or_else(|| filled(embedded).map(MediaRef::Embedded))
}

impl SubmissionForm {
    /// Checks the form in the order the reporter sees the fields. Returns
    /// the validated location.
    ///
    /// # Errors
    ///
    /// * If no description field is filled in
    /// * If the barangay is missing or not in `barangays`
    /// * If no photo is attached
    /// * If the location is missing or outside the service area
    pub fn validate(&self, barangays: &BarangayList) -> Result<(f64, f64), SubmissionError> {
        if self.details.is_empty() {
            return Err(SubmissionError::MissingDescription);
        }

        let barangay = filled(self.barangay.as_ref()).ok_or(SubmissionError::MissingBarangay)?;
        if !barangays.contains(&barangay) {
            return Err(SubmissionError::UnknownBarangay(barangay));
        }

        if media(self.photo_data_url.as_ref(), self.photo_url.as_ref()).is_none() {
            return Err(SubmissionError::MissingPhoto);
        }

        let (lat, lng) = match (self.lat, self.lng) {
            (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => (lat, lng),
            _ => return Err(SubmissionError::MissingLocation),
        };
        if !is_within_bounds(lat, lng) {
            return Err(SubmissionError::OutsideServiceArea { lat, lng });
        }

        Ok((lat, lng))
    }

    /// Builds the report record. Call [`Self::validate`] first.
    #[must_use]
    pub fn into_report(self, id: String, created_at: DateTime<Utc>) -> Report {
        let mut report = Report::new(id);
        report.description = self.details.compose();
        report.photo = media(self.photo_data_url.as_ref(), self.photo_url.as_ref());
        report.video = filled(self.video_url.as_ref()).map(MediaRef::Url);
        report.additional_image = media(
            self.additional_image_data_url.as_ref(),
            self.additional_image_url.as_ref(),
        );
        report.report_type = filled(self.report_type.as_ref());
        report.barangay = filled(self.barangay.as_ref());
        report.reporter_name = self.reporter_name.as_deref().and_then(sanitize_reporter_name);
        report.details = self.details;
        report.size = self.size;
        report.video_meta = self.video_meta;
        report.status = DEFAULT_STATUS.to_string();
        report.lat = self.lat;
        report.lng = self.lng;
        report.created_at = Some(created_at);
        report
    }
}

/// Submits reports to the local store and, when configured, the REST API.
#[derive(Debug)]
pub struct Submitter {
    store: Arc<ReportStore>,
    remote: Option<RestSource>,
    barangays: BarangayList,
}

impl Submitter {
    #[must_use]
    pub const fn new(
        store: Arc<ReportStore>,
        remote: Option<RestSource>,
        barangays: BarangayList,
    ) -> Self {
        Self {
            store,
            remote,
            barangays,
        }
    }

    #[must_use]
    pub const fn barangays(&self) -> &BarangayList {
        &self.barangays
    }

    /// Picks the id for a new report.
    pub async fn assign_id(&self, today: NaiveDate) -> String {
        if let Some(remote) = &self.remote
            && let Some(id) = remote.next_id().await
        {
            log::debug!("Using server-assigned id {id}");
            return id;
        }
        format_report_id(self.store.next_local_sequence().await, today)
    }

    /// Validates, stores and uploads a report. `now` decides both the
    /// creation time and the date part of a locally generated id.
    ///
    /// Returns the stored report.
    ///
    /// # Errors
    ///
    /// * If the form fails [`SubmissionForm::validate`]
    /// * If no storage tier accepted the report
    /// * If every REST endpoint refused it (the local copy is kept)
    pub async fn submit<Tz: TimeZone>(
        &self,
        form: SubmissionForm,
        now: &DateTime<Tz>,
    ) -> Result<Report, SubmissionError> {
        form.validate(&self.barangays)?;

        let created_at = now.with_timezone(&Utc);
        let today = now.date_naive();
        let id = self.assign_id(today).await;
        let report = form.into_report(id, created_at);

        let mut list = self.store.load().await;
        list.push(report.clone());
        if !self.store.save(&list).await {
            return Err(SubmissionError::LocalSave { id: report.id });
        }
        log::info!("Saved report {} locally", report.id);

        if let Some(remote) = &self.remote {
            remote.submit(&report).await?;
        }

        Ok(report)
    }
}
