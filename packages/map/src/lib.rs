#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Map marker model for the report views.
//!
//! [`MarkerRenderer`] turns a normalized report list into styled markers,
//! keeps their radii in step with the map zoom, groups them into clusters,
//! and routes clicks to a [`DetailHandler`]. It holds no map widget; the
//! view layer reads [`MarkerRenderer::markers`] and
//! [`MarkerRenderer::clusters`] and forwards map events back in.

pub mod cluster;
pub mod style;

use basurant_report_models::Report;
use basurant_report_models::status::status_key;
use basurant_source::ReportAggregator;
use serde::Serialize;
use strum_macros::{AsRefStr, Display, EnumString};

pub use cluster::Cluster;
pub use style::{color_for, radius_for};

/// Initial map zoom (city level).
pub const DEFAULT_ZOOM: f64 = 13.0;

/// Zoom the map jumps to when showing a newly submitted report.
pub const PLOT_ZOOM: f64 = 16.0;

/// Most reports listed when a cluster is opened.
pub const CLUSTER_LIST_LIMIT: usize = 50;

/// A report drawn on the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    pub lat: f64,
    pub lng: f64,
    pub color: &'static str,
    /// Radius before zoom scaling.
    pub base_radius: u32,
    /// Radius at the current zoom.
    pub radius: u32,
    pub style: MarkerStyle,
    pub report: Report,
}

/// How a marker is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkerStyle {
    #[default]
    Standard,
    /// Combined remote and local view; markers are drawn a little larger.
    Heat,
}

/// Which reports the admin map shows, by raw status. Tables and statistics
/// always use the unfiltered list.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StatusFilter {
    #[default]
    All,
    /// Raw status `pending`.
    Pending,
    /// Raw status `verified`.
    Verified,
}

impl StatusFilter {
    /// Matches the raw status, not the canonical one: `verified` reports
    /// are canonically pending but only pass [`Self::Verified`].
    #[must_use]
    pub fn matches(self, report: &Report) -> bool {
        match self {
            Self::All => true,
            Self::Pending | Self::Verified => status_key(&report.status) == self.as_ref(),
        }
    }
}

/// Temporary marker for a report that was just submitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlotMarker {
    pub report_id: String,
    pub lat: f64,
    pub lng: f64,
    pub radius: u32,
    pub color: &'static str,
}

/// Reports shown when a cluster is opened.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterDetails {
    /// Number of reports in the cluster.
    pub total: usize,
    /// At most [`CLUSTER_LIST_LIMIT`] of them.
    pub reports: Vec<Report>,
}

impl ClusterDetails {
    /// How many reports did not fit in the list.
    #[must_use]
    pub fn hidden(&self) -> usize {
        self.total.saturating_sub(self.reports.len())
    }
}

/// Receives the reports a user asked to see.
pub trait DetailHandler {
    fn show_report(&mut self, report: &Report);

    fn show_cluster(&mut self, details: &ClusterDetails);
}

/// Where markers are placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayerMode {
    /// Markers are grouped into clusters.
    #[default]
    Clustered,
    /// Every marker is drawn on its own.
    Plain,
}

/// Input from the map view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapEvent {
    /// The map finished zooming.
    ZoomEnd { zoom: f64 },
    /// A single marker was clicked (index into [`MarkerRenderer::markers`]).
    MarkerClick { marker: usize },
    /// A cluster was clicked (index into [`MarkerRenderer::clusters`]).
    ClusterClick { cluster: usize },
}

#[derive(Debug)]
pub struct MarkerRenderer<H: DetailHandler> {
    handler: H,
    mode: LayerMode,
    zoom: f64,
    markers: Vec<Marker>,
    plot: Option<PlotMarker>,
}

impl<H: DetailHandler> MarkerRenderer<H> {
    #[must_use]
    pub const fn new(handler: H, mode: LayerMode) -> Self {
        Self {
            handler,
            mode,
            zoom: DEFAULT_ZOOM,
            markers: Vec::new(),
            plot: None,
        }
    }

    #[must_use]
    pub const fn handler(&self) -> &H {
        &self.handler
    }

    #[must_use]
    pub const fn zoom(&self) -> f64 {
        self.zoom
    }

    #[must_use]
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    #[must_use]
    pub const fn plot(&self) -> Option<&PlotMarker> {
        self.plot.as_ref()
    }

    /// Replaces all markers with one per mappable report. Reports without
    /// finite in-bounds coordinates are skipped. Returns the marker count.
    pub fn render(&mut self, reports: &[Report]) -> usize {
        self.render_with(reports, StatusFilter::All, MarkerStyle::Standard)
    }

    /// Like [`Self::render`], keeping only reports that pass `filter`.
    pub fn render_filtered(&mut self, reports: &[Report], filter: StatusFilter) -> usize {
        self.render_with(reports, filter, MarkerStyle::Standard)
    }

    /// Renders a combined remote and local list in the heat style.
    pub fn render_heat(&mut self, reports: &[Report]) -> usize {
        self.render_with(reports, StatusFilter::All, MarkerStyle::Heat)
    }

    fn render_with(
        &mut self,
        reports: &[Report],
        filter: StatusFilter,
        marker_style: MarkerStyle,
    ) -> usize {
        let zoom = self.zoom;
        self.markers = reports
            .iter()
            .filter(|report| filter.matches(report))
            .filter_map(|report| {
                let Some((lat, lng)) = report.coordinates().filter(|_| report.is_mappable()) else {
                    log::trace!("Skipping unmappable report {}", report.id);
                    return None;
                };
                let base_radius = match marker_style {
                    MarkerStyle::Standard => style::base_radius(report.size),
                    MarkerStyle::Heat => style::heat_base_radius(report.size),
                };
                Some(Marker {
                    lat,
                    lng,
                    color: color_for(report),
                    base_radius,
                    radius: style::scaled_radius(base_radius, zoom),
                    style: marker_style,
                    report: report.clone(),
                })
            })
            .collect();

        log::debug!(
            "Rendered {} {marker_style:?} markers from {} reports ({filter})",
            self.markers.len(),
            reports.len()
        );
        self.markers.len()
    }

    /// Current grouping of markers. In [`LayerMode::Plain`] every marker is
    /// its own cluster.
    #[must_use]
    pub fn clusters(&self) -> Vec<Cluster> {
        let points: Vec<(f64, f64)> = self.markers.iter().map(|m| (m.lat, m.lng)).collect();
        match self.mode {
            LayerMode::Clustered => cluster::cluster_points(&points, self.zoom),
            LayerMode::Plain => cluster::singletons(&points),
        }
    }

    /// Applies a map event.
    pub fn handle_event(&mut self, event: MapEvent) {
        match event {
            MapEvent::ZoomEnd { zoom } => self.set_zoom(zoom),
            MapEvent::MarkerClick { marker } => {
                if let Some(marker) = self.markers.get(marker) {
                    self.handler.show_report(&marker.report);
                } else {
                    log::debug!("Click on unknown marker {marker}");
                }
            }
            MapEvent::ClusterClick { cluster } => {
                let Some(cluster) = self.clusters().into_iter().nth(cluster) else {
                    log::debug!("Click on unknown cluster {cluster}");
                    return;
                };
                let details = ClusterDetails {
                    total: cluster.len(),
                    reports: cluster
                        .members
                        .iter()
                        .take(CLUSTER_LIST_LIMIT)
                        .map(|&i| self.markers[i].report.clone())
                        .collect(),
                };
                self.handler.show_cluster(&details);
            }
        }
    }

    fn set_zoom(&mut self, zoom: f64) {
        if !zoom.is_finite() {
            return;
        }
        self.zoom = zoom;
        for marker in &mut self.markers {
            marker.radius = style::scaled_radius(marker.base_radius, zoom);
        }
        if let Some(plot) = &mut self.plot {
            plot.radius = style::scaled_radius(style::PLOT_BASE_RADIUS, zoom);
        }
    }

    /// Places the temporary marker for a new submission and zooms to it.
    /// Returns `false` if the coordinates are not finite.
    pub fn plot_marker(&mut self, report_id: &str, lat: f64, lng: f64) -> bool {
        if !lat.is_finite() || !lng.is_finite() {
            return false;
        }
        self.set_zoom(PLOT_ZOOM);
        self.plot = Some(PlotMarker {
            report_id: report_id.to_string(),
            lat,
            lng,
            radius: style::scaled_radius(style::PLOT_BASE_RADIUS, self.zoom),
            color: style::PLOT_COLOR,
        });
        true
    }

    pub fn clear_plot(&mut self) {
        self.plot = None;
    }

    /// Opens the details of a report by id, looking in the rendered markers
    /// first and then through the aggregator. Returns whether it was found.
    pub async fn open_details_by_id(&mut self, aggregator: &ReportAggregator, id: &str) -> bool {
        let cached: Vec<Report> = self.markers.iter().map(|m| m.report.clone()).collect();
        match aggregator.find_by_id(&cached, id).await {
            Some(report) => {
                self.handler.show_report(&report);
                true
            }
            None => false,
        }
    }
}
