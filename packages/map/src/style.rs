//! Marker colors and zoom-adaptive radii.

use basurant_report_models::{CanonicalStatus, Report, ReportSize};

pub const CLEANED_COLOR: &str = "#16a34a";
pub const ONGOING_COLOR: &str = "#f59e0b";
pub const SMALL_COLOR: &str = "#86B882";
pub const MEDIUM_COLOR: &str = "#FFC107";
pub const LARGE_COLOR: &str = "#F44336";

/// Zoom level at which a marker is drawn at its nominal size.
pub const REFERENCE_ZOOM: f64 = 13.0;

/// Growth factor per zoom level below [`REFERENCE_ZOOM`].
pub const ZOOM_SCALE: f64 = 1.12;

/// Padding added to every base radius.
pub const RADIUS_PADDING: u32 = 20;

/// Smallest radius ever drawn.
pub const MIN_RADIUS: u32 = 4;

/// Base radius of the temporary marker placed after a submission.
pub const PLOT_BASE_RADIUS: u32 = 18;

/// Color of the temporary marker placed after a submission.
pub const PLOT_COLOR: &str = CLEANED_COLOR;

/// Extra base radius of markers drawn in the heat view.
pub const HEAT_RADIUS_BONUS: u32 = 4;

/// Fill color: status wins for cleaned and ongoing reports, otherwise the
/// size decides. Unknown sizes get the large color.
#[must_use]
pub fn color_for(report: &Report) -> &'static str {
    match report.canonical_status() {
        CanonicalStatus::Cleaned => CLEANED_COLOR,
        CanonicalStatus::Ongoing => ONGOING_COLOR,
        CanonicalStatus::Pending => match report.size {
            Some(ReportSize::Small) => SMALL_COLOR,
            Some(ReportSize::Medium) => MEDIUM_COLOR,
            Some(ReportSize::Large) | None => LARGE_COLOR,
        },
    }
}

/// Nominal radius for a size. Unknown sizes draw as small.
#[must_use]
pub const fn base_radius(size: Option<ReportSize>) -> u32 {
    match size {
        Some(ReportSize::Small) | None => 6,
        Some(ReportSize::Medium) => 9,
        Some(ReportSize::Large) => 12,
    }
}

/// Nominal radius of a heat-view marker.
#[must_use]
pub const fn heat_base_radius(size: Option<ReportSize>) -> u32 {
    base_radius(size) + HEAT_RADIUS_BONUS
}

/// On-screen radius for a size at `zoom`.
#[must_use]
pub fn radius_for(size: Option<ReportSize>, zoom: f64) -> u32 {
    scaled_radius(base_radius(size), zoom)
}

/// `max(4, round((base + 20) * 1.12^(13 - zoom)))`.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::suboptimal_flops
)]
pub fn scaled_radius(base: u32, zoom: f64) -> u32 {
    let zoom = if zoom.is_finite() { zoom } else { REFERENCE_ZOOM };
    let scaled = f64::from(base + RADIUS_PADDING) * ZOOM_SCALE.powf(REFERENCE_ZOOM - zoom);
    let rounded = scaled.round().clamp(0.0, f64::from(u32::MAX)) as u32;
    rounded.max(MIN_RADIUS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(status: &str, size: Option<ReportSize>) -> Report {
        let mut r = Report::new("R-1");
        r.status = status.to_string();
        r.size = size;
        r
    }

    #[test]
    fn status_overrides_size() {
        assert_eq!(color_for(&report("done", Some(ReportSize::Large))), CLEANED_COLOR);
        assert_eq!(color_for(&report("assigned", Some(ReportSize::Small))), ONGOING_COLOR);
    }

    #[test]
    fn pending_reports_are_colored_by_size() {
        assert_eq!(color_for(&report("pending", Some(ReportSize::Small))), SMALL_COLOR);
        assert_eq!(color_for(&report("verified", Some(ReportSize::Medium))), MEDIUM_COLOR);
        assert_eq!(color_for(&report("", Some(ReportSize::Large))), LARGE_COLOR);
        assert_eq!(color_for(&report("pending", None)), LARGE_COLOR);
    }

    #[test]
    fn radius_at_reference_zoom_is_padded_base() {
        assert_eq!(radius_for(Some(ReportSize::Small), 13.0), 26);
        assert_eq!(radius_for(Some(ReportSize::Medium), 13.0), 29);
        assert_eq!(radius_for(Some(ReportSize::Large), 13.0), 32);
        assert_eq!(radius_for(None, 13.0), 26);
    }

    #[test]
    fn radius_shrinks_as_zoom_grows() {
        assert!(radius_for(Some(ReportSize::Small), 10.0) > radius_for(Some(ReportSize::Small), 16.0));
        // 26 * 1.12^-3 = 18.5
        assert_eq!(radius_for(Some(ReportSize::Small), 16.0), 19);
        // 26 * 1.12^3 = 36.5
        assert_eq!(radius_for(Some(ReportSize::Small), 10.0), 37);
    }

    #[test]
    fn radius_never_drops_below_minimum() {
        assert_eq!(radius_for(Some(ReportSize::Small), 60.0), MIN_RADIUS);
        assert_eq!(radius_for(Some(ReportSize::Small), f64::NAN), 26);
    }

    #[test]
    fn heat_markers_are_slightly_larger() {
        assert_eq!(heat_base_radius(Some(ReportSize::Small)), 10);
        assert_eq!(scaled_radius(heat_base_radius(Some(ReportSize::Large)), 13.0), 36);
    }

    #[test]
    fn plot_marker_is_larger_than_any_report() {
        assert!(scaled_radius(PLOT_BASE_RADIUS, 16.0) > radius_for(Some(ReportSize::Large), 16.0));
    }
}
