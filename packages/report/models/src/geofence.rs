//! Rectangular submission geofence.

use serde::{Deserialize, Serialize};

/// A latitude/longitude bounding box. Bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Geofence {
    /// Southern latitude boundary.
    pub min_lat: f64,
    /// Northern latitude boundary.
    pub max_lat: f64,
    /// Western longitude boundary.
    pub min_lng: f64,
    /// Eastern longitude boundary.
    pub max_lng: f64,
}

/// Baguio City. Reports outside this box are rejected at submission.
pub const BAGUIO_GEOFENCE: Geofence = Geofence {
    min_lat: 16.30,
    max_lat: 16.45,
    min_lng: 120.56,
    max_lng: 120.66,
};

/// Default map center (Baguio City proper).
pub const MAP_CENTER: (f64, f64) = (16.4023, 120.5960);

impl Geofence {
    /// Returns `true` if the point is finite and inside the box.
    #[must_use]
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        lat.is_finite()
            && lng.is_finite()
            && lat >= self.min_lat
            && lat <= self.max_lat
            && lng >= self.min_lng
            && lng <= self.max_lng
    }
}

/// Checks a point against [`BAGUIO_GEOFENCE`].
#[must_use]
pub fn is_within_bounds(lat: f64, lng: f64) -> bool {
    BAGUIO_GEOFENCE.contains(lat, lng)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn city_center_is_inside() {
        assert!(is_within_bounds(16.40, 120.59));
        assert!(is_within_bounds(MAP_CENTER.0, MAP_CENTER.1));
    }

    #[test]
    fn origin_is_outside() {
        assert!(!is_within_bounds(0.0, 0.0));
    }

    #[test]
    fn edges_are_inclusive() {
        assert!(is_within_bounds(16.30, 120.56));
        assert!(is_within_bounds(16.45, 120.66));
        assert!(!is_within_bounds(16.451, 120.60));
    }

    #[test]
    fn non_finite_is_outside() {
        assert!(!is_within_bounds(f64::NAN, 120.60));
        assert!(!is_within_bounds(16.40, f64::INFINITY));
    }
}
