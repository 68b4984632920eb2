//! Greedy marker clustering in Web-Mercator pixel space.
//!
//! Markers are visited in order. Each one joins the nearest existing
//! cluster whose seed lies within [`MAX_CLUSTER_RADIUS_PX`] screen pixels at
//! the current zoom, or seeds a new cluster. Seeds live in an R-tree so the
//! neighbourhood query stays logarithmic.

use std::f64::consts::PI;

use rstar::{AABB, RTree, RTreeObject};
use serde::Serialize;

/// Pixel radius within which markers merge.
pub const MAX_CLUSTER_RADIUS_PX: f64 = 60.0;

/// At or above this zoom every marker stands alone.
pub const DISABLE_CLUSTERING_AT_ZOOM: f64 = 17.0;

/// Side length of one map tile in pixels.
const TILE_SIZE: f64 = 256.0;

/// Latitude limit of the Web-Mercator projection.
const MAX_LATITUDE: f64 = 85.051_128_78;

/// A group of markers drawn as one symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    /// Indices into the clustered point list, in visiting order.
    pub members: Vec<usize>,
    /// Mean position of the members.
    pub lat: f64,
    pub lng: f64,
}

impl Cluster {
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    #[must_use]
    pub fn is_singleton(&self) -> bool {
        self.members.len() == 1
    }
}

struct Seed {
    point: [f64; 2],
    cluster: usize,
}

impl RTreeObject for Seed {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

/// Projects a coordinate to global pixel space at `zoom` (levels are
/// floored, as tiles are drawn at integer zoom).
#[must_use]
pub fn project(lat: f64, lng: f64, zoom: f64) -> [f64; 2] {
    let scale = TILE_SIZE * 2f64.powf(zoom.floor());
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = (lng + 180.0) / 360.0 * scale;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * scale;
    [x, y]
}

/// Clusters `(lat, lng)` points at `zoom`.
///
/// At or above [`DISABLE_CLUSTERING_AT_ZOOM`] every point becomes its own
/// cluster.
#[must_use]
pub fn cluster_points(points: &[(f64, f64)], zoom: f64) -> Vec<Cluster> {
    if zoom >= DISABLE_CLUSTERING_AT_ZOOM {
        return singletons(points);
    }

    let radius_2 = MAX_CLUSTER_RADIUS_PX * MAX_CLUSTER_RADIUS_PX;
    let mut seeds: RTree<Seed> = RTree::new();
    let mut clusters: Vec<Cluster> = Vec::new();
    let mut sums: Vec<(f64, f64)> = Vec::new();

    for (index, &(lat, lng)) in points.iter().enumerate() {
        let point = project(lat, lng, zoom);
        let query = AABB::from_corners(
            [point[0] - MAX_CLUSTER_RADIUS_PX, point[1] - MAX_CLUSTER_RADIUS_PX],
            [point[0] + MAX_CLUSTER_RADIUS_PX, point[1] + MAX_CLUSTER_RADIUS_PX],
        );

        let nearest = seeds
            .locate_in_envelope_intersecting(&query)
            .map(|seed| (distance_2(seed.point, point), seed.cluster))
            .filter(|(d, _)| *d <= radius_2)
            .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        if let Some((_, cluster)) = nearest {
            clusters[cluster].members.push(index);
            sums[cluster].0 += lat;
            sums[cluster].1 += lng;
        } else {
            seeds.insert(Seed {
                point,
                cluster: clusters.len(),
            });
            clusters.push(Cluster {
                members: vec![index],
                lat,
                lng,
            });
            sums.push((lat, lng));
        }
    }

    for (cluster, (lat_sum, lng_sum)) in clusters.iter_mut().zip(sums) {
        #[allow(clippy::cast_precision_loss)]
        let n = cluster.members.len() as f64;
        cluster.lat = lat_sum / n;
        cluster.lng = lng_sum / n;
    }

    log::trace!(
        "Clustered {} points into {} groups at zoom {zoom}",
        points.len(),
        clusters.len()
    );
    clusters
}

/// One cluster per point.
#[must_use]
pub fn singletons(points: &[(f64, f64)]) -> Vec<Cluster> {
    points
        .iter()
        .enumerate()
        .map(|(index, &(lat, lng))| Cluster {
            members: vec![index],
            lat,
            lng,
        })
        .collect()
}

fn distance_2(a: [f64; 2], b: [f64; 2]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    dx.mul_add(dx, dy * dy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projects_origin_to_map_center() {
        let [x, y] = project(0.0, 0.0, 0.0);
        assert!((x - 128.0).abs() < 1e-9);
        assert!((y - 128.0).abs() < 1e-9);

        let [x, _] = project(0.0, 0.0, 1.0);
        assert!((x - 256.0).abs() < 1e-9);
    }

    #[test]
    fn nearby_points_merge_at_city_zoom() {
        // ~50 m apart, well under 60 px at zoom 13.
        let points = [(16.4000, 120.5900), (16.4004, 120.5903), (16.4300, 120.6400)];
        let clusters = cluster_points(&points, 13.0);

        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].members, vec![0, 1]);
        assert!((clusters[0].lat - 16.4002).abs() < 1e-9);
        assert_eq!(clusters[1].members, vec![2]);
        assert!(clusters[1].is_singleton());
    }

    #[test]
    fn the_same_points_separate_when_zoomed_in() {
        let points = [(16.4000, 120.5900), (16.4040, 120.5940)];
        assert_eq!(cluster_points(&points, 12.0).len(), 1);
        assert_eq!(cluster_points(&points, 16.0).len(), 2);
    }

    #[test]
    fn clustering_is_disabled_at_high_zoom() {
        let points = [(16.4, 120.59), (16.4, 120.59)];
        assert_eq!(cluster_points(&points, 16.0).len(), 1);
        assert_eq!(cluster_points(&points, DISABLE_CLUSTERING_AT_ZOOM).len(), 2);
    }

    #[test]
    fn every_point_lands_in_exactly_one_cluster() {
        let points: Vec<(f64, f64)> = (0..40)
            .map(|i| {
                let f = f64::from(i);
                (16.35 + f * 0.002, 120.57 + f * 0.0015)
            })
            .collect();
        let clusters = cluster_points(&points, 14.0);

        let mut seen: Vec<usize> = clusters.iter().flat_map(|c| c.members.clone()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..40).collect::<Vec<_>>());
    }

    #[test]
    fn empty_input_has_no_clusters() {
        assert!(cluster_points(&[], 13.0).is_empty());
    }
}
