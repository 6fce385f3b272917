//! Per-route sample index.
//!
//! A [`RouteIndex`] is built once per route from the elevation/surface
//! samples and is read-only afterwards. It stores parallel sequences of
//! along-route distance, coordinates, elevation and surface category, which
//! the nearest-point, surface and chart queries scan directly.
//!
//! Input samples are loosely shaped: any numeric field may be missing,
//! non-finite, or sent as a string, and the surface label may live under
//! one of three field names. All of that tolerance lives here, at the
//! ingestion boundary.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::source::loose;
use crate::surface::SurfaceCategory;
use crate::{geo_utils, Bounds, GpsPoint};

/// One raw elevation/location sample, as found in elevation documents.
///
/// Accepted JSON field names: `lat`/`latitude`, `lon`/`lng`/`longitude`,
/// `distance`/`distanceKm` (kilometers), `elevation`/`ele`/`elevationM`
/// (meters), and the surface label fields `surfaceCategory`, `surface` and
/// `category`. Numbers may be JSON strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct RoutePoint {
    #[serde(default, alias = "lat", deserialize_with = "loose::number")]
    pub latitude: Option<f64>,
    #[serde(default, alias = "lon", alias = "lng", deserialize_with = "loose::number")]
    pub longitude: Option<f64>,
    #[serde(default, rename = "distance", alias = "distanceKm", deserialize_with = "loose::number")]
    pub distance_km: Option<f64>,
    #[serde(
        default,
        rename = "elevation",
        alias = "ele",
        alias = "elevationM",
        deserialize_with = "loose::number"
    )]
    pub elevation_m: Option<f64>,
    #[serde(default, deserialize_with = "loose::label")]
    pub surface_category: Option<String>,
    #[serde(default, deserialize_with = "loose::label")]
    pub surface: Option<String>,
    #[serde(default, deserialize_with = "loose::label")]
    pub category: Option<String>,
}

impl RoutePoint {
    /// Create a fully populated sample without a surface label.
    pub fn new(latitude: f64, longitude: f64, distance_km: f64, elevation_m: f64) -> Self {
        Self {
            latitude: Some(latitude),
            longitude: Some(longitude),
            distance_km: Some(distance_km),
            elevation_m: Some(elevation_m),
            ..Self::default()
        }
    }

    /// Set the primary surface label (`surfaceCategory`).
    pub fn with_surface(mut self, label: &str) -> Self {
        self.surface_category = Some(label.to_string());
        self
    }

    /// The surface label to classify: `surface_category`, then `surface`,
    /// then `category`. The first present slot wins, even when empty.
    pub fn surface_label(&self) -> Option<&str> {
        self.surface_category
            .as_deref()
            .or(self.surface.as_deref())
            .or(self.category.as_deref())
    }

    /// True when distance, elevation and both coordinates are present.
    ///
    /// The loading shell drops samples that fail this check before indexing.
    pub fn is_complete(&self) -> bool {
        self.latitude.is_some()
            && self.longitude.is_some()
            && self.distance_km.is_some()
            && self.elevation_m.is_some()
    }
}

/// Read-only per-route lookup structure over the route samples.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteIndex {
    distances_km: Vec<f64>,
    latitudes: Vec<f64>,
    longitudes: Vec<f64>,
    elevations_m: Vec<f64>,
    surfaces: Vec<SurfaceCategory>,
    total_distance_km: f64,
    unknown_as_trail: bool,
}

impl RouteIndex {
    /// Build the index from ordered route samples.
    ///
    /// Missing or non-finite distance and elevation values are replaced by
    /// the previous sample's value (0 for the first sample). Coordinates are
    /// kept as given, with missing ones stored as NaN; coordinate queries
    /// skip them. Surface labels are classified with
    /// [`SurfaceCategory::classify`]. An empty input gives an empty index
    /// with a total of 0.
    ///
    /// # Example
    /// ```
    /// use route_insight::{RouteIndex, RoutePoint};
    ///
    /// let mut gap = RoutePoint::new(59.005, 9.0, 0.5, 0.0);
    /// gap.elevation_m = None;
    ///
    /// let points = vec![
    ///     RoutePoint::new(59.0, 9.0, 0.0, 100.0),
    ///     gap,
    ///     RoutePoint::new(59.01, 9.0, 1.0, 150.0),
    /// ];
    ///
    /// let index = RouteIndex::build(&points, false);
    /// assert_eq!(index.elevations_m(), &[100.0, 100.0, 150.0]);
    /// assert_eq!(index.total_distance_km(), 1.0);
    /// ```
    pub fn build(points: &[RoutePoint], unknown_as_trail: bool) -> Self {
        let n = points.len();
        let mut distances_km = Vec::with_capacity(n);
        let mut latitudes = Vec::with_capacity(n);
        let mut longitudes = Vec::with_capacity(n);
        let mut elevations_m = Vec::with_capacity(n);
        let mut surfaces = Vec::with_capacity(n);

        let mut last_distance = 0.0;
        let mut last_elevation = 0.0;

        for point in points {
            let distance = finite_or(point.distance_km, last_distance);
            let elevation = finite_or(point.elevation_m, last_elevation);
            last_distance = distance;
            last_elevation = elevation;

            distances_km.push(distance);
            elevations_m.push(elevation);
            latitudes.push(point.latitude.unwrap_or(f64::NAN));
            longitudes.push(point.longitude.unwrap_or(f64::NAN));
            surfaces.push(SurfaceCategory::classify(point.surface_label(), unknown_as_trail));
        }

        let total_distance_km = distances_km.last().copied().unwrap_or(0.0);

        debug!(
            "[RouteIndex] Built {} samples, {:.2} km (unknown_as_trail={})",
            n, total_distance_km, unknown_as_trail
        );

        Self {
            distances_km,
            latitudes,
            longitudes,
            elevations_m,
            surfaces,
            total_distance_km,
            unknown_as_trail,
        }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.distances_km.len()
    }

    /// True when the index holds no samples.
    pub fn is_empty(&self) -> bool {
        self.distances_km.is_empty()
    }

    /// Along-route distance per sample, in kilometers.
    pub fn distances_km(&self) -> &[f64] {
        &self.distances_km
    }

    /// Latitude per sample (NaN when missing).
    pub fn latitudes(&self) -> &[f64] {
        &self.latitudes
    }

    /// Longitude per sample (NaN when missing).
    pub fn longitudes(&self) -> &[f64] {
        &self.longitudes
    }

    /// Elevation per sample, in meters.
    pub fn elevations_m(&self) -> &[f64] {
        &self.elevations_m
    }

    /// Surface category per sample.
    pub fn surfaces(&self) -> &[SurfaceCategory] {
        &self.surfaces
    }

    /// Distance of the last sample, in kilometers.
    pub fn total_distance_km(&self) -> f64 {
        self.total_distance_km
    }

    /// Whether unknown surfaces were folded into trail at build time.
    pub fn unknown_as_trail(&self) -> bool {
        self.unknown_as_trail
    }

    /// Coordinates of sample `i`, if both are finite.
    pub fn position(&self, i: usize) -> Option<GpsPoint> {
        let lat = *self.latitudes.get(i)?;
        let lon = *self.longitudes.get(i)?;
        (lat.is_finite() && lon.is_finite()).then(|| GpsPoint::new(lat, lon))
    }

    /// Samples with finite coordinates, with their index.
    pub fn positions(&self) -> impl Iterator<Item = (usize, GpsPoint)> + '_ {
        (0..self.len()).filter_map(move |i| self.position(i).map(|p| (i, p)))
    }

    /// First sample with finite coordinates (initial moving-marker location).
    pub fn first_valid_position(&self) -> Option<GpsPoint> {
        self.positions().next().map(|(_, p)| p)
    }

    /// Bounding box of the valid sample coordinates.
    pub fn bounds(&self) -> Option<Bounds> {
        let points: Vec<GpsPoint> = self.positions().map(|(_, p)| p).collect();
        geo_utils::compute_bounds(&points)
    }

    /// Sample whose along-route distance is closest to `distance_km`.
    ///
    /// Used to move the map marker when hovering over the elevation chart.
    /// Ties resolve to the earlier sample.
    pub fn sample_at_distance(&self, distance_km: f64) -> Option<usize> {
        if !distance_km.is_finite() {
            return None;
        }

        let mut best: Option<(usize, f64)> = None;
        for (i, d) in self.distances_km.iter().enumerate() {
            let gap = (d - distance_km).abs();
            if best.map_or(true, |(_, g)| gap < g) {
                best = Some((i, gap));
            }
        }
        best.map(|(i, _)| i)
    }
}

#[inline]
fn finite_or(value: Option<f64>, fallback: f64) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(fallback)
}

/// Build indexes for several routes in parallel.
///
/// Output order matches input order; each index is identical to what
/// [`RouteIndex::build`] returns for the same samples.
#[cfg(feature = "parallel")]
pub fn build_indexes_parallel(
    routes: &[(String, Vec<RoutePoint>)],
    unknown_as_trail: bool,
) -> Vec<(String, RouteIndex)> {
    use rayon::prelude::*;

    routes
        .par_iter()
        .map(|(route_id, points)| (route_id.clone(), RouteIndex::build(points, unknown_as_trail)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_route() -> Vec<RoutePoint> {
        vec![
            RoutePoint::new(59.0, 9.0, 0.0, 100.0).with_surface("asphalt"),
            RoutePoint::new(59.005, 9.0, 0.5, 120.0).with_surface("gravel"),
            RoutePoint::new(59.01, 9.0, 1.0, 150.0).with_surface("trail"),
        ]
    }

    #[test]
    fn test_build_basic() {
        let index = RouteIndex::build(&sample_route(), false);
        assert_eq!(index.len(), 3);
        assert_eq!(index.distances_km(), &[0.0, 0.5, 1.0]);
        assert_eq!(index.elevations_m(), &[100.0, 120.0, 150.0]);
        assert_eq!(
            index.surfaces(),
            &[SurfaceCategory::Asphalt, SurfaceCategory::Gravel, SurfaceCategory::Trail]
        );
        assert_eq!(index.total_distance_km(), 1.0);
    }

    #[test]
    fn test_empty_input() {
        let index = RouteIndex::build(&[], true);
        assert!(index.is_empty());
        assert_eq!(index.total_distance_km(), 0.0);
        assert!(index.first_valid_position().is_none());
        assert!(index.bounds().is_none());
        assert!(index.sample_at_distance(0.0).is_none());
    }

    #[test]
    fn test_carry_forward() {
        let mut points = sample_route();
        points[1].distance_km = Some(f64::NAN);
        points[1].elevation_m = None;
        points[2].elevation_m = Some(f64::INFINITY);

        let index = RouteIndex::build(&points, false);
        assert_eq!(index.distances_km(), &[0.0, 0.0, 1.0]);
        assert_eq!(index.elevations_m(), &[100.0, 100.0, 100.0]);
    }

    #[test]
    fn test_first_sample_defaults_to_zero() {
        let points = vec![
            RoutePoint { latitude: Some(59.0), longitude: Some(9.0), ..RoutePoint::default() },
            RoutePoint::new(59.01, 9.0, 1.0, 150.0),
        ];
        let index = RouteIndex::build(&points, false);
        assert_eq!(index.distances_km()[0], 0.0);
        assert_eq!(index.elevations_m()[0], 0.0);
        assert_eq!(index.surfaces()[0], SurfaceCategory::Unknown);
    }

    #[test]
    fn test_total_from_carried_distance() {
        let mut points = sample_route();
        points[2].distance_km = None;
        let index = RouteIndex::build(&points, false);
        assert_eq!(index.total_distance_km(), 0.5);
    }

    #[test]
    fn test_surface_label_priority() {
        let point = RoutePoint {
            surface_category: None,
            surface: Some("gravel".into()),
            category: Some("asphalt".into()),
            ..RoutePoint::new(59.0, 9.0, 0.0, 0.0)
        };
        assert_eq!(point.surface_label(), Some("gravel"));

        let point = RoutePoint {
            surface_category: Some("".into()),
            surface: Some("gravel".into()),
            ..RoutePoint::new(59.0, 9.0, 0.0, 0.0)
        };
        let index = RouteIndex::build(&[point], false);
        assert_eq!(index.surfaces(), &[SurfaceCategory::Unknown]);
    }

    #[test]
    fn test_unknown_as_trail() {
        let points = vec![
            RoutePoint::new(59.0, 9.0, 0.0, 100.0),
            RoutePoint::new(59.01, 9.0, 1.0, 150.0).with_surface("boardwalk"),
        ];
        let index = RouteIndex::build(&points, true);
        assert!(index.unknown_as_trail());
        assert_eq!(index.surfaces(), &[SurfaceCategory::Trail, SurfaceCategory::Trail]);
    }

    #[test]
    fn test_build_is_pure() {
        let points = sample_route();
        assert_eq!(RouteIndex::build(&points, false), RouteIndex::build(&points, false));
    }

    #[test]
    fn test_positions_skip_missing_coordinates() {
        let mut points = sample_route();
        points[0].latitude = None;
        let index = RouteIndex::build(&points, false);

        assert!(index.latitudes()[0].is_nan());
        assert!(index.position(0).is_none());
        assert_eq!(index.first_valid_position(), Some(GpsPoint::new(59.005, 9.0)));
        assert_eq!(index.positions().count(), 2);

        let bounds = index.bounds().unwrap();
        assert_eq!(bounds.min_lat, 59.005);
        assert_eq!(bounds.max_lat, 59.01);
    }

    #[test]
    fn test_sample_at_distance() {
        let index = RouteIndex::build(&sample_route(), false);
        assert_eq!(index.sample_at_distance(0.1), Some(0));
        assert_eq!(index.sample_at_distance(0.6), Some(1));
        assert_eq!(index.sample_at_distance(0.75), Some(1));
        assert_eq!(index.sample_at_distance(5.0), Some(2));
        assert_eq!(index.sample_at_distance(f64::NAN), None);
    }

    #[test]
    fn test_deserialize_loose_sample() {
        let point: RoutePoint = serde_json::from_value(serde_json::json!({
            "lat": "59.5",
            "lng": 9.25,
            "distance": "1.75",
            "ele": null,
            "surface": "Gravel",
            "category": 3
        }))
        .unwrap();

        assert_eq!(point.latitude, Some(59.5));
        assert_eq!(point.longitude, Some(9.25));
        assert_eq!(point.distance_km, Some(1.75));
        assert_eq!(point.elevation_m, None);
        assert_eq!(point.surface_label(), Some("Gravel"));
        assert_eq!(point.category.as_deref(), Some("3"));
        assert!(!point.is_complete());
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_sequential() {
        let routes = vec![
            ("a".to_string(), sample_route()),
            ("b".to_string(), sample_route()[..2].to_vec()),
        ];
        let built = build_indexes_parallel(&routes, false);
        assert_eq!(built.len(), 2);
        assert_eq!(built[0].0, "a");
        assert_eq!(built[1].1, RouteIndex::build(&routes[1].1, false));
    }
}
