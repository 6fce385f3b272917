//! Nearest point on a route.
//!
//! Answers "where am I relative to this route?" for a position pin or a
//! geolocation fix: the closest route sample, how far away it is, and how
//! much of the route lies before and after it.

use serde::{Deserialize, Serialize};

use crate::geo_utils::haversine_distance;
use crate::route_index::RouteIndex;
use crate::GpsPoint;

/// Closest route sample to a query position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct NearestPointResult {
    /// Great-circle distance from the query to the sample, in meters
    pub nearest_distance_m: f64,
    /// Along-route distance of the sample from the start
    pub from_start_km: f64,
    /// Remaining along-route distance to the end (never negative)
    pub to_end_km: f64,
    /// Index of the sample in the route index
    pub sample_index: u32,
    /// Coordinates of the sample (for the nearest-point marker)
    pub position: GpsPoint,
}

impl NearestPointResult {
    /// Distance to the route in kilometers.
    pub fn nearest_distance_km(&self) -> f64 {
        self.nearest_distance_m / 1000.0
    }
}

/// Find the route sample closest to `(lat, lon)`.
///
/// Linear scan over every sample with finite coordinates using the haversine
/// distance; the first sample reaching the minimum wins. Returns `None`
/// when the index has no such sample.
///
/// # Example
/// ```
/// use route_insight::{find_nearest, RouteIndex, RoutePoint};
///
/// let index = RouteIndex::build(&[
///     RoutePoint::new(59.0, 9.0, 0.0, 100.0),
///     RoutePoint::new(59.01, 9.0, 1.0, 150.0),
/// ], false);
///
/// let result = find_nearest(&index, 59.0095, 9.0).unwrap();
/// assert_eq!(result.sample_index, 1);
/// assert_eq!(result.from_start_km, 1.0);
/// assert_eq!(result.to_end_km, 0.0);
/// ```
pub fn find_nearest(index: &RouteIndex, lat: f64, lon: f64) -> Option<NearestPointResult> {
    let query = GpsPoint::new(lat, lon);

    let mut best: Option<(usize, GpsPoint, f64)> = None;
    for (i, position) in index.positions() {
        let d = haversine_distance(&query, &position);
        if best.map_or(true, |(_, _, best_d)| d < best_d) {
            best = Some((i, position, d));
        }
    }

    let (i, position, nearest_distance_m) = best?;
    let from_start_km = index.distances_km()[i];
    let to_end_km = (index.total_distance_km() - from_start_km).max(0.0);

    Some(NearestPointResult {
        nearest_distance_m,
        from_start_km,
        to_end_km,
        sample_index: i as u32,
        position,
    })
}

/// Hint shown next to a position report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum ProximityHint {
    /// On or very close to the route
    OnRoute,
    /// Far away from the route
    FarFromRoute,
}

/// Distance bands for [`ProximityHint`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct ProximityThresholds {
    /// At or below this distance the position counts as on the route.
    /// Default: 0.2 km
    pub on_route_km: f64,
    /// At or above this distance the position counts as far from the route.
    /// Default: 5.0 km
    pub far_km: f64,
}

impl Default for ProximityThresholds {
    fn default() -> Self {
        Self {
            on_route_km: 0.2,
            far_km: 5.0,
        }
    }
}

impl ProximityThresholds {
    /// Classify a distance to the route; `None` between the two bands.
    pub fn classify(&self, distance_km: f64) -> Option<ProximityHint> {
        if distance_km <= self.on_route_km {
            Some(ProximityHint::OnRoute)
        } else if distance_km >= self.far_km {
            Some(ProximityHint::FarFromRoute)
        } else {
            None
        }
    }

    /// Classify a nearest-point result.
    pub fn hint(&self, result: &NearestPointResult) -> Option<ProximityHint> {
        self.classify(result.nearest_distance_km())
    }
}
