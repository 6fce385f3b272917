//! # Geographic Utilities
//!
//! Small geographic helpers shared by the route index, the nearest-point
//! finder and the POI selector.
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`haversine_distance`] | Great-circle distance in meters |
//! | [`haversine_km`] | Great-circle distance in kilometers |
//! | [`compute_bounds`] | Bounding box of the valid points of a track |
//! | [`search_boxes`] | Search boxes around a point, split at the antimeridian |
//!
//! ## Example
//!
//! ```rust
//! use route_insight::{GpsPoint, geo_utils};
//!
//! let start = GpsPoint::new(59.0, 9.0);
//! let end = GpsPoint::new(59.01, 9.0);
//!
//! // One hundredth of a degree of latitude is about 1.1 km
//! let km = geo_utils::haversine_km(&start, &end);
//! assert!((km - 1.112).abs() < 0.01);
//! ```
//!
//! All functions expect WGS84 coordinates in degrees. Distances use the
//! haversine formula on a sphere of radius [`EARTH_RADIUS_M`] (6371 km).

use geo::{Distance, Haversine, Point};

use crate::{Bounds, GpsPoint};

/// Earth radius used for every distance in this crate, in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Radius behind `geo`'s [`Haversine`] metric, in meters.
const GEO_MEAN_RADIUS_M: f64 = 6_371_008.8;

/// Relative slack on search-box radii, absorbing rounding at the box edge.
const SEARCH_SLACK: f64 = 1.01;

/// Great-circle distance between two points, in meters.
///
/// ```rust
/// use route_insight::{GpsPoint, geo_utils};
///
/// let a = GpsPoint::new(59.0, 9.0);
/// let b = GpsPoint::new(59.0, 9.001);
/// let d = geo_utils::haversine_distance(&a, &b);
/// assert!((d - 57.3).abs() < 1.0);
/// ```
#[inline]
pub fn haversine_distance(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    let point1 = Point::new(p1.longitude, p1.latitude);
    let point2 = Point::new(p2.longitude, p2.latitude);
    // Haversine distance scales linearly with the radius
    Haversine::distance(point1, point2) * (EARTH_RADIUS_M / GEO_MEAN_RADIUS_M)
}

/// Great-circle distance between two points, in kilometers.
#[inline]
pub fn haversine_km(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    haversine_distance(p1, p2) / 1000.0
}

/// Bounding box of the valid points of a track.
///
/// Points with non-finite or out-of-range coordinates are ignored. Returns
/// `None` when no point is valid.
pub fn compute_bounds<'a, I>(points: I) -> Option<Bounds>
where
    I: IntoIterator<Item = &'a GpsPoint>,
{
    let mut valid = points.into_iter().filter(|p| p.is_valid()).peekable();
    valid.peek()?;

    let mut min_lat = f64::MAX;
    let mut max_lat = f64::MIN;
    let mut min_lng = f64::MAX;
    let mut max_lng = f64::MIN;

    for p in valid {
        min_lat = min_lat.min(p.latitude);
        max_lat = max_lat.max(p.latitude);
        min_lng = min_lng.min(p.longitude);
        max_lng = max_lng.max(p.longitude);
    }

    Some(Bounds { min_lat, max_lat, min_lng, max_lng })
}

/// Boxes that together contain every point within `radius_m` of `center`.
///
/// Usually one box. A box crossing the antimeridian is split in two, and a
/// circle reaching a pole (or wide enough to wrap) spans every longitude.
///
/// The longitude half-width comes from the haversine formula:
/// `hav(d/R) >= cos φ1 · cos φ2 · hav(Δλ)`, so with `c` the smallest cosine
/// of any latitude in the box, `sin(Δλ/2) <= sin(d/2R) / c`.
///
/// ```rust
/// use route_insight::{GpsPoint, geo_utils};
///
/// let boxes = geo_utils::search_boxes(&GpsPoint::new(0.0, 179.99), 5000.0);
/// assert_eq!(boxes.len(), 2);
/// assert!(boxes.iter().any(|b| b.contains(&GpsPoint::new(0.0, -179.99))));
/// ```
pub fn search_boxes(center: &GpsPoint, radius_m: f64) -> Vec<Bounds> {
    let theta = radius_m.max(0.0) * SEARCH_SLACK / EARTH_RADIUS_M;
    let lat_deg = theta.to_degrees();

    let min_lat = (center.latitude - lat_deg).max(-90.0);
    let max_lat = (center.latitude + lat_deg).min(90.0);

    let all_longitudes = |min_lat, max_lat| Bounds { min_lat, max_lat, min_lng: -180.0, max_lng: 180.0 };

    if theta >= std::f64::consts::PI || min_lat <= -90.0 || max_lat >= 90.0 {
        return vec![all_longitudes(min_lat, max_lat)];
    }

    let min_cos = min_lat.abs().max(max_lat.abs()).to_radians().cos();
    let sin_half = (theta / 2.0).sin() / min_cos;
    if sin_half >= 1.0 {
        return vec![all_longitudes(min_lat, max_lat)];
    }

    let lng_deg = (2.0 * sin_half.asin()).to_degrees();
    if lng_deg >= 180.0 {
        return vec![all_longitudes(min_lat, max_lat)];
    }

    let lng = (center.longitude + 180.0).rem_euclid(360.0) - 180.0;
    let min_lng = lng - lng_deg;
    let max_lng = lng + lng_deg;
    let span = |min_lng, max_lng| Bounds { min_lat, max_lat, min_lng, max_lng };

    if min_lng < -180.0 {
        vec![span(min_lng + 360.0, 180.0), span(-180.0, max_lng)]
    } else if max_lng > 180.0 {
        vec![span(min_lng, 180.0), span(-180.0, max_lng - 360.0)]
    } else {
        vec![span(min_lng, max_lng)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    #[test]
    fn test_haversine_distance_same_point() {
        let p = GpsPoint::new(59.83467, 9.57846);
        assert_eq!(haversine_distance(&p, &p), 0.0);
    }

    #[test]
    fn test_haversine_known_value() {
        // Oslo to Bergen is roughly 305 km
        let oslo = GpsPoint::new(59.9139, 10.7522);
        let bergen = GpsPoint::new(60.3913, 5.3221);
        assert!(approx_eq(haversine_km(&oslo, &bergen), 305.0, 10.0));
    }

    #[test]
    fn test_haversine_longitude_step_at_59n() {
        let a = GpsPoint::new(59.0, 9.0);
        let b = GpsPoint::new(59.0, 9.001);
        // 0.001° of longitude at 59°N: 111.195 m * cos(59°)
        assert!(approx_eq(haversine_distance(&a, &b), 57.27, 0.5));
    }

    #[test]
    fn test_compute_bounds_skips_invalid() {
        let track = vec![
            GpsPoint::new(59.0, 9.0),
            GpsPoint::new(f64::NAN, 9.5),
            GpsPoint::new(59.2, 9.1),
        ];
        let bounds = compute_bounds(&track).unwrap();
        assert_eq!(bounds.min_lat, 59.0);
        assert_eq!(bounds.max_lat, 59.2);
        assert_eq!(bounds.min_lng, 9.0);
        assert_eq!(bounds.max_lng, 9.1);
    }

    #[test]
    fn test_compute_bounds_empty() {
        let empty: Vec<GpsPoint> = vec![];
        assert!(compute_bounds(&empty).is_none());
        assert!(compute_bounds(&[GpsPoint::new(f64::NAN, 0.0)]).is_none());
    }

    #[test]
    fn test_search_box_contains_radius() {
        let center = GpsPoint::new(59.0, 9.0);
        let boxes = search_boxes(&center, 1000.0);
        assert_eq!(boxes.len(), 1);

        let north = GpsPoint::new(59.0 + 1000.0 / 111_195.0, 9.0);
        let east = GpsPoint::new(59.0, 9.0 + 0.0174);
        assert!(boxes[0].contains(&north));
        assert!(boxes[0].contains(&east));
        assert!(!boxes[0].contains(&GpsPoint::new(59.0, 9.05)));
    }

    #[test]
    fn test_search_boxes_split_at_antimeridian() {
        let boxes = search_boxes(&GpsPoint::new(0.0, -179.9999), 5000.0);
        assert_eq!(boxes.len(), 2);
        assert!(boxes.iter().any(|b| b.contains(&GpsPoint::new(0.0, 179.9999))));
        assert!(boxes.iter().any(|b| b.contains(&GpsPoint::new(0.0, -179.96))));
        assert!(boxes.iter().all(|b| b.min_lng >= -180.0 && b.max_lng <= 180.0));
    }

    #[test]
    fn test_search_boxes_near_pole() {
        // 1° of longitude at 88°N is under 4 km
        let center = GpsPoint::new(88.0, 0.0);
        let poi = GpsPoint::new(88.0, 1.0);
        assert!(haversine_distance(&center, &poi) < 5000.0);
        assert!(search_boxes(&center, 5000.0).iter().any(|b| b.contains(&poi)));

        let boxes = search_boxes(&GpsPoint::new(89.99, 0.0), 5000.0);
        assert_eq!(boxes.len(), 1);
        assert_eq!((boxes[0].min_lng, boxes[0].max_lng), (-180.0, 180.0));
        assert_eq!(boxes[0].max_lat, 90.0);
    }

    #[test]
    fn test_radius_constant() {
        // A quarter meridian on a 6371 km sphere
        let d = haversine_distance(&GpsPoint::new(0.0, 0.0), &GpsPoint::new(90.0, 0.0));
        assert!(approx_eq(d, EARTH_RADIUS_M * std::f64::consts::FRAC_PI_2, 1e-3));
    }
}
