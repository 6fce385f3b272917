//! # Route Insight
//!
//! Route index, nearest-point lookup and surface statistics for interactive
//! route maps.
//!
//! This library provides:
//! - A per-route index built from loosely shaped elevation/surface samples
//! - Nearest point on the route with along-route distance from start and to end
//! - Surface composition (asphalt, gravel, trail, unknown) and legend data
//! - Nearby points of interest and marker reveal policies
//! - Elevation chart data synchronised with the route index
//! - An async JSON-source port with a URL-keyed cache for loading route documents
//!
//! ## Features
//!
//! - **`parallel`** - Build indexes for many routes with rayon
//! - **`http`** - Enable the reqwest-backed JSON source
//! - **`ffi`** - Enable FFI bindings for mobile platforms (iOS/Android)
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use route_insight::{find_nearest, aggregate, RouteIndex, RoutePoint};
//!
//! let points = vec![
//!     RoutePoint::new(59.0, 9.0, 0.0, 100.0).with_surface("asphalt"),
//!     RoutePoint::new(59.01, 9.0, 1.0, 150.0).with_surface("gravel"),
//! ];
//!
//! let index = RouteIndex::build(&points, false);
//! assert_eq!(index.total_distance_km(), 1.0);
//!
//! let nearest = find_nearest(&index, 59.0, 9.0).unwrap();
//! assert_eq!(nearest.sample_index, 0);
//! assert_eq!(nearest.to_end_km, 1.0);
//!
//! let surfaces = aggregate(&index);
//! assert!((surfaces.gravel_km - 1.0).abs() < 1e-9);
//! ```

use serde::{Deserialize, Serialize};

pub mod error;
pub use error::{Result, RouteDataError};

pub mod geo_utils;

// Per-route sample index
pub mod route_index;
pub use route_index::{RouteIndex, RoutePoint};
#[cfg(feature = "parallel")]
pub use route_index::build_indexes_parallel;

// Nearest point on route
pub mod nearest;
pub use nearest::{find_nearest, NearestPointResult, ProximityHint, ProximityThresholds};

// Surface classification and aggregation
pub mod surface;
pub use surface::{
    aggregate, CuratedSurface, SurfaceAggregate, SurfaceCategory, SurfaceLegendEntry,
    SurfaceSummary,
};

// Points of interest
pub mod poi;
pub use poi::{
    select_nearby, MarkerStrategy, NearbyConfig, NearbyPoi, PoiDisplayPolicy, PoiIndex,
    PoiRevealer, PoiText, PointOfInterest,
};

// Elevation chart data
pub mod profile;
pub use profile::{ElevationProfile, ProfileSample};

// JSON documents and the data-fetch port
pub mod source;
pub use source::{CachedSource, JsonSource, RouteDescriptor, RouteStats, StaticSource};

// HTTP-backed JSON source
#[cfg(feature = "http")]
pub mod http;
#[cfg(feature = "http")]
pub use http::HttpJsonSource;

// Per-route session: loading and position queries
pub mod route_view;
pub use route_view::{load_route_views, MapView, PositionReport, RouteView, RouteViewConfig};

#[cfg(feature = "ffi")]
mod ffi;

#[cfg(feature = "ffi")]
uniffi::setup_scaffolding!();

/// Initialize logging for Android (only used in FFI)
#[cfg(all(feature = "ffi", target_os = "android"))]
pub(crate) fn init_logging() {
    use android_logger::Config;
    use log::LevelFilter;

    android_logger::init_once(
        Config::default()
            .with_max_level(LevelFilter::Debug)
            .with_tag("RouteInsightRust"),
    );
}

#[cfg(all(feature = "ffi", not(target_os = "android")))]
pub(crate) fn init_logging() {
    // No-op on non-Android platforms
}

// ============================================================================
// Core Types
// ============================================================================

/// A GPS coordinate with latitude and longitude.
///
/// # Example
/// ```
/// use route_insight::GpsPoint;
/// let point = GpsPoint::new(59.83467, 9.57846);
/// assert!(point.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// Geographic bounding box (map viewport, route extent, search box).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Get the center point of the bounds.
    pub fn center(&self) -> GpsPoint {
        GpsPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }

    /// Whether the point lies inside the box (edges included).
    pub fn contains(&self, point: &GpsPoint) -> bool {
        point.latitude >= self.min_lat
            && point.latitude <= self.max_lat
            && point.longitude >= self.min_lng
            && point.longitude <= self.max_lng
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gps_point_validation() {
        assert!(GpsPoint::new(59.0, 9.0).is_valid());
        assert!(!GpsPoint::new(91.0, 0.0).is_valid());
        assert!(!GpsPoint::new(0.0, 181.0).is_valid());
        assert!(!GpsPoint::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_bounds_contains_and_center() {
        let bounds = Bounds { min_lat: 59.0, max_lat: 60.0, min_lng: 9.0, max_lng: 10.0 };
        assert!(bounds.contains(&GpsPoint::new(59.5, 9.5)));
        assert!(bounds.contains(&GpsPoint::new(59.0, 10.0)));
        assert!(!bounds.contains(&GpsPoint::new(58.9, 9.5)));
        assert_eq!(bounds.center(), GpsPoint::new(59.5, 9.5));
    }
}
