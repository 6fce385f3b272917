//! Bindings for the mobile and web shells.
//!
//! Exposes the pure core through uniffi. The route index is an object the
//! shell builds once per route and queries on every pointer move, so it is
//! handed out behind an `Arc`.

use std::sync::Arc;

use log::{debug, info};

use crate::{
    aggregate, find_nearest, init_logging, select_nearby, CuratedSurface, ElevationProfile,
    GpsPoint, NearbyConfig, NearestPointResult, PoiDisplayPolicy, PointOfInterest, ProximityHint,
    ProximityThresholds, RouteIndex, RoutePoint, SurfaceAggregate, SurfaceSummary,
};

// ============================================================================
// Route index
// ============================================================================

/// Shared, read-only route index.
#[derive(Debug, uniffi::Object)]
pub struct RouteIndexHandle {
    index: RouteIndex,
}

#[uniffi::export]
impl RouteIndexHandle {
    /// Build the index from route samples.
    #[uniffi::constructor]
    pub fn new(points: Vec<RoutePoint>, unknown_as_trail: bool) -> Arc<Self> {
        init_logging();
        info!(
            "[RouteInsightRust] Building route index from {} samples",
            points.len()
        );
        Arc::new(Self {
            index: RouteIndex::build(&points, unknown_as_trail),
        })
    }

    pub fn len(&self) -> u32 {
        self.index.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn total_distance_km(&self) -> f64 {
        self.index.total_distance_km()
    }

    pub fn first_valid_position(&self) -> Option<GpsPoint> {
        self.index.first_valid_position()
    }

    /// Coordinates of a sample (moving marker on chart hover).
    pub fn position(&self, sample_index: u32) -> Option<GpsPoint> {
        self.index.position(sample_index as usize)
    }

    /// Sample closest in along-route distance to `distance_km`.
    pub fn sample_at_distance(&self, distance_km: f64) -> Option<u32> {
        self.index.sample_at_distance(distance_km).map(|i| i as u32)
    }

    pub fn find_nearest(&self, lat: f64, lon: f64) -> Option<NearestPointResult> {
        let result = find_nearest(&self.index, lat, lon);
        if let Some(ref r) = result {
            debug!(
                "[RouteInsightRust] Nearest sample {} at {:.0} m",
                r.sample_index, r.nearest_distance_m
            );
        }
        result
    }

    pub fn surface_aggregate(&self) -> SurfaceAggregate {
        aggregate(&self.index)
    }

    /// Legend data, falling back to curated totals per category.
    pub fn surface_summary(&self, curated: Option<CuratedSurface>) -> Option<SurfaceSummary> {
        let computed = aggregate(&self.index);
        SurfaceSummary::resolve(Some(&computed), curated.as_ref(), self.index.unknown_as_trail())
    }

    pub fn elevation_profile(&self) -> ElevationProfile {
        ElevationProfile::from_index(&self.index)
    }
}

// ============================================================================
// Stateless helpers
// ============================================================================

/// A POI with its distance from the query position (owned for FFI).
#[derive(Debug, Clone, uniffi::Record)]
pub struct NearbyPoiEntry {
    pub poi: PointOfInterest,
    pub distance_m: f64,
}

/// POIs within `config.radius_m` of `center`, closest first.
#[uniffi::export]
pub fn ffi_select_nearby(
    pois: Vec<PointOfInterest>,
    center: GpsPoint,
    config: NearbyConfig,
) -> Vec<NearbyPoiEntry> {
    init_logging();
    select_nearby(&pois, &center, config.radius_m, config.limit as usize)
        .into_iter()
        .map(|n| NearbyPoiEntry {
            poi: n.poi.clone(),
            distance_m: n.distance_m,
        })
        .collect()
}

/// Legend from curated totals only (routes without elevation data).
#[uniffi::export]
pub fn ffi_curated_surface_summary(
    curated: CuratedSurface,
    unknown_as_trail: bool,
) -> Option<SurfaceSummary> {
    SurfaceSummary::resolve(None, Some(&curated), unknown_as_trail)
}

#[uniffi::export]
pub fn ffi_proximity_hint(
    thresholds: ProximityThresholds,
    distance_km: f64,
) -> Option<ProximityHint> {
    thresholds.classify(distance_km)
}

#[uniffi::export]
pub fn default_proximity_thresholds() -> ProximityThresholds {
    init_logging();
    info!("[RouteInsightRust] default_proximity_thresholds called - Rust is active!");
    ProximityThresholds::default()
}

#[uniffi::export]
pub fn default_nearby_config() -> NearbyConfig {
    NearbyConfig::default()
}

#[uniffi::export]
pub fn default_poi_display_policy() -> PoiDisplayPolicy {
    PoiDisplayPolicy::default()
}
