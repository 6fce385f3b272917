//! Per-route session: load one route section and answer position queries.
//!
//! A [`RouteView`] owns everything the widget needs for one route: the
//! catalog descriptor, the [`RouteIndex`] (when the elevation document could
//! be loaded), and the route's POIs. Loading isolates failures the way the
//! page does: a broken elevation document leaves the view without an index,
//! a broken POI document leaves it without POIs, and only a missing catalog
//! entry fails the view itself.

use std::collections::HashMap;

use futures::stream::{self, StreamExt};
use log::{debug, info, warn};
use serde::Serialize;

use crate::error::{Result, RouteDataError};
use crate::nearest::{find_nearest, NearestPointResult, ProximityHint, ProximityThresholds};
use crate::poi::{MarkerStrategy, NearbyConfig, NearbyPoi, PoiDisplayPolicy, PoiIndex, PointOfInterest};
use crate::profile::ElevationProfile;
use crate::route_index::RouteIndex;
use crate::source::{
    elevation_samples, find_route, parse_pois, pois_for_route, pois_listing_route, route_marker_ids,
    usable_samples, JsonSource, RouteDescriptor, RouteStats,
};
use crate::surface::{aggregate, SurfaceSummary};
use crate::GpsPoint;

/// Map center used when neither the view nor the route names one.
pub const DEFAULT_CENTER: GpsPoint = GpsPoint {
    latitude: 59.83467,
    longitude: 9.57846,
};

/// Zoom used when neither the view nor the route names one.
pub const DEFAULT_ZOOM: u8 = 11;

/// Number of route views loaded at once by [`load_route_views`].
const VIEW_CONCURRENCY: usize = 4;

// ============================================================================
// Configuration
// ============================================================================

/// Settings of one route section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteViewConfig {
    pub route_id: String,
    /// Route catalog document
    pub routes_url: String,
    /// POI document
    pub pois_url: String,
    /// Route-to-POI mapping. Without it, POIs are matched on their own
    /// route references.
    pub route_markers_url: Option<String>,
    /// Fold unknown surfaces into trail
    pub unknown_as_trail: bool,
    /// Map center and zoom overrides
    pub center_lat: Option<f64>,
    pub center_lng: Option<f64>,
    pub zoom: Option<u8>,
    pub proximity: ProximityThresholds,
    pub nearby: NearbyConfig,
    pub display: PoiDisplayPolicy,
}

impl RouteViewConfig {
    pub fn new(route_id: &str, routes_url: &str, pois_url: &str) -> Self {
        Self {
            route_id: route_id.to_string(),
            routes_url: routes_url.to_string(),
            pois_url: pois_url.to_string(),
            ..Self::default()
        }
    }

    pub fn with_route_markers(mut self, url: &str) -> Self {
        self.route_markers_url = Some(url.to_string());
        self
    }

    pub fn with_unknown_as_trail(mut self, unknown_as_trail: bool) -> Self {
        self.unknown_as_trail = unknown_as_trail;
        self
    }

    /// Read settings from a section's data attributes.
    ///
    /// Keys are the camelCase attribute names: `routeId`, `routesUrl`,
    /// `poisUrl`, `routeMarkersUrl`, `unknownAsTrail` (`"1"` enables it),
    /// `centerLat`, `centerLng` and `zoom`. Values are trimmed; unparsable
    /// numbers are ignored.
    pub fn from_attributes(attributes: &HashMap<String, String>) -> Result<Self> {
        let get = |key: &str| {
            attributes
                .get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
        };
        let number = |key: &str| get(key).and_then(|v| v.parse::<f64>().ok()).filter(|v| v.is_finite());

        let config = Self {
            route_id: get("routeId").unwrap_or_default().to_string(),
            routes_url: get("routesUrl").unwrap_or_default().to_string(),
            pois_url: get("poisUrl").unwrap_or_default().to_string(),
            route_markers_url: get("routeMarkersUrl").map(str::to_string),
            unknown_as_trail: get("unknownAsTrail") == Some("1"),
            center_lat: number("centerLat"),
            center_lng: number("centerLng"),
            zoom: number("zoom").and_then(zoom_level),
            ..Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    /// Check that the route id and the required document URLs are set.
    pub fn validate(&self) -> Result<()> {
        if self.route_id.trim().is_empty() {
            return Err(RouteDataError::MissingSetting("routeId"));
        }
        if self.routes_url.trim().is_empty() {
            return Err(RouteDataError::MissingSetting("routesUrl"));
        }
        if self.pois_url.trim().is_empty() {
            return Err(RouteDataError::MissingSetting("poisUrl"));
        }
        Ok(())
    }
}

/// Whole zoom level from a loose number (fraction truncated).
fn zoom_level(value: f64) -> Option<u8> {
    (value.is_finite() && value >= 0.0 && value <= u8::MAX as f64).then(|| value.trunc() as u8)
}

// ============================================================================
// Route view
// ============================================================================

/// Initial map center and zoom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct MapView {
    pub center: GpsPoint,
    pub zoom: u8,
}

/// Answer to "where am I?" for a position pin or a geolocation fix.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionReport<'a> {
    /// Closest route sample; `None` when the view has no route index
    pub nearest: Option<NearestPointResult>,
    pub hint: Option<ProximityHint>,
    /// Route POIs around the position, closest first
    pub nearby: Vec<NearbyPoi<'a>>,
}

/// One loaded route section.
#[derive(Debug, Clone)]
pub struct RouteView {
    route: RouteDescriptor,
    index: Option<RouteIndex>,
    pois: PoiIndex,
    config: RouteViewConfig,
}

impl RouteView {
    /// Load a route section through `source`.
    ///
    /// Fails when the settings are incomplete, the catalog cannot be read,
    /// the route is not in the catalog, or the route names no elevation
    /// document. Elevation and POI failures are logged and leave the view
    /// without an index or without POIs.
    pub async fn load<S: JsonSource>(source: &S, config: RouteViewConfig) -> Result<Self> {
        config.validate()?;

        let catalog = source.fetch_json(&config.routes_url).await?;
        let route = find_route(&catalog, &config.route_id).ok_or_else(|| {
            RouteDataError::RouteNotFound {
                route_id: config.route_id.clone(),
            }
        })?;

        let elevation_url = route
            .elevation_url()
            .ok_or_else(|| RouteDataError::MissingElevationUrl {
                route_id: config.route_id.clone(),
            })?
            .to_string();

        let (index, pois) = futures::join!(
            load_index(source, &elevation_url, &config),
            load_pois(source, &config)
        );

        let pois = match pois {
            Ok(pois) => pois,
            Err(e) => {
                warn!("[RouteView] POIs for {} unavailable: {}", config.route_id, e);
                Vec::new()
            }
        };

        info!(
            "[RouteView] Loaded {}: {} samples, {} POIs",
            config.route_id,
            index.as_ref().map_or(0, RouteIndex::len),
            pois.len()
        );

        Ok(Self {
            route,
            index,
            pois: PoiIndex::new(pois),
            config,
        })
    }

    /// Assemble a view from already loaded parts.
    pub fn from_parts(
        route: RouteDescriptor,
        index: Option<RouteIndex>,
        pois: Vec<PointOfInterest>,
        config: RouteViewConfig,
    ) -> Self {
        Self {
            route,
            index,
            pois: PoiIndex::new(pois),
            config,
        }
    }

    pub fn route(&self) -> &RouteDescriptor {
        &self.route
    }

    pub fn stats(&self) -> &RouteStats {
        &self.route.stats
    }

    /// The route index, if the elevation document loaded.
    pub fn index(&self) -> Option<&RouteIndex> {
        self.index.as_ref()
    }

    pub fn pois(&self) -> &PoiIndex {
        &self.pois
    }

    pub fn config(&self) -> &RouteViewConfig {
        &self.config
    }

    /// Surface legend from the computed totals, falling back to the route's
    /// curated totals.
    pub fn surface_summary(&self) -> Option<SurfaceSummary> {
        let computed = self.index.as_ref().map(aggregate);
        SurfaceSummary::resolve(
            computed.as_ref(),
            self.route.surface.as_ref(),
            self.config.unknown_as_trail,
        )
    }

    pub fn elevation_profile(&self) -> Option<ElevationProfile> {
        self.index.as_ref().map(ElevationProfile::from_index)
    }

    /// Initial map view: view overrides, then the route's center and zoom,
    /// then the defaults.
    pub fn initial_view(&self) -> MapView {
        let latitude = self
            .config
            .center_lat
            .or(self.route.center_lat)
            .filter(|v| v.is_finite())
            .unwrap_or(DEFAULT_CENTER.latitude);
        let longitude = self
            .config
            .center_lng
            .or(self.route.center_lng)
            .filter(|v| v.is_finite())
            .unwrap_or(DEFAULT_CENTER.longitude);
        let zoom = self
            .config
            .zoom
            .or_else(|| self.route.zoom.and_then(zoom_level))
            .unwrap_or(DEFAULT_ZOOM);

        MapView {
            center: GpsPoint::new(latitude, longitude),
            zoom,
        }
    }

    /// Where to place the moving marker before any hover: the first route
    /// sample with coordinates, else the map center.
    pub fn marker_start(&self) -> GpsPoint {
        self.index
            .as_ref()
            .and_then(RouteIndex::first_valid_position)
            .unwrap_or_else(|| self.initial_view().center)
    }

    pub fn marker_strategy(&self) -> MarkerStrategy {
        self.config.display.marker_strategy(self.pois.len())
    }

    /// Nearest route point, proximity hint and nearby POIs for a position.
    pub fn locate(&self, position: GpsPoint) -> PositionReport<'_> {
        let nearest = self
            .index
            .as_ref()
            .and_then(|index| find_nearest(index, position.latitude, position.longitude));
        let hint = nearest.as_ref().and_then(|n| self.config.proximity.hint(n));
        let nearby = self.pois.nearby(
            &position,
            self.config.nearby.radius_m,
            self.config.nearby.limit as usize,
        );

        debug!(
            "[RouteView] Locate ({:.5}, {:.5}) on {}: {:?} m, {} nearby",
            position.latitude,
            position.longitude,
            self.config.route_id,
            nearest.map(|n| n.nearest_distance_m.round()),
            nearby.len()
        );

        PositionReport { nearest, hint, nearby }
    }
}

async fn load_index<S: JsonSource>(
    source: &S,
    url: &str,
    config: &RouteViewConfig,
) -> Option<RouteIndex> {
    let document = match source.fetch_json(url).await {
        Ok(document) => document,
        Err(e) => {
            warn!("[RouteView] Elevation for {} unavailable: {}", config.route_id, e);
            return None;
        }
    };

    let samples = usable_samples(elevation_samples(&document));
    if samples.is_empty() {
        warn!("[RouteView] Elevation: no usable points in {}", url);
        return None;
    }

    Some(RouteIndex::build(&samples, config.unknown_as_trail))
}

async fn load_pois<S: JsonSource>(source: &S, config: &RouteViewConfig) -> Result<Vec<PointOfInterest>> {
    match &config.route_markers_url {
        Some(markers_url) => {
            let (pois, markers) = futures::try_join!(
                source.fetch_json(&config.pois_url),
                source.fetch_json(markers_url)
            )?;
            let ids = route_marker_ids(&markers, &config.route_id);
            Ok(pois_for_route(&parse_pois(&pois), &ids))
        }
        None => {
            let pois = source.fetch_json(&config.pois_url).await?;
            Ok(pois_listing_route(&parse_pois(&pois), &config.route_id))
        }
    }
}

/// Load several route sections concurrently.
///
/// Results keep the input order. Each view succeeds or fails on its own.
pub async fn load_route_views<S: JsonSource>(
    source: &S,
    configs: Vec<RouteViewConfig>,
) -> Vec<Result<RouteView>> {
    let total = configs.len();

    let mut results: Vec<(usize, Result<RouteView>)> = stream::iter(configs.into_iter().enumerate())
        .map(|(slot, config)| async move {
            let route_id = config.route_id.clone();
            let result = RouteView::load(source, config).await;
            if let Err(e) = &result {
                warn!("[RouteView] {} failed: {}", route_id, e);
            }
            (slot, result)
        })
        .buffer_unordered(VIEW_CONCURRENCY)
        .collect()
        .await;

    results.sort_by_key(|(slot, _)| *slot);

    let loaded = results.iter().filter(|(_, r)| r.is_ok()).count();
    info!("[RouteView] Loaded {}/{} route views", loaded, total);

    results.into_iter().map(|(_, result)| result).collect()
}
