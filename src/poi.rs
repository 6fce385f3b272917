//! Points of interest along a route.
//!
//! Provides:
//! - [`PointOfInterest`], decoded leniently from POI documents
//! - [`select_nearby`], the ranked "nearby experiences" list for a position
//! - [`PoiIndex`], an R-tree over the route's POIs for viewport and radius queries
//! - [`PoiDisplayPolicy`] and [`PoiRevealer`], which decide which markers to show
//!   at a given zoom and pan state

use std::collections::{HashMap, HashSet};

use log::debug;
use rstar::{RTree, RTreeObject, AABB};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::geo_utils::{haversine_distance, search_boxes};
use crate::source::loose;
use crate::{Bounds, GpsPoint};

/// Language block used when the requested language has no texts.
const FALLBACK_LANGUAGE: &str = "no";

/// Localised title and description of a POI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct PoiText {
    #[serde(default, deserialize_with = "loose::label")]
    pub title: Option<String>,
    #[serde(default, alias = "desc", deserialize_with = "loose::label")]
    pub description: Option<String>,
}

/// A point of interest with a stable identifier and a position.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct PointOfInterest {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub name: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Texts per language code
    pub texts: HashMap<String, PoiText>,
    /// Raw marker symbol (`symbolType` or `symbol`)
    pub symbol: Option<String>,
    pub image_url: Option<String>,
    /// Routes that list this POI themselves (`routeId`, `routes`, `routeIds`)
    pub route_ids: Vec<String>,
}

/// POI record as found in documents, before the position is resolved.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPoi {
    #[serde(default, deserialize_with = "loose::label")]
    id: Option<String>,
    #[serde(default)]
    latlng: Option<Vec<Value>>,
    #[serde(default, deserialize_with = "loose::number")]
    lat: Option<f64>,
    #[serde(default, deserialize_with = "loose::number")]
    lon: Option<f64>,
    #[serde(default, deserialize_with = "loose::number")]
    lng: Option<f64>,
    #[serde(default, deserialize_with = "loose::label")]
    name: Option<String>,
    #[serde(default, deserialize_with = "loose::label")]
    title: Option<String>,
    #[serde(default, deserialize_with = "loose::label")]
    description: Option<String>,
    #[serde(default)]
    texts: Option<Value>,
    #[serde(default, deserialize_with = "loose::label")]
    symbol_type: Option<String>,
    #[serde(default, deserialize_with = "loose::label")]
    symbol: Option<String>,
    #[serde(default, deserialize_with = "loose::label")]
    image_url: Option<String>,
    #[serde(default, deserialize_with = "loose::label")]
    image: Option<String>,
    #[serde(default, deserialize_with = "loose::label")]
    route_id: Option<String>,
    #[serde(default)]
    routes: Option<Value>,
    #[serde(default)]
    route_ids: Option<Value>,
}

impl RawPoi {
    /// `latlng: [lat, lon]`, then `lat` + `lon`, then `lat` + `lng`.
    fn position(&self) -> Option<GpsPoint> {
        let from_pair = self.latlng.as_ref().and_then(|pair| {
            let lat = loose::as_number(pair.first()?)?;
            let lon = loose::as_number(pair.get(1)?)?;
            Some(GpsPoint::new(lat, lon))
        });

        from_pair
            .or_else(|| Some(GpsPoint::new(self.lat?, self.lon?)))
            .or_else(|| Some(GpsPoint::new(self.lat?, self.lng?)))
            .filter(|p| p.is_valid())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

impl PointOfInterest {
    /// Create a POI with only an id and a position.
    pub fn new(id: &str, latitude: f64, longitude: f64) -> Self {
        Self {
            id: id.to_string(),
            latitude,
            longitude,
            name: None,
            title: None,
            description: None,
            texts: HashMap::new(),
            symbol: None,
            image_url: None,
            route_ids: Vec::new(),
        }
    }

    /// Set the display name.
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Set the marker symbol.
    pub fn with_symbol(mut self, symbol: &str) -> Self {
        self.symbol = Some(symbol.to_string());
        self
    }

    /// Decode a POI record.
    ///
    /// Returns `None` when the record is not an object or has no usable
    /// position. A missing id becomes an empty string.
    ///
    /// ```
    /// use route_insight::PointOfInterest;
    /// use serde_json::json;
    ///
    /// let poi = PointOfInterest::from_json(&json!({
    ///     "id": "cafe-1",
    ///     "latlng": [59.5, 9.5],
    ///     "symbolType": "Kaffekop",
    ///     "texts": { "en": { "title": "Riverside café" } }
    /// })).unwrap();
    ///
    /// assert_eq!(poi.display_title("en"), "Riverside café");
    /// assert_eq!(poi.symbol_kind().as_deref(), Some("kaffekop"));
    /// assert!(PointOfInterest::from_json(&json!({ "id": "nowhere" })).is_none());
    /// ```
    pub fn from_json(value: &Value) -> Option<Self> {
        let raw: RawPoi = match serde_json::from_value(value.clone()) {
            Ok(raw) => raw,
            Err(e) => {
                debug!("[PointOfInterest] Skipping malformed record: {}", e);
                return None;
            }
        };
        let position = raw.position()?;

        let texts = raw
            .texts
            .as_ref()
            .and_then(|t| t.as_object())
            .map(|blocks| {
                blocks
                    .iter()
                    .filter_map(|(lang, block)| {
                        serde_json::from_value::<PoiText>(block.clone())
                            .ok()
                            .map(|text| (lang.clone(), text))
                    })
                    .collect()
            })
            .unwrap_or_default();

        let mut route_ids: Vec<String> = Vec::new();
        if let Some(id) = raw.route_id.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            route_ids.push(id.to_string());
        }
        let listed = [&raw.routes, &raw.route_ids]
            .into_iter()
            .filter_map(|list| list.as_ref().and_then(Value::as_array))
            .flatten();
        for value in listed {
            if let Some(id) = loose::as_text(value) {
                if !route_ids.contains(&id) {
                    route_ids.push(id);
                }
            }
        }

        Some(Self {
            id: raw.id.unwrap_or_default(),
            latitude: position.latitude,
            longitude: position.longitude,
            name: raw.name,
            title: raw.title,
            description: raw.description,
            texts,
            symbol: raw.symbol_type.or(raw.symbol),
            image_url: raw.image_url.or(raw.image),
            route_ids,
        })
    }

    /// Position of the POI.
    pub fn position(&self) -> GpsPoint {
        GpsPoint::new(self.latitude, self.longitude)
    }

    fn text_block(&self, lang: &str) -> Option<&PoiText> {
        self.texts.get(lang).or_else(|| self.texts.get(FALLBACK_LANGUAGE))
    }

    /// Title in `lang`, falling back to the default language block, then
    /// to the POI's `name` and `title`. Empty when none is set.
    pub fn display_title(&self, lang: &str) -> &str {
        let block = self.text_block(lang);
        non_empty(block.and_then(|b| b.title.as_deref()))
            .or_else(|| non_empty(self.name.as_deref()))
            .or_else(|| non_empty(self.title.as_deref()))
            .unwrap_or("")
    }

    /// Description in `lang`, falling back to the default language block,
    /// then to the POI's own description. Empty when none is set.
    pub fn display_description(&self, lang: &str) -> &str {
        let block = self.text_block(lang);
        non_empty(block.and_then(|b| b.description.as_deref()))
            .or_else(|| non_empty(self.description.as_deref()))
            .unwrap_or("")
    }

    /// Normalised marker symbol (trimmed, lowercase), if any.
    pub fn symbol_kind(&self) -> Option<String> {
        non_empty(self.symbol.as_deref()).map(|s| s.trim().to_lowercase())
    }

    /// Whether the POI record itself names `route_id`.
    pub fn belongs_to_route(&self, route_id: &str) -> bool {
        let route_id = route_id.trim();
        !route_id.is_empty() && self.route_ids.iter().any(|id| id.trim() == route_id)
    }

    /// Key used to avoid revealing the same marker twice.
    pub fn reveal_key(&self) -> String {
        if self.id.is_empty() {
            format!("{},{}", self.latitude, self.longitude)
        } else {
            self.id.clone()
        }
    }
}

/// A POI with its distance from a query position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearbyPoi<'a> {
    pub poi: &'a PointOfInterest,
    pub distance_m: f64,
}

/// Radius and size of the nearby list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct NearbyConfig {
    /// Search radius in meters. Default: 5000.0
    pub radius_m: f64,
    /// Maximum number of entries. Default: 8
    pub limit: u32,
}

impl Default for NearbyConfig {
    fn default() -> Self {
        Self {
            radius_m: 5000.0,
            limit: 8,
        }
    }
}

/// POIs within `radius_m` of `center`, closest first, at most `limit`.
///
/// The sort is stable: POIs at equal distance keep their input order.
/// Returns an empty list when nothing qualifies.
///
/// # Example
/// ```
/// use route_insight::{select_nearby, GpsPoint, PointOfInterest};
///
/// let pois = vec![PointOfInterest::new("a", 59.0, 9.0)];
/// let nearby = select_nearby(&pois, &GpsPoint::new(59.0, 9.001), 200.0, 5);
/// assert_eq!(nearby.len(), 1);
/// assert!((nearby[0].distance_m - 57.3).abs() < 1.0);
/// ```
pub fn select_nearby<'a>(
    pois: &'a [PointOfInterest],
    center: &GpsPoint,
    radius_m: f64,
    limit: usize,
) -> Vec<NearbyPoi<'a>> {
    let mut nearby: Vec<NearbyPoi<'a>> = pois
        .iter()
        .map(|poi| NearbyPoi {
            poi,
            distance_m: haversine_distance(center, &poi.position()),
        })
        .filter(|n| n.distance_m <= radius_m)
        .collect();

    nearby.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));
    nearby.truncate(limit);
    nearby
}

// ============================================================================
// Spatial index
// ============================================================================

/// R-tree entry: a POI's slot in the owning list and its `[lng, lat]`.
#[derive(Debug, Clone)]
struct IndexedPoi {
    slot: usize,
    position: [f64; 2],
}

impl RTreeObject for IndexedPoi {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

/// The POIs of one route with an R-tree for spatial queries.
///
/// Read-only after construction; queries return POIs in a deterministic
/// order (distance, then original list position).
#[derive(Debug, Clone)]
pub struct PoiIndex {
    pois: Vec<PointOfInterest>,
    tree: RTree<IndexedPoi>,
}

impl Default for PoiIndex {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl PoiIndex {
    /// Index a list of POIs, keeping their order.
    pub fn new(pois: Vec<PointOfInterest>) -> Self {
        let entries: Vec<IndexedPoi> = pois
            .iter()
            .enumerate()
            .map(|(slot, poi)| IndexedPoi {
                slot,
                position: [poi.longitude, poi.latitude],
            })
            .collect();

        Self {
            tree: RTree::bulk_load(entries),
            pois,
        }
    }

    /// All POIs in their original order.
    pub fn pois(&self) -> &[PointOfInterest] {
        &self.pois
    }

    pub fn len(&self) -> usize {
        self.pois.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pois.is_empty()
    }

    /// Slots of the POIs inside `bounds`, in tree order.
    fn locate(&self, bounds: &Bounds) -> Vec<usize> {
        let envelope = AABB::from_corners(
            [bounds.min_lng, bounds.min_lat],
            [bounds.max_lng, bounds.max_lat],
        );
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|entry| entry.slot)
            .collect()
    }

    /// Every POI within `radius_m` of `center`, closest first.
    pub fn within_radius(&self, center: &GpsPoint, radius_m: f64) -> Vec<NearbyPoi<'_>> {
        let mut slots: Vec<usize> = search_boxes(center, radius_m)
            .iter()
            .flat_map(|bounds| self.locate(bounds))
            .collect();
        slots.sort_unstable();
        slots.dedup();

        let mut hits: Vec<(usize, f64)> = slots
            .into_iter()
            .map(|slot| (slot, haversine_distance(center, &self.pois[slot].position())))
            .filter(|(_, d)| *d <= radius_m)
            .collect();

        hits.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));

        hits.into_iter()
            .map(|(slot, distance_m)| NearbyPoi {
                poi: &self.pois[slot],
                distance_m,
            })
            .collect()
    }

    /// Same result as [`select_nearby`] over [`PoiIndex::pois`].
    pub fn nearby(&self, center: &GpsPoint, radius_m: f64, limit: usize) -> Vec<NearbyPoi<'_>> {
        let mut hits = self.within_radius(center, radius_m);
        hits.truncate(limit);
        hits
    }

    /// POIs inside a viewport, in original order.
    pub fn in_view(&self, viewport: &Bounds) -> Vec<&PointOfInterest> {
        let mut slots = self.locate(viewport);
        slots.sort_unstable();
        slots.into_iter().map(|slot| &self.pois[slot]).collect()
    }
}

// ============================================================================
// Marker display policy
// ============================================================================

/// How the UI should place the route's POI markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum MarkerStrategy {
    /// Few POIs: add every marker up front
    Direct,
    /// Many POIs: cluster them, or reveal lazily per viewport
    Clustered,
}

/// Rules for which POI markers to reveal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct PoiDisplayPolicy {
    /// More POIs than this switch to [`MarkerStrategy::Clustered`]. Default: 30
    pub cluster_threshold: u32,
    /// From this zoom level on, every POI in view is shown. Default: 11
    pub anchor_zoom: u8,
    /// Symbols shown at any zoom level
    pub anchor_symbols: Vec<String>,
    /// Radius revealed around a position pin, in meters. Default: 3000.0
    pub reveal_radius_m: f64,
}

impl Default for PoiDisplayPolicy {
    fn default() -> Self {
        Self {
            cluster_threshold: 30,
            anchor_zoom: 11,
            anchor_symbols: [
                "attractions",
                "hotel",
                "cabin",
                "eat",
                "handlevogn",
                "kaffekop",
                "sleepover",
                "tent",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            reveal_radius_m: 3000.0,
        }
    }
}

impl PoiDisplayPolicy {
    /// Strategy for a route with `poi_count` POIs.
    pub fn marker_strategy(&self, poi_count: usize) -> MarkerStrategy {
        if poi_count <= self.cluster_threshold as usize {
            MarkerStrategy::Direct
        } else {
            MarkerStrategy::Clustered
        }
    }

    /// Whether the POI's symbol is shown at every zoom level.
    pub fn is_anchor(&self, poi: &PointOfInterest) -> bool {
        poi.symbol_kind()
            .map_or(false, |kind| self.anchor_symbols.iter().any(|s| *s == kind))
    }

    /// Whether a POI should be visible for the given viewport and zoom.
    pub fn is_visible(&self, poi: &PointOfInterest, viewport: &Bounds, zoom: u8) -> bool {
        viewport.contains(&poi.position()) && (zoom >= self.anchor_zoom || self.is_anchor(poi))
    }
}

/// Remembers which POI markers have been revealed in one route view.
#[derive(Debug, Default, Clone)]
pub struct PoiRevealer {
    revealed: HashSet<String>,
}

impl PoiRevealer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reveal POIs that became visible after a pan or zoom.
    ///
    /// Returns only POIs not revealed before, in original order.
    pub fn reveal_in_view<'a>(
        &mut self,
        index: &'a PoiIndex,
        viewport: &Bounds,
        zoom: u8,
        policy: &PoiDisplayPolicy,
    ) -> Vec<&'a PointOfInterest> {
        index
            .in_view(viewport)
            .into_iter()
            .filter(|poi| policy.is_visible(poi, viewport, zoom))
            .filter(|poi| self.revealed.insert(poi.reveal_key()))
            .collect()
    }

    /// Reveal POIs within `radius_m` of a position pin, closest first.
    pub fn reveal_near<'a>(
        &mut self,
        index: &'a PoiIndex,
        center: &GpsPoint,
        radius_m: f64,
    ) -> Vec<&'a PointOfInterest> {
        index
            .within_radius(center, radius_m)
            .into_iter()
            .map(|hit| hit.poi)
            .filter(|poi| self.revealed.insert(poi.reveal_key()))
            .collect()
    }

    /// Whether the POI's marker has been revealed.
    pub fn is_revealed(&self, poi: &PointOfInterest) -> bool {
        self.revealed.contains(&poi.reveal_key())
    }

    /// Number of revealed markers.
    pub fn len(&self) -> usize {
        self.revealed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.revealed.is_empty()
    }
}
