//! JSON documents and the data-fetch port.
//!
//! The widget reads four documents per route section: the route catalog,
//! the route's elevation/surface samples, the POI list, and the mapping from
//! route id to POI ids. This module defines:
//!
//! - [`JsonSource`], the port through which documents are fetched
//! - [`CachedSource`], a page-lifetime cache keyed by URL
//! - [`StaticSource`], an in-memory source for tests and offline use
//! - The lenient decoders that turn each document into core types

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{Mutex, OnceCell};

use crate::error::{Result, RouteDataError};
use crate::poi::PointOfInterest;
use crate::route_index::RoutePoint;
use crate::surface::CuratedSurface;

// ============================================================================
// Data-fetch port
// ============================================================================

/// Something that can fetch a JSON document by URL.
pub trait JsonSource {
    /// Fetch and decode the document at `url`.
    fn fetch_json(&self, url: &str) -> impl Future<Output = Result<Arc<Value>>> + Send;
}

/// Wraps a source with a cache keyed by URL.
///
/// Concurrent requests for the same URL share one fetch. Failed fetches are
/// not cached, so a later request retries.
pub struct CachedSource<S> {
    inner: S,
    cache: Mutex<HashMap<String, Arc<OnceCell<Arc<Value>>>>>,
}

impl<S> CachedSource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// The wrapped source.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Whether a document for `url` is cached.
    pub async fn is_cached(&self, url: &str) -> bool {
        let cache = self.cache.lock().await;
        cache.get(url).map_or(false, |cell| cell.initialized())
    }

    /// Drop every cached document.
    pub async fn clear(&self) {
        self.cache.lock().await.clear();
    }
}

impl<S: JsonSource + Sync> JsonSource for CachedSource<S> {
    async fn fetch_json(&self, url: &str) -> Result<Arc<Value>> {
        let cell = {
            let mut cache = self.cache.lock().await;
            Arc::clone(cache.entry(url.to_string()).or_default())
        };

        let value = cell
            .get_or_try_init(|| async {
                debug!("[CachedSource] Miss for {}", url);
                self.inner.fetch_json(url).await
            })
            .await?;

        Ok(Arc::clone(value))
    }
}

/// In-memory source serving fixed documents.
#[derive(Debug, Default)]
pub struct StaticSource {
    documents: HashMap<String, Arc<Value>>,
    fetches: AtomicUsize,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document under `url`.
    pub fn with(mut self, url: &str, document: Value) -> Self {
        self.insert(url, document);
        self
    }

    /// Register or replace a document under `url`.
    pub fn insert(&mut self, url: &str, document: Value) {
        self.documents.insert(url.to_string(), Arc::new(document));
    }

    /// Number of fetches served or refused so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }
}

impl JsonSource for StaticSource {
    async fn fetch_json(&self, url: &str) -> Result<Arc<Value>> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        self.documents
            .get(url)
            .cloned()
            .ok_or_else(|| RouteDataError::UnknownDocument(url.to_string()))
    }
}

// ============================================================================
// Route catalog
// ============================================================================

/// Display statistics of a route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct RouteStats {
    #[serde(default, deserialize_with = "loose::number_or_zero")]
    pub distance_km: f64,
    #[serde(default, deserialize_with = "loose::number_or_zero")]
    pub climb_m: f64,
    #[serde(default, deserialize_with = "loose::number_or_zero")]
    pub descent_m: f64,
    #[serde(default, deserialize_with = "loose::number_or_zero")]
    pub max_elevation_m: f64,
    #[serde(default, deserialize_with = "loose::number_or_zero")]
    pub min_elevation_m: f64,
}

/// One entry of the route catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDescriptor {
    #[serde(default, deserialize_with = "loose::text_or_empty")]
    pub id: String,
    #[serde(default, deserialize_with = "loose::label")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub stats: RouteStats,
    #[serde(default, deserialize_with = "loose::label")]
    pub gpx_url: Option<String>,
    #[serde(default, deserialize_with = "loose::label")]
    pub elevation_surface_url: Option<String>,
    #[serde(default, deserialize_with = "loose::label")]
    pub elevation_url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub surface: Option<CuratedSurface>,
    #[serde(default, deserialize_with = "loose::number")]
    pub center_lat: Option<f64>,
    #[serde(default, deserialize_with = "loose::number")]
    pub center_lng: Option<f64>,
    #[serde(default, deserialize_with = "loose::number")]
    pub zoom: Option<f64>,
}

impl RouteDescriptor {
    /// URL of the elevation/surface samples: `elevationSurfaceUrl`, then
    /// `elevationUrl`. Blank values are skipped.
    pub fn elevation_url(&self) -> Option<&str> {
        [&self.elevation_surface_url, &self.elevation_url]
            .into_iter()
            .filter_map(|url| url.as_deref().map(str::trim))
            .find(|url| !url.is_empty())
    }
}

/// Decode a nested record, falling back to its default when malformed.
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::de::DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Look up a route in the catalog.
///
/// The catalog is either an array of descriptors (matched on `id`) or an
/// object keyed by route id. Returns `None` when the route is absent or its
/// entry is not a record.
pub fn find_route(catalog: &Value, route_id: &str) -> Option<RouteDescriptor> {
    let entry = match catalog {
        Value::Array(routes) => routes
            .iter()
            .find(|r| r.get("id").and_then(loose::as_text).as_deref() == Some(route_id))?,
        Value::Object(routes) => routes.get(route_id)?,
        _ => return None,
    };

    match serde_json::from_value::<RouteDescriptor>(entry.clone()) {
        Ok(mut route) => {
            if route.id.is_empty() {
                route.id = route_id.to_string();
            }
            Some(route)
        }
        Err(e) => {
            warn!("[source] Route {} has a malformed descriptor: {}", route_id, e);
            None
        }
    }
}

// ============================================================================
// Elevation samples
// ============================================================================

/// Decode the samples of an elevation document.
///
/// Accepts `{ "points": [...] }` or a bare array. Records that cannot be
/// decoded become fully missing samples, which the index builder fills by
/// carrying values forward.
pub fn elevation_samples(document: &Value) -> Vec<RoutePoint> {
    let records = match document.get("points") {
        Some(Value::Array(points)) => points.as_slice(),
        _ => document.as_array().map(Vec::as_slice).unwrap_or(&[]),
    };

    records
        .iter()
        .map(|record| serde_json::from_value(record.clone()).unwrap_or_default())
        .collect()
}

/// Samples with elevation, distance and both coordinates present.
pub fn usable_samples(samples: Vec<RoutePoint>) -> Vec<RoutePoint> {
    samples.into_iter().filter(RoutePoint::is_complete).collect()
}

// ============================================================================
// Points of interest
// ============================================================================

/// Decode a POI document: an array of records or an object of records.
///
/// Records without a usable position are skipped.
pub fn parse_pois(document: &Value) -> Vec<PointOfInterest> {
    let records: Vec<&Value> = match document {
        Value::Array(items) => items.iter().collect(),
        Value::Object(items) => items.values().collect(),
        _ => Vec::new(),
    };

    let pois: Vec<PointOfInterest> = records
        .into_iter()
        .filter_map(PointOfInterest::from_json)
        .collect();

    debug!("[source] Decoded {} POIs", pois.len());
    pois
}

/// POI ids listed for `route_id` in a route-markers document.
pub fn route_marker_ids(document: &Value, route_id: &str) -> Vec<String> {
    document
        .get(route_id)
        .and_then(Value::as_array)
        .map(|ids| ids.iter().filter_map(loose::as_text).collect())
        .unwrap_or_default()
}

/// Resolve marker ids against the POI list, keeping marker order.
///
/// Unknown ids are dropped. POIs without an id cannot be referenced; when
/// two POIs share an id the later one wins.
pub fn pois_for_route(all: &[PointOfInterest], marker_ids: &[String]) -> Vec<PointOfInterest> {
    let by_id: HashMap<&str, &PointOfInterest> = all
        .iter()
        .filter(|poi| !poi.id.is_empty())
        .map(|poi| (poi.id.as_str(), poi))
        .collect();

    marker_ids
        .iter()
        .filter_map(|id| by_id.get(id.as_str()).map(|poi| (*poi).clone()))
        .collect()
}

/// POIs whose own records name `route_id` (used without a markers document).
pub fn pois_listing_route(all: &[PointOfInterest], route_id: &str) -> Vec<PointOfInterest> {
    all.iter()
        .filter(|poi| poi.belongs_to_route(route_id))
        .cloned()
        .collect()
}

// ============================================================================
// Lenient field decoders
// ============================================================================

/// Field decoders that accept the loose shapes found in hand-edited JSON.
pub(crate) mod loose {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Number from a JSON number or a numeric string.
    pub fn as_number(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Trimmed, non-empty text from a JSON string or number.
    pub fn as_text(value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(as_number))
    }

    pub fn number_or_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(number(deserializer)?.filter(|v| v.is_finite()).unwrap_or(0.0))
    }

    /// Raw label: strings as-is, numbers and booleans as text, anything
    /// else present as an empty label. `null` counts as absent.
    pub fn label<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.map(|v| match v {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => String::new(),
        }))
    }

    pub fn text_or_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(as_text).unwrap_or_default())
    }
}
