//! Integration tests for loading route views through a JSON source.

use route_insight::{
    load_route_views, CachedSource, GpsPoint, MarkerStrategy, ProximityHint, RouteDataError,
    RouteView, RouteViewConfig, StaticSource, SurfaceCategory,
};
use serde_json::json;

fn catalog() -> serde_json::Value {
    json!([
        {
            "id": "r1",
            "name": "Lakeside loop",
            "stats": { "distanceKm": 1.0, "climbM": 50, "descentM": 0, "maxElevationM": 150, "minElevationM": 100 },
            "gpxUrl": "r1.gpx",
            "elevationSurfaceUrl": "r1-elev.json",
            "surface": { "categoryKm": { "asphalt": 0.4, "gravel": 0.6 }, "totalKm": 1.0 },
            "centerLat": 59.005,
            "centerLng": 9.0,
            "zoom": 13
        },
        { "id": "r2", "elevationUrl": "broken.json", "surface": { "categoryKm": { "trail": 2.0 } } },
        { "id": "r3", "gpxUrl": "r3.gpx" }
    ])
}

fn source() -> StaticSource {
    StaticSource::new()
        .with("routes.json", catalog())
        .with(
            "r1-elev.json",
            json!({ "points": [
                { "lat": 59.0, "lon": 9.0, "distance": 0.0, "elevation": 100, "surface": "asphalt" },
                { "lat": 59.01, "lon": 9.0, "distance": 1.0, "elevation": 150, "surfaceCategory": "gravel" },
                { "lat": null, "lon": 9.0, "distance": 1.5, "elevation": 160 }
            ]}),
        )
        .with(
            "pois.json",
            json!([
                { "id": "p1", "lat": 59.0, "lon": 9.001, "name": "Kiosk", "symbolType": "Eat" },
                { "id": "p2", "latlng": [59.01, 9.0], "title": "Viewpoint", "routes": ["r2"] },
                { "id": "p3", "lat": 60.0, "lon": 10.0 }
            ]),
        )
        .with("markers.json", json!({ "r1": ["p2", "p1", "p3"] }))
}

fn config(route_id: &str) -> RouteViewConfig {
    RouteViewConfig::new(route_id, "routes.json", "pois.json").with_route_markers("markers.json")
}

#[tokio::test]
async fn test_load_full_view() {
    let view = RouteView::load(&source(), config("r1")).await.unwrap();

    let index = view.index().expect("elevation loaded");
    assert_eq!(index.len(), 2);
    assert_eq!(index.total_distance_km(), 1.0);
    assert_eq!(view.stats().climb_m, 50.0);
    assert_eq!(view.pois().len(), 3);
    assert_eq!(view.pois().pois()[0].id, "p2");
    assert_eq!(view.marker_strategy(), MarkerStrategy::Direct);

    let map = view.initial_view();
    assert_eq!(map.center, GpsPoint::new(59.005, 9.0));
    assert_eq!(map.zoom, 13);
    assert_eq!(view.marker_start(), GpsPoint::new(59.0, 9.0));
}

#[tokio::test]
async fn test_surface_summary_prefers_computed_totals() {
    let view = RouteView::load(&source(), config("r1")).await.unwrap();
    let summary = view.surface_summary().unwrap();

    assert_eq!(summary.total_km, 1.0);
    assert_eq!(summary.entry(SurfaceCategory::Asphalt).unwrap().percent, 0);
    assert_eq!(summary.entry(SurfaceCategory::Gravel).unwrap().percent, 100);

    let profile = view.elevation_profile().unwrap();
    assert_eq!(profile.samples.len(), 2);
    assert_eq!(profile.y_max_m, 150.0);
}

#[tokio::test]
async fn test_locate_on_route() {
    let view = RouteView::load(&source(), config("r1")).await.unwrap();
    let report = view.locate(GpsPoint::new(59.0, 9.0));

    let nearest = report.nearest.unwrap();
    assert_eq!(nearest.sample_index, 0);
    assert!(nearest.nearest_distance_m < 1e-6);
    assert_eq!(nearest.to_end_km, 1.0);
    assert_eq!(report.hint, Some(ProximityHint::OnRoute));

    let ids: Vec<&str> = report.nearby.iter().map(|n| n.poi.id.as_str()).collect();
    assert_eq!(ids, vec!["p1", "p2"]);
    assert!(report.nearby[0].distance_m < report.nearby[1].distance_m);
}

#[tokio::test]
async fn test_elevation_failure_keeps_view() {
    let view = RouteView::load(&source(), config("r2")).await.unwrap();

    assert!(view.index().is_none());
    assert!(view.elevation_profile().is_none());
    // Curated totals still drive the legend
    let summary = view.surface_summary().unwrap();
    assert_eq!(summary.total_km, 2.0);
    assert_eq!(summary.entry(SurfaceCategory::Trail).unwrap().percent, 100);

    let report = view.locate(GpsPoint::new(59.0, 9.0));
    assert!(report.nearest.is_none());
    assert!(report.hint.is_none());
}

#[tokio::test]
async fn test_poi_failure_keeps_index() {
    let config = RouteViewConfig::new("r1", "routes.json", "missing-pois.json")
        .with_route_markers("markers.json");
    let view = RouteView::load(&source(), config).await.unwrap();

    assert!(view.index().is_some());
    assert!(view.pois().is_empty());
}

#[tokio::test]
async fn test_route_references_without_markers() {
    let config = RouteViewConfig::new("r2", "routes.json", "pois.json");
    let view = RouteView::load(&source(), config).await.unwrap();

    assert_eq!(view.pois().len(), 1);
    assert_eq!(view.pois().pois()[0].id, "p2");
}

#[tokio::test]
async fn test_view_errors() {
    let err = RouteView::load(&source(), config("r3")).await.unwrap_err();
    assert!(matches!(err, RouteDataError::MissingElevationUrl { .. }));

    let err = RouteView::load(&source(), config("nope")).await.unwrap_err();
    assert!(matches!(err, RouteDataError::RouteNotFound { .. }));

    let missing_catalog = RouteViewConfig::new("r1", "other.json", "pois.json");
    let err = RouteView::load(&source(), missing_catalog).await.unwrap_err();
    assert!(matches!(err, RouteDataError::UnknownDocument(_)));

    let err = RouteView::load(&source(), RouteViewConfig::default()).await.unwrap_err();
    assert!(matches!(err, RouteDataError::MissingSetting("routeId")));
}

#[tokio::test]
async fn test_load_many_views_isolated_and_cached() {
    let source = CachedSource::new(source());
    let results = load_route_views(&source, vec![config("r1"), config("r2"), config("nope")]).await;

    assert_eq!(results.len(), 3);
    assert!(results[0].as_ref().unwrap().index().is_some());
    assert!(results[1].as_ref().unwrap().index().is_none());
    assert!(results[2].is_err());

    // routes, r1-elev, broken, pois and markers: each fetched once
    assert_eq!(source.inner().fetch_count(), 5);
    assert!(source.is_cached("routes.json").await);
    assert!(!source.is_cached("broken.json").await);
}
