//! Load a route section from in-memory documents.
//!
//! Run with: cargo run --example load_route_view

use route_insight::{CachedSource, GpsPoint, RouteView, RouteViewConfig, StaticSource};
use serde_json::json;

#[tokio::main]
async fn main() {
    let source = CachedSource::new(
        StaticSource::new()
            .with(
                "routes.json",
                json!([{
                    "id": "lake",
                    "stats": { "distanceKm": 2.0, "climbM": 40, "descentM": 40, "maxElevationM": 180, "minElevationM": 140 },
                    "elevationSurfaceUrl": "lake-elev.json",
                    "centerLat": 59.84, "centerLng": 9.58, "zoom": 13
                }]),
            )
            .with(
                "lake-elev.json",
                json!({ "points": [
                    { "lat": 59.8300, "lon": 9.5700, "distance": 0.0, "elevation": 140, "surface": "asphalt" },
                    { "lat": 59.8390, "lon": 9.5700, "distance": 1.0, "elevation": 180, "surface": "gravel" },
                    { "lat": 59.8390, "lon": 9.5880, "distance": 2.0, "elevation": 140, "surface": "trail" }
                ]}),
            )
            .with(
                "pois.json",
                json!([
                    { "id": "bench", "lat": 59.8391, "lon": 9.5710, "texts": { "en": { "title": "Bench" } } },
                    { "id": "hut", "latlng": [59.8395, 9.5870], "name": "Hut", "symbolType": "Cabin" }
                ]),
            )
            .with("markers.json", json!({ "lake": ["bench", "hut"] })),
    );

    let config = RouteViewConfig::new("lake", "routes.json", "pois.json").with_route_markers("markers.json");

    let view = match RouteView::load(&source, config).await {
        Ok(view) => view,
        Err(e) => {
            eprintln!("Failed to load route: {}", e);
            return;
        }
    };

    println!("Route View Example\n");
    let map = view.initial_view();
    println!("Map: ({:.4}, {:.4}) zoom {}", map.center.latitude, map.center.longitude, map.zoom);
    println!("Stats: {:.1} km, +{:.0} m\n", view.stats().distance_km, view.stats().climb_m);

    if let Some(summary) = view.surface_summary() {
        for entry in &summary.entries {
            println!("  {:<8} {}%", entry.category.as_str(), entry.percent);
        }
        println!();
    }

    let report = view.locate(GpsPoint::new(59.8392, 9.5705));
    if let Some(nearest) = report.nearest {
        println!(
            "Position: {:.0} m from route, {:.2} km done, {:.2} km to go ({:?})",
            nearest.nearest_distance_m, nearest.from_start_km, nearest.to_end_km, report.hint
        );
    }
    for hit in &report.nearby {
        println!("  {:<6} {:>5.0} m", hit.poi.display_title("en"), hit.distance_m);
    }
}
