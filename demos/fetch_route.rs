//! Fetch a route section over HTTP.
//!
//! Run with: cargo run --example fetch_route --features http -- <base-url> <route-id>

use route_insight::{CachedSource, HttpJsonSource, RouteView, RouteViewConfig};

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: fetch_route <base-url> <route-id>");
        return;
    }

    let http = match HttpJsonSource::new() {
        Ok(http) => http.with_base_url(&args[1]),
        Err(e) => {
            eprintln!("{}", e);
            return;
        }
    };
    let source = CachedSource::new(http);

    let config = RouteViewConfig::new(&args[2], "routes.json", "pois.json")
        .with_route_markers("route_markers.json");

    match RouteView::load(&source, config).await {
        Ok(view) => {
            println!("Route {}", view.route().id);
            match view.index() {
                Some(index) => println!("  {} samples, {:.2} km", index.len(), index.total_distance_km()),
                None => println!("  No elevation data"),
            }
            println!("  {} POIs ({:?})", view.pois().len(), view.marker_strategy());
        }
        Err(e) => eprintln!("Failed to load route: {}", e),
    }
}
