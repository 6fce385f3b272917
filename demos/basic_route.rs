//! Basic example of indexing a route and querying it.
//!
//! Run with: cargo run --example basic_route

use route_insight::{
    aggregate, find_nearest, select_nearby, GpsPoint, PointOfInterest, ProximityThresholds,
    RouteIndex, RoutePoint, SurfaceSummary,
};

fn main() {
    // A short route north of Kongsberg
    let points = vec![
        RoutePoint::new(59.8300, 9.5700, 0.0, 310.0).with_surface("asphalt"),
        RoutePoint::new(59.8330, 9.5750, 0.45, 322.0).with_surface("asphalt"),
        RoutePoint::new(59.8360, 9.5790, 0.85, 341.0).with_surface("gravel"),
        RoutePoint::new(59.8400, 9.5800, 1.30, 365.0).with_surface("trail"),
        RoutePoint::new(59.8440, 9.5830, 1.78, 352.0).with_surface("boardwalk"),
    ];

    let index = RouteIndex::build(&points, false);
    println!("Route Index Example\n");
    println!("Samples: {}, total: {:.2} km\n", index.len(), index.total_distance_km());

    // Where am I?
    let here = GpsPoint::new(59.8365, 9.5770);
    let thresholds = ProximityThresholds::default();
    match find_nearest(&index, here.latitude, here.longitude) {
        Some(result) => {
            println!("1. Nearest sample: #{}", result.sample_index);
            println!("   Distance to route: {:.0} m", result.nearest_distance_m);
            println!("   From start: {:.2} km, to end: {:.2} km", result.from_start_km, result.to_end_km);
            println!("   Hint: {:?}\n", thresholds.hint(&result));
        }
        None => println!("1. Route has no coordinates\n"),
    }

    // Surface legend
    let totals = aggregate(&index);
    println!("2. Surface legend:");
    match SurfaceSummary::resolve(Some(&totals), None, false) {
        Some(summary) => {
            for entry in &summary.entries {
                println!("   {:<8} {:>5.2} km ({}%)", entry.category.as_str(), entry.km, entry.percent);
            }
        }
        None => println!("   No surface data"),
    }
    println!();

    // Nearby POIs
    let pois = vec![
        PointOfInterest::new("cafe", 59.8362, 9.5795).with_name("Cafe").with_symbol("kaffekop"),
        PointOfInterest::new("cabin", 59.8450, 9.5900).with_name("Cabin").with_symbol("cabin"),
        PointOfInterest::new("far", 60.1000, 9.9000).with_name("Far away"),
    ];
    println!("3. POIs within 5 km:");
    for hit in select_nearby(&pois, &here, 5000.0, 8) {
        println!("   {:<10} {:>6.0} m", hit.poi.display_title("en"), hit.distance_m);
    }
}
