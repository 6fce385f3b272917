//! Elevation chart data.
//!
//! The chart plots elevation against along-route distance, coloured by
//! surface category, and shows the local slope on hover. Everything here is
//! derived from a [`RouteIndex`], so chart sample `i` and route sample `i`
//! always refer to the same point.

use serde::Serialize;

use crate::route_index::RouteIndex;
use crate::surface::SurfaceCategory;

/// Vertical axis step, in meters.
const ELEVATION_STEP_M: f64 = 50.0;

/// One chart sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct ProfileSample {
    pub distance_km: f64,
    pub elevation_m: f64,
    /// Slope from the previous sample, in percent
    pub slope_percent: f64,
    pub surface: SurfaceCategory,
}

/// Chart data for one route.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct ElevationProfile {
    pub samples: Vec<ProfileSample>,
    /// Horizontal axis maximum (route total distance)
    pub x_max_km: f64,
    /// Vertical axis maximum, rounded up to the next 50 m
    pub y_max_m: f64,
    /// Whether the unknown series is folded into trail
    pub unknown_as_trail: bool,
}

impl ElevationProfile {
    /// Derive chart data from a route index.
    ///
    /// Slope is `Δelevation / (Δdistance_km * 1000) * 100`, and 0 for the
    /// first sample or when the distance does not advance.
    ///
    /// ```
    /// use route_insight::{ElevationProfile, RouteIndex, RoutePoint};
    ///
    /// let index = RouteIndex::build(&[
    ///     RoutePoint::new(59.0, 9.0, 0.0, 100.0),
    ///     RoutePoint::new(59.01, 9.0, 1.0, 150.0),
    /// ], false);
    ///
    /// let profile = ElevationProfile::from_index(&index);
    /// assert_eq!(profile.samples[1].slope_percent, 5.0);
    /// assert_eq!(profile.y_max_m, 150.0);
    /// ```
    pub fn from_index(index: &RouteIndex) -> Self {
        let distances = index.distances_km();
        let elevations = index.elevations_m();

        let samples: Vec<ProfileSample> = (0..index.len())
            .map(|i| {
                let slope_percent = if i == 0 {
                    0.0
                } else {
                    let run_km = distances[i] - distances[i - 1];
                    if run_km > 0.0 {
                        (elevations[i] - elevations[i - 1]) / (run_km * 1000.0) * 100.0
                    } else {
                        0.0
                    }
                };

                ProfileSample {
                    distance_km: distances[i],
                    elevation_m: elevations[i],
                    slope_percent,
                    surface: index.surfaces()[i],
                }
            })
            .collect();

        let highest = elevations.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let y_max_m = if highest.is_finite() {
            (highest / ELEVATION_STEP_M).ceil() * ELEVATION_STEP_M
        } else {
            0.0
        };

        Self {
            samples,
            x_max_km: index.total_distance_km(),
            y_max_m,
            unknown_as_trail: index.unknown_as_trail(),
        }
    }

    /// Categories that get their own series, in drawing order.
    pub fn categories(&self) -> Vec<SurfaceCategory> {
        SurfaceCategory::ALL
            .into_iter()
            .filter(|c| !(self.unknown_as_trail && *c == SurfaceCategory::Unknown))
            .collect()
    }

    /// Elevation series for one category: the sample's elevation where the
    /// category matches, `None` elsewhere.
    ///
    /// Returns `None` for the unknown series when it is folded into trail.
    pub fn series(&self, category: SurfaceCategory) -> Option<Vec<Option<f64>>> {
        if self.unknown_as_trail && category == SurfaceCategory::Unknown {
            return None;
        }

        Some(
            self.samples
                .iter()
                .map(|s| (s.surface == category).then_some(s.elevation_m))
                .collect(),
        )
    }
}
