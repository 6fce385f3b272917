//! Surface classification and per-category distance totals.
//!
//! Each route sample carries a surface label. Labels are normalised into a
//! [`SurfaceCategory`] when the [`RouteIndex`](crate::RouteIndex) is built;
//! [`aggregate`] then sums segment lengths per category, and
//! [`SurfaceSummary`] turns the totals (or the route's manually curated
//! totals) into legend entries with percentages.

use serde::{Deserialize, Serialize};

use crate::route_index::RouteIndex;
use crate::source::loose;

/// Totals at or below this many kilometers carry no meaningful data.
pub const EMPTY_TOTAL_KM: f64 = 0.0001;

/// Unknown distance at or below this many kilometers is not listed in the legend.
const UNKNOWN_LEGEND_MIN_KM: f64 = 0.01;

/// Ground type of a route segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum SurfaceCategory {
    Asphalt,
    Gravel,
    Trail,
    Unknown,
}

impl SurfaceCategory {
    /// All categories in legend order.
    pub const ALL: [SurfaceCategory; 4] = [
        SurfaceCategory::Asphalt,
        SurfaceCategory::Gravel,
        SurfaceCategory::Trail,
        SurfaceCategory::Unknown,
    ];

    /// Classify a raw label.
    ///
    /// The label is trimmed and lowercased; anything other than `asphalt`,
    /// `gravel`, `trail` or `unknown` (including a missing or empty label)
    /// becomes [`SurfaceCategory::Unknown`]. With `unknown_as_trail`,
    /// unknown is reported as [`SurfaceCategory::Trail`].
    ///
    /// ```
    /// use route_insight::SurfaceCategory;
    ///
    /// assert_eq!(SurfaceCategory::classify(Some(" Gravel "), false), SurfaceCategory::Gravel);
    /// assert_eq!(SurfaceCategory::classify(Some("cobblestone"), false), SurfaceCategory::Unknown);
    /// assert_eq!(SurfaceCategory::classify(None, true), SurfaceCategory::Trail);
    /// ```
    pub fn classify(raw: Option<&str>, unknown_as_trail: bool) -> Self {
        let label = raw.map(|s| s.trim().to_lowercase()).unwrap_or_default();
        let category = match label.as_str() {
            "asphalt" => SurfaceCategory::Asphalt,
            "gravel" => SurfaceCategory::Gravel,
            "trail" => SurfaceCategory::Trail,
            _ => SurfaceCategory::Unknown,
        };

        if unknown_as_trail && category == SurfaceCategory::Unknown {
            SurfaceCategory::Trail
        } else {
            category
        }
    }

    /// Lowercase label, as used in the data files.
    pub fn as_str(&self) -> &'static str {
        match self {
            SurfaceCategory::Asphalt => "asphalt",
            SurfaceCategory::Gravel => "gravel",
            SurfaceCategory::Trail => "trail",
            SurfaceCategory::Unknown => "unknown",
        }
    }
}

/// Distance per surface category for one route, in kilometers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct SurfaceAggregate {
    pub asphalt_km: f64,
    pub gravel_km: f64,
    pub trail_km: f64,
    pub unknown_km: f64,
    /// The route index total, not the sum of the categories.
    pub total_km: f64,
}

impl SurfaceAggregate {
    /// Distance attributed to one category.
    pub fn km(&self, category: SurfaceCategory) -> f64 {
        match category {
            SurfaceCategory::Asphalt => self.asphalt_km,
            SurfaceCategory::Gravel => self.gravel_km,
            SurfaceCategory::Trail => self.trail_km,
            SurfaceCategory::Unknown => self.unknown_km,
        }
    }

    fn add(&mut self, category: SurfaceCategory, km: f64) {
        match category {
            SurfaceCategory::Asphalt => self.asphalt_km += km,
            SurfaceCategory::Gravel => self.gravel_km += km,
            SurfaceCategory::Trail => self.trail_km += km,
            SurfaceCategory::Unknown => self.unknown_km += km,
        }
    }

    /// Sum of the four categories.
    pub fn segment_sum(&self) -> f64 {
        self.asphalt_km + self.gravel_km + self.trail_km + self.unknown_km
    }

    /// True when the total is too small to display.
    pub fn is_empty(&self) -> bool {
        self.total_km <= EMPTY_TOTAL_KM
    }
}

/// Sum segment lengths per surface category.
///
/// The segment between samples `i - 1` and `i` is attributed entirely to
/// sample `i`'s category; negative steps (non-monotonic input) count as zero.
/// `total_km` is the index's total distance. Categories are taken as stored
/// in the index, so an index built with `unknown_as_trail` has no unknown
/// distance.
pub fn aggregate(index: &RouteIndex) -> SurfaceAggregate {
    let mut totals = SurfaceAggregate {
        total_km: index.total_distance_km(),
        ..SurfaceAggregate::default()
    };

    for (pair, category) in index
        .distances_km()
        .windows(2)
        .zip(index.surfaces().iter().skip(1))
    {
        let segment_km = (pair[1] - pair[0]).max(0.0);
        totals.add(*category, segment_km);
    }

    totals
}

/// Manually curated surface totals from a route descriptor (`surface`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct CuratedSurface {
    #[serde(default)]
    pub category_km: Option<CuratedCategoryKm>,
    #[serde(default, deserialize_with = "loose::number")]
    pub total_km: Option<f64>,
}

/// Per-category curated kilometers (`surface.categoryKm`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct CuratedCategoryKm {
    #[serde(default, deserialize_with = "loose::number")]
    pub asphalt: Option<f64>,
    #[serde(default, deserialize_with = "loose::number")]
    pub gravel: Option<f64>,
    #[serde(default, deserialize_with = "loose::number")]
    pub trail: Option<f64>,
    #[serde(default, deserialize_with = "loose::number")]
    pub unknown: Option<f64>,
}

impl CuratedCategoryKm {
    fn km(&self, category: SurfaceCategory) -> Option<f64> {
        match category {
            SurfaceCategory::Asphalt => self.asphalt,
            SurfaceCategory::Gravel => self.gravel,
            SurfaceCategory::Trail => self.trail,
            SurfaceCategory::Unknown => self.unknown,
        }
    }
}

/// One legend line: category, distance and rounded share of the total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct SurfaceLegendEntry {
    pub category: SurfaceCategory,
    pub km: f64,
    pub percent: u32,
}

/// Surface legend for one route.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct SurfaceSummary {
    pub total_km: f64,
    pub entries: Vec<SurfaceLegendEntry>,
}

impl SurfaceSummary {
    /// Build the legend from computed and/or curated totals.
    ///
    /// Each category uses the computed value when present and finite, then
    /// the curated value, then zero. The total uses the computed total, then
    /// the curated total, then the sum of the categories. With
    /// `unknown_as_trail` unknown distance is folded into trail. Returns
    /// `None` when the total is at or below [`EMPTY_TOTAL_KM`]. Asphalt,
    /// gravel and trail are always listed; unknown only when the policy is
    /// off and it exceeds 10 m.
    ///
    /// ```
    /// use route_insight::{SurfaceAggregate, SurfaceCategory, SurfaceSummary};
    ///
    /// let computed = SurfaceAggregate {
    ///     asphalt_km: 3.0, gravel_km: 1.0, trail_km: 0.0, unknown_km: 0.0, total_km: 4.0,
    /// };
    /// let summary = SurfaceSummary::resolve(Some(&computed), None, false).unwrap();
    /// assert_eq!(summary.entries.len(), 3);
    /// assert_eq!(summary.entry(SurfaceCategory::Asphalt).unwrap().percent, 75);
    /// ```
    pub fn resolve(
        computed: Option<&SurfaceAggregate>,
        curated: Option<&CuratedSurface>,
        unknown_as_trail: bool,
    ) -> Option<Self> {
        let curated_km = curated.and_then(|c| c.category_km.as_ref());

        let pick = |category: SurfaceCategory| {
            computed
                .map(|c| c.km(category))
                .filter(|v| v.is_finite())
                .or_else(|| curated_km.and_then(|c| c.km(category)).filter(|v| v.is_finite()))
                .unwrap_or(0.0)
        };

        let asphalt = pick(SurfaceCategory::Asphalt);
        let gravel = pick(SurfaceCategory::Gravel);
        let mut trail = pick(SurfaceCategory::Trail);
        let mut unknown = pick(SurfaceCategory::Unknown);

        let total = computed
            .map(|c| c.total_km)
            .filter(|v| v.is_finite())
            .or_else(|| curated.and_then(|c| c.total_km).filter(|v| v.is_finite()))
            .unwrap_or(asphalt + gravel + trail + unknown);

        if unknown_as_trail {
            trail += unknown;
            unknown = 0.0;
        }

        if total <= EMPTY_TOTAL_KM {
            return None;
        }

        let percent = |km: f64| ((km / total) * 100.0).round().max(0.0) as u32;
        let entry = |category, km| SurfaceLegendEntry { category, km, percent: percent(km) };

        let mut entries = vec![
            entry(SurfaceCategory::Asphalt, asphalt),
            entry(SurfaceCategory::Gravel, gravel),
            entry(SurfaceCategory::Trail, trail),
        ];
        if !unknown_as_trail && unknown > UNKNOWN_LEGEND_MIN_KM {
            entries.push(entry(SurfaceCategory::Unknown, unknown));
        }

        Some(Self { total_km: total, entries })
    }

    /// Legend line for a category, if listed.
    pub fn entry(&self, category: SurfaceCategory) -> Option<&SurfaceLegendEntry> {
        self.entries.iter().find(|e| e.category == category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route_index::RoutePoint;

    fn two_point_route() -> Vec<RoutePoint> {
        vec![
            RoutePoint::new(59.0, 9.0, 0.0, 100.0).with_surface("asphalt"),
            RoutePoint::new(59.01, 9.0, 1.0, 150.0).with_surface("gravel"),
        ]
    }

    #[test]
    fn test_classify_labels() {
        assert_eq!(SurfaceCategory::classify(Some("ASPHALT"), false), SurfaceCategory::Asphalt);
        assert_eq!(SurfaceCategory::classify(Some("  trail\n"), false), SurfaceCategory::Trail);
        assert_eq!(SurfaceCategory::classify(Some(""), false), SurfaceCategory::Unknown);
        assert_eq!(SurfaceCategory::classify(Some("paved"), false), SurfaceCategory::Unknown);
        assert_eq!(SurfaceCategory::classify(Some("unknown"), true), SurfaceCategory::Trail);
        assert_eq!(SurfaceCategory::classify(Some("gravel"), true), SurfaceCategory::Gravel);
    }

    #[test]
    fn test_segment_goes_to_ending_sample() {
        let index = RouteIndex::build(&two_point_route(), false);
        let totals = aggregate(&index);

        assert_eq!(totals.asphalt_km, 0.0);
        assert!((totals.gravel_km - 1.0).abs() < 1e-9);
        assert_eq!(totals.trail_km, 0.0);
        assert_eq!(totals.unknown_km, 0.0);
        assert_eq!(totals.total_km, 1.0);
    }

    #[test]
    fn test_sum_matches_total() {
        let labels = ["asphalt", "gravel", "", "trail", "mud", "gravel", "asphalt"];
        let points: Vec<RoutePoint> = labels
            .iter()
            .enumerate()
            .map(|(i, label)| {
                RoutePoint::new(59.0 + i as f64 * 0.001, 9.0, i as f64 * 0.37, 100.0)
                    .with_surface(label)
            })
            .collect();

        let index = RouteIndex::build(&points, false);
        let totals = aggregate(&index);
        assert!((totals.segment_sum() - totals.total_km).abs() < 1e-6);
        assert!(totals.unknown_km > 0.0);

        let folded = aggregate(&RouteIndex::build(&points, true));
        assert_eq!(folded.unknown_km, 0.0);
        assert!((folded.trail_km - (totals.trail_km + totals.unknown_km)).abs() < 1e-9);
    }

    #[test]
    fn test_non_monotonic_step_is_clamped() {
        let points = vec![
            RoutePoint::new(59.0, 9.0, 0.0, 100.0).with_surface("asphalt"),
            RoutePoint::new(59.001, 9.0, 2.0, 100.0).with_surface("asphalt"),
            RoutePoint::new(59.002, 9.0, 1.5, 100.0).with_surface("gravel"),
        ];
        let totals = aggregate(&RouteIndex::build(&points, false));
        assert_eq!(totals.gravel_km, 0.0);
        assert_eq!(totals.asphalt_km, 2.0);
        // The index total stays authoritative
        assert_eq!(totals.total_km, 1.5);
    }

    #[test]
    fn test_empty_index_is_empty_aggregate() {
        let totals = aggregate(&RouteIndex::build(&[], false));
        assert!(totals.is_empty());
        assert_eq!(totals.segment_sum(), 0.0);
    }

    #[test]
    fn test_summary_falls_back_to_curated() {
        let curated: CuratedSurface = serde_json::from_value(serde_json::json!({
            "categoryKm": { "asphalt": 2.0, "gravel": "1.0", "trail": 0.5, "unknown": 0.5 },
            "totalKm": 4.0
        }))
        .unwrap();

        let summary = SurfaceSummary::resolve(None, Some(&curated), false).unwrap();
        assert_eq!(summary.total_km, 4.0);
        assert_eq!(summary.entries.len(), 4);
        assert_eq!(summary.entry(SurfaceCategory::Asphalt).unwrap().percent, 50);
        assert_eq!(summary.entry(SurfaceCategory::Gravel).unwrap().km, 1.0);
        assert_eq!(summary.entry(SurfaceCategory::Unknown).unwrap().percent, 13);
    }

    #[test]
    fn test_summary_folds_unknown_into_trail() {
        let computed = SurfaceAggregate {
            asphalt_km: 1.0,
            gravel_km: 0.0,
            trail_km: 0.5,
            unknown_km: 0.5,
            total_km: 2.0,
        };
        let summary = SurfaceSummary::resolve(Some(&computed), None, true).unwrap();
        assert_eq!(summary.entries.len(), 3);
        assert!(summary.entry(SurfaceCategory::Unknown).is_none());
        assert_eq!(summary.entry(SurfaceCategory::Trail).unwrap().km, 1.0);
        assert_eq!(summary.entry(SurfaceCategory::Trail).unwrap().percent, 50);
    }

    #[test]
    fn test_summary_hides_tiny_unknown() {
        let computed = SurfaceAggregate {
            asphalt_km: 1.0,
            gravel_km: 0.0,
            trail_km: 0.0,
            unknown_km: 0.005,
            total_km: 1.005,
        };
        let summary = SurfaceSummary::resolve(Some(&computed), None, false).unwrap();
        assert!(summary.entry(SurfaceCategory::Unknown).is_none());
    }

    #[test]
    fn test_summary_suppressed_without_data() {
        assert!(SurfaceSummary::resolve(None, None, false).is_none());

        let empty = SurfaceAggregate::default();
        assert!(SurfaceSummary::resolve(Some(&empty), None, false).is_none());
    }

    #[test]
    fn test_summary_total_from_parts() {
        let curated: CuratedSurface = serde_json::from_value(serde_json::json!({
            "categoryKm": { "asphalt": 1.0, "trail": 3.0 }
        }))
        .unwrap();
        let summary = SurfaceSummary::resolve(None, Some(&curated), false).unwrap();
        assert_eq!(summary.total_km, 4.0);
        assert_eq!(summary.entry(SurfaceCategory::Trail).unwrap().percent, 75);
        assert_eq!(summary.entry(SurfaceCategory::Gravel).unwrap().km, 0.0);
    }
}
