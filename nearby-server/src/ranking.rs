//! Distance ranking of POI candidates.
//!
//! Pure, synchronous stage of the pipeline: compute a straight-line
//! distance for every candidate, filter, sort, cap. The slow accurate
//! routing happens later, and only for selected results.

use std::collections::HashSet;
use std::sync::Arc;

use crate::domain::{Coordinate, PoiAttributes, PointOfInterest, SchoolLevel, SchoolSector};
use crate::geo;

/// Straight-line ceiling for candidates, in km.
///
/// Tuned so that the post-multiplier walking estimate stays near a
/// 20-minute practical limit with margin.
pub const MAX_STRAIGHT_LINE_KM: f64 = 2.5;

/// Default cap on ranked results per category.
pub const DEFAULT_MAX_RESULTS: usize = 10;

/// Ranking parameters.
#[derive(Debug, Clone)]
pub struct RankConfig {
    /// Discard candidates further than this, straight-line.
    pub max_distance_km: f64,

    /// Truncate the ranked list to this many results.
    pub max_results: usize,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            max_distance_km: MAX_STRAIGHT_LINE_KM,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

/// Category-specific candidate filter.
///
/// A closed set of variants rather than an arbitrary predicate, so the
/// web layer and preference store can name the active filter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    /// Accept every candidate (stations, supermarkets).
    #[default]
    Any,

    /// Accept schools matching the selected sectors and levels.
    /// An empty set means that dimension is unconstrained.
    School {
        sectors: HashSet<SchoolSector>,
        levels: HashSet<SchoolLevel>,
    },
}

impl CategoryFilter {
    /// Whether a POI passes this filter.
    pub fn accepts(&self, poi: &PointOfInterest) -> bool {
        match self {
            Self::Any => true,
            Self::School { sectors, levels } => match &poi.attributes {
                PoiAttributes::School { sector, level, .. } => {
                    (sectors.is_empty() || sectors.contains(sector))
                        && (levels.is_empty() || levels.contains(level))
                }
                // A school filter applied to a non-school list rejects nothing.
                _ => true,
            },
        }
    }
}

/// A POI augmented with its distance from the search origin.
///
/// Derived data: recomputed whenever the origin or filters change,
/// never persisted.
#[derive(Debug, Clone)]
pub struct RankedResult {
    pub poi: Arc<PointOfInterest>,
    pub distance_km: f64,
    pub estimated_walk_minutes: u32,
}

/// Rank candidates by straight-line distance from `origin`.
///
/// Applies the filter, discards candidates beyond the distance ceiling,
/// sorts ascending by distance (stable, so equidistant candidates keep
/// their input order) and truncates to the configured cap.
///
/// An empty result is valid; callers track "no data loaded yet"
/// separately.
pub fn rank(
    pois: &[Arc<PointOfInterest>],
    origin: &Coordinate,
    filter: &CategoryFilter,
    config: &RankConfig,
) -> Vec<RankedResult> {
    let mut results: Vec<RankedResult> = pois
        .iter()
        .filter(|poi| filter.accepts(poi))
        .map(|poi| {
            let distance_km = geo::distance_km(origin, &poi.coordinate);
            RankedResult {
                poi: Arc::clone(poi),
                distance_km,
                estimated_walk_minutes: geo::estimate_walking_minutes(distance_km),
            }
        })
        .filter(|r| r.distance_km <= config.max_distance_km)
        .collect();

    results.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    results.truncate(config.max_results);
    results
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::domain::PoiAttributes;
    use proptest::prelude::*;

    fn arb_pois() -> impl Strategy<Value = Vec<Arc<PointOfInterest>>> {
        prop::collection::vec((-33.95..-33.80f64, 151.10..151.30f64), 0..40).prop_map(|coords| {
            coords
                .into_iter()
                .enumerate()
                .map(|(i, (lat, lon))| {
                    Arc::new(PointOfInterest {
                        id: i.to_string(),
                        name: format!("poi {i}"),
                        coordinate: Coordinate::new(lat, lon).unwrap(),
                        attributes: PoiAttributes::Station { suburb: None },
                    })
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn ranking_is_idempotent(pois in arb_pois()) {
            let origin = Coordinate::new(-33.87, 151.21).unwrap();
            let config = RankConfig::default();

            let first = rank(&pois, &origin, &CategoryFilter::Any, &config);
            let second = rank(&pois, &origin, &CategoryFilter::Any, &config);

            let ids = |rs: &[RankedResult]| {
                rs.iter().map(|r| r.poi.id.clone()).collect::<Vec<_>>()
            };
            prop_assert_eq!(ids(&first), ids(&second));
        }

        #[test]
        fn no_result_exceeds_ceiling(pois in arb_pois()) {
            let origin = Coordinate::new(-33.87, 151.21).unwrap();
            let ranked = rank(&pois, &origin, &CategoryFilter::Any, &RankConfig::default());

            for r in &ranked {
                prop_assert!(r.distance_km <= MAX_STRAIGHT_LINE_KM);
            }
        }

        #[test]
        fn output_is_sorted_and_capped(pois in arb_pois()) {
            let origin = Coordinate::new(-33.87, 151.21).unwrap();
            let ranked = rank(&pois, &origin, &CategoryFilter::Any, &RankConfig::default());

            prop_assert!(ranked.len() <= DEFAULT_MAX_RESULTS);
            for window in ranked.windows(2) {
                prop_assert!(window[0].distance_km <= window[1].distance_km);
            }
        }
    }
}
