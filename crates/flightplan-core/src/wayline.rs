//! Terrain-following wayline simplification.
//!
//! A dense terrain-following path is split into uniform-heading legs. Each leg
//! starts with only its two endpoints kept; every pass walks the segments
//! between consecutive keepers and injects the interior waypoint whose terrain
//! deviates most from the straight altitude ramp, provided the deviation
//! exceeds the threshold. Passes repeat until the keeper set stops changing.
//!
//! Legs are independent and are simplified in parallel. The passes inside one
//! leg are sequential.

use crate::error::{PlanError, Result};
use crate::models::{split_legs, Leg, PlannedWaypoint, TerrainPoint};
use crate::projection::{planar_distance, Projection};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Deviation tolerance relative to the segment's endpoint elevations.
///
/// Absorbs rounding in the ramp interpolation so that terrain lying on the
/// ramp never counts as exceeding a zero threshold.
const RELATIVE_TOLERANCE: f64 = 1e-9;

/// Which deviations from the altitude ramp trigger waypoint injection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviationPolicy {
    /// Only terrain rising above the ramp. Dips are compressed away.
    #[default]
    UpwardOnly,
    /// Terrain above or below the ramp.
    Symmetric,
}

impl DeviationPolicy {
    fn exceeds(self, deviation: f64, threshold: f64) -> bool {
        match self {
            Self::UpwardOnly => deviation > threshold,
            Self::Symmetric => deviation.abs() > threshold,
        }
    }
}

/// Simplifier settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WaylineConfig {
    /// Allowed AGL deviation in meters.
    pub threshold_m: f64,
    pub policy: DeviationPolicy,
    /// Maximum number of keeper-adding passes per leg; `None` runs to the fixed point.
    pub max_passes: Option<usize>,
}

impl Default for WaylineConfig {
    fn default() -> Self {
        Self {
            threshold_m: 5.0,
            policy: DeviationPolicy::UpwardOnly,
            max_passes: None,
        }
    }
}

impl WaylineConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.threshold_m.is_finite() || self.threshold_m < 0.0 {
            return Err(PlanError::validation(format!(
                "agl deviation threshold must be a non-negative number, got {}",
                self.threshold_m
            )));
        }
        Ok(())
    }
}

/// Original indices of the waypoints a leg must retain, in ascending order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeeperSet(BTreeSet<usize>);

impl KeeperSet {
    pub fn new(first_index: usize, last_index: usize) -> Self {
        Self(BTreeSet::from([first_index, last_index]))
    }

    pub fn contains(&self, index: usize) -> bool {
        self.0.contains(&index)
    }

    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }

    #[cfg(test)]
    fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }

    fn segments(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.0.iter().copied().zip(self.0.iter().copied().skip(1))
    }
}

/// Map from original index to position within the leg.
struct LegIndex<'a> {
    points: &'a [TerrainPoint],
    positions: HashMap<usize, usize>,
}

impl<'a> LegIndex<'a> {
    fn new(points: &'a [TerrainPoint]) -> Result<Self> {
        let mut positions = HashMap::with_capacity(points.len());
        for pair in points.windows(2) {
            if pair[1].index <= pair[0].index {
                return Err(PlanError::validation(format!(
                    "leg indices must be strictly increasing, found {} after {}",
                    pair[1].index, pair[0].index
                )));
            }
        }
        for (position, point) in points.iter().enumerate() {
            if !point.elevation.is_finite() {
                return Err(PlanError::validation(format!(
                    "waypoint {} has a non-finite elevation",
                    point.index
                )));
            }
            positions.insert(point.index, position);
        }
        Ok(Self { points, positions })
    }

    fn position(&self, index: usize) -> usize {
        // keepers only ever hold indices taken from this leg
        self.positions[&index]
    }

    /// Signed deviation of every interior point of segment `(a, b)` from the ramp.
    fn deviations(&self, a: usize, b: usize) -> impl Iterator<Item = (&TerrainPoint, f64)> + '_ {
        let start = self.points[self.position(a)];
        let end = self.points[self.position(b)];
        let run = planar_distance(start.position, end.position);
        let rise = end.elevation - start.elevation;
        let slope = if run > 0.0 { rise / run } else { 0.0 };

        self.points[self.position(a) + 1..self.position(b)]
            .iter()
            .map(move |p| {
                let expected = start.elevation + slope * planar_distance(start.position, p.position);
                (p, p.elevation - expected)
            })
    }

    /// Rounding allowance for deviations measured against the ramp `(a, b)`.
    fn tolerance(&self, a: usize, b: usize) -> f64 {
        let start = self.points[self.position(a)].elevation.abs();
        let end = self.points[self.position(b)].elevation.abs();
        RELATIVE_TOLERANCE * start.max(end).max(1.0)
    }

    /// The interior point of `(a, b)` with the largest deviation magnitude among
    /// those the policy accepts.
    fn injection_candidate(&self, a: usize, b: usize, config: &WaylineConfig) -> Option<usize> {
        let threshold = config.threshold_m + self.tolerance(a, b);
        let mut best: Option<(usize, f64)> = None;
        for (point, deviation) in self.deviations(a, b) {
            if !config.policy.exceeds(deviation, threshold) {
                continue;
            }
            if best.map_or(true, |(_, magnitude)| deviation.abs() > magnitude) {
                best = Some((point.index, deviation.abs()));
            }
        }
        best.map(|(index, _)| index)
    }

    fn refine(&self, keepers: &KeeperSet, config: &WaylineConfig) -> KeeperSet {
        let mut next = keepers.0.clone();
        for (a, b) in keepers.segments() {
            if let Some(candidate) = self.injection_candidate(a, b, config) {
                next.insert(candidate);
            }
        }
        KeeperSet(next)
    }
}

/// Compute the keeper set of one leg.
pub fn leg_keepers(leg: &[TerrainPoint], config: &WaylineConfig) -> Result<KeeperSet> {
    config.validate()?;
    let (Some(first), Some(last)) = (leg.first(), leg.last()) else {
        return Ok(KeeperSet(BTreeSet::new()));
    };
    let index = LegIndex::new(leg)?;

    let mut keepers = KeeperSet::new(first.index, last.index);
    let mut passes = 0usize;
    loop {
        let next = index.refine(&keepers, config);
        if next == keepers {
            break;
        }
        passes += 1;
        if let Some(max_passes) = config.max_passes {
            if passes > max_passes {
                return Err(PlanError::NotConverged {
                    first_index: first.index,
                    max_passes,
                });
            }
        }
        keepers = next;
    }

    tracing::trace!(
        first = first.index,
        dense = leg.len(),
        kept = keepers.len(),
        passes,
        "simplified leg"
    );
    Ok(keepers)
}

/// Minimal ordered subsequence of a leg that keeps the AGL deviation within the threshold.
pub fn simplify_leg(leg: &[TerrainPoint], config: &WaylineConfig) -> Result<Vec<TerrainPoint>> {
    let keepers = leg_keepers(leg, config)?;
    Ok(leg
        .iter()
        .filter(|p| keepers.contains(p.index))
        .copied()
        .collect())
}

/// Simplify legs in parallel; the output keeps leg order.
pub fn simplify_legs(
    legs: &[Leg<TerrainPoint>],
    config: &WaylineConfig,
) -> Result<Vec<Leg<TerrainPoint>>> {
    legs.par_iter()
        .map(|leg| {
            Ok(Leg {
                heading: leg.heading,
                points: simplify_leg(&leg.points, config)?,
            })
        })
        .collect()
}

/// Simplify a whole dense path given per-point headings.
///
/// Returns the retained original indices in path order.
pub fn simplify_path(
    points: &[TerrainPoint],
    headings: &[f64],
    config: &WaylineConfig,
) -> Result<Vec<usize>> {
    if points.len() != headings.len() {
        return Err(PlanError::validation(format!(
            "{} points but {} headings",
            points.len(),
            headings.len()
        )));
    }
    let legs = split_legs(points.iter().copied().zip(headings.iter().copied()), |(_, h)| *h)
        .into_iter()
        .map(|leg| Leg {
            heading: leg.heading,
            points: leg.points.into_iter().map(|(p, _)| p).collect(),
        })
        .collect::<Vec<_>>();

    let simplified = simplify_legs(&legs, config)?;
    let kept: Vec<usize> = simplified
        .iter()
        .flat_map(|leg| leg.points.iter().map(|p| p.index))
        .collect();

    tracing::info!(
        legs = legs.len(),
        dense = points.len(),
        kept = kept.len(),
        threshold_m = config.threshold_m,
        "terrain wayline simplified"
    );
    Ok(kept)
}

/// Simplify an emitted waypoint sequence that carries elevations.
///
/// The output is re-indexed so that `index` again equals position.
pub fn simplify_waypoints(
    waypoints: &[PlannedWaypoint],
    projection: &dyn Projection,
    config: &WaylineConfig,
) -> Result<Vec<PlannedWaypoint>> {
    let mut points = Vec::with_capacity(waypoints.len());
    for (position, wp) in waypoints.iter().enumerate() {
        let elevation = wp.elevation.ok_or_else(|| {
            PlanError::validation(format!("waypoint {} has no elevation", wp.index))
        })?;
        points.push(TerrainPoint {
            index: position,
            position: projection.to_planar(wp.lon, wp.lat)?,
            elevation,
        });
    }
    let headings: Vec<f64> = waypoints.iter().map(|wp| wp.heading).collect();
    let kept = simplify_path(&points, &headings, config)?;

    Ok(kept
        .into_iter()
        .enumerate()
        .map(|(new_index, position)| PlannedWaypoint {
            index: new_index,
            ..waypoints[position].clone()
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::WebMercator;
    use geo::Coord;
    use proptest::prelude::*;

    fn leg(elevations: &[f64], spacing: f64) -> Vec<TerrainPoint> {
        elevations
            .iter()
            .enumerate()
            .map(|(i, &elevation)| TerrainPoint {
                index: i,
                position: Coord {
                    x: i as f64 * spacing,
                    y: 0.0,
                },
                elevation,
            })
            .collect()
    }

    /// Largest upward deviation between consecutive keepers over the dense leg.
    fn max_upward_deviation(leg: &[TerrainPoint], keepers: &KeeperSet) -> f64 {
        let index = LegIndex::new(leg).unwrap();
        let mut worst = 0.0_f64;
        for (a, b) in keepers.segments() {
            for (_, deviation) in index.deviations(a, b) {
                worst = worst.max(deviation);
            }
        }
        worst
    }

    fn kept_indices(points: &[TerrainPoint], config: &WaylineConfig) -> Vec<usize> {
        simplify_leg(points, config)
            .unwrap()
            .iter()
            .map(|p| p.index)
            .collect()
    }

    #[test]
    fn hill_in_the_middle_is_injected() {
        let points = leg(&[100.0, 100.0, 130.0, 100.0, 100.0], 10.0);
        assert_eq!(kept_indices(&points, &WaylineConfig::default()), vec![0, 2, 4]);
    }

    #[test]
    fn dip_is_not_injected_under_upward_policy() {
        let points = leg(&[100.0, 95.0, 90.0, 95.0, 100.0], 10.0);
        assert_eq!(kept_indices(&points, &WaylineConfig::default()), vec![0, 4]);
    }

    #[test]
    fn dip_is_injected_under_symmetric_policy() {
        let points = leg(&[100.0, 95.0, 90.0, 95.0, 100.0], 10.0);
        let config = WaylineConfig {
            policy: DeviationPolicy::Symmetric,
            ..WaylineConfig::default()
        };
        assert_eq!(kept_indices(&points, &config), vec![0, 2, 4]);
    }

    #[test]
    fn straight_ramp_keeps_only_endpoints() {
        let points = leg(&[10.0, 20.0, 30.0, 40.0, 50.0, 60.0], 7.0);
        let config = WaylineConfig {
            threshold_m: 0.001,
            ..WaylineConfig::default()
        };
        assert_eq!(kept_indices(&points, &config), vec![0, 5]);
    }

    #[test]
    fn fractional_ramps_at_zero_threshold_keep_only_endpoints() {
        let config = WaylineConfig {
            threshold_m: 0.0,
            ..WaylineConfig::default()
        };
        for step in [0.01, 0.1, 0.3, 1.7, -2.35] {
            for spacing in [0.7, 9.9, 11.1, 13.37] {
                for n in 3..12 {
                    let elevations: Vec<f64> = (0..n).map(|i| 100.0 + step * i as f64).collect();
                    let points = leg(&elevations, spacing);
                    assert_eq!(
                        kept_indices(&points, &config),
                        vec![0, n - 1],
                        "n={n} step={step} spacing={spacing}"
                    );
                }
            }
        }
    }

    #[test]
    fn small_real_rise_still_counts_at_zero_threshold() {
        let points = leg(&[100.0, 100.0, 100.01, 100.0, 100.0], 10.0);
        let config = WaylineConfig {
            threshold_m: 0.0,
            ..WaylineConfig::default()
        };
        assert_eq!(kept_indices(&points, &config), vec![0, 2, 4]);
    }

    #[test]
    fn nested_hills_take_several_passes() {
        let points = leg(&[0.0, 0.0, 40.0, 0.0, 0.0, 0.0, 60.0, 0.0, 0.0], 10.0);
        let keepers = leg_keepers(&points, &WaylineConfig::default()).unwrap();
        let kept: Vec<usize> = keepers.iter().collect();
        assert!(kept.contains(&6));
        assert!(kept.contains(&2));
        assert!(max_upward_deviation(&points, &keepers) <= 5.0);
    }

    #[test]
    fn pass_limit_is_reported_not_truncated() {
        let points = leg(&[0.0, 0.0, 40.0, 0.0, 0.0, 0.0, 60.0, 0.0, 0.0], 10.0);
        let config = WaylineConfig {
            max_passes: Some(0),
            ..WaylineConfig::default()
        };
        assert!(matches!(
            simplify_leg(&points, &config),
            Err(PlanError::NotConverged { first_index: 0, max_passes: 0 })
        ));
    }

    #[test]
    fn coincident_endpoints_use_zero_slope() {
        let points = vec![
            TerrainPoint { index: 0, position: Coord { x: 0.0, y: 0.0 }, elevation: 10.0 },
            TerrainPoint { index: 1, position: Coord { x: 5.0, y: 0.0 }, elevation: 50.0 },
            TerrainPoint { index: 2, position: Coord { x: 0.0, y: 0.0 }, elevation: 30.0 },
        ];
        assert_eq!(kept_indices(&points, &WaylineConfig::default()), vec![0, 1, 2]);
    }

    #[test]
    fn tiny_legs_are_returned_whole() {
        assert!(simplify_leg(&[], &WaylineConfig::default()).unwrap().is_empty());
        let one = leg(&[5.0], 1.0);
        assert_eq!(kept_indices(&one, &WaylineConfig::default()), vec![0]);
        let two = leg(&[5.0, 500.0], 1.0);
        assert_eq!(kept_indices(&two, &WaylineConfig::default()), vec![0, 1]);
    }

    #[test]
    fn non_monotonic_indices_are_rejected() {
        let mut points = leg(&[0.0, 0.0, 0.0], 1.0);
        points[2].index = 1;
        assert!(matches!(
            simplify_leg(&points, &WaylineConfig::default()),
            Err(PlanError::Validation(_))
        ));
    }

    #[test]
    fn negative_threshold_is_rejected() {
        let config = WaylineConfig {
            threshold_m: -1.0,
            ..WaylineConfig::default()
        };
        assert!(simplify_leg(&leg(&[0.0, 1.0], 1.0), &config).is_err());
    }

    #[test]
    fn simplify_path_splits_on_heading() {
        let mut points = leg(&[100.0, 100.0, 130.0, 100.0, 100.0], 10.0);
        points.extend(leg(&[100.0, 100.0, 100.0], 10.0).into_iter().map(|mut p| {
            p.index += 5;
            p
        }));
        let headings = [-90.0, -90.0, -90.0, -90.0, -90.0, 90.0, 90.0, 90.0];
        let kept = simplify_path(&points, &headings, &WaylineConfig::default()).unwrap();
        assert_eq!(kept, vec![0, 2, 4, 5, 7]);
    }

    #[test]
    fn simplify_waypoints_reindexes_output() {
        let elevations = [100.0, 100.0, 130.0, 100.0, 100.0];
        let waypoints: Vec<PlannedWaypoint> = elevations
            .iter()
            .enumerate()
            .map(|(i, &e)| PlannedWaypoint {
                index: i,
                lon: 85.0 + i as f64 * 0.0001,
                lat: 27.0,
                heading: -90.0,
                take_photo: false,
                gimbal_angle: "-90".to_string(),
                elevation: Some(e),
                altitude: None,
                speed: None,
                extra: Default::default(),
            })
            .collect();
        let out = simplify_waypoints(&waypoints, &WebMercator, &WaylineConfig::default()).unwrap();
        let indices: Vec<usize> = out.iter().map(|wp| wp.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(out[1].elevation, Some(130.0));
    }

    #[test]
    fn simplify_waypoints_requires_elevation() {
        let wp = PlannedWaypoint {
            index: 0,
            lon: 0.0,
            lat: 0.0,
            heading: 0.0,
            take_photo: false,
            gimbal_angle: "-90".to_string(),
            elevation: None,
            altitude: None,
            speed: None,
            extra: Default::default(),
        };
        assert!(simplify_waypoints(&[wp], &WebMercator, &WaylineConfig::default()).is_err());
    }

    proptest! {
        #[test]
        fn upward_deviation_is_bounded_and_simplification_idempotent(
            elevations in prop::collection::vec(0.0_f64..200.0, 2..60),
            threshold in 0.0_f64..20.0,
            spacing in 1.0_f64..30.0,
        ) {
            let points = leg(&elevations, spacing);
            let config = WaylineConfig { threshold_m: threshold, ..WaylineConfig::default() };

            let keepers = leg_keepers(&points, &config).unwrap();
            prop_assert!(keepers.contains(0));
            prop_assert!(keepers.contains(points.len() - 1));
            prop_assert!(max_upward_deviation(&points, &keepers) <= threshold + 1e-6);

            let simplified = simplify_leg(&points, &config).unwrap();
            let again = simplify_leg(&simplified, &config).unwrap();
            prop_assert_eq!(simplified, again);
        }

        #[test]
        fn straight_ramp_is_never_refined(
            start in -100.0_f64..500.0,
            slope in -5.0_f64..5.0,
            spacing in 0.1_f64..30.0,
            len in 2usize..40,
            threshold in 0.0_f64..10.0,
        ) {
            let ramp: Vec<f64> = (0..len).map(|i| start + slope * spacing * i as f64).collect();
            let points = leg(&ramp, spacing);
            let config = WaylineConfig { threshold_m: threshold, ..WaylineConfig::default() };
            let kept: Vec<usize> = simplify_leg(&points, &config).unwrap().iter().map(|p| p.index).collect();
            prop_assert_eq!(kept, vec![0, len - 1]);
        }
    }
}
