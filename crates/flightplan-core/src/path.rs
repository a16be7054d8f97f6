//! Boustrophedon ordering of the capture lattice.
//!
//! Rows alternate direction so the whole path is one continuous line. Each row
//! gets a lead-in and a lead-out point one forward spacing beyond its ends, and
//! optionally two oblique passes for 3D capture.

use crate::error::{PlanError, Result};
use crate::grid::row_key;
use crate::models::{
    split_legs, Waypoint, GIMBAL_OBLIQUE_FORWARD, GIMBAL_OBLIQUE_RETURN,
};
use geo::Coord;
use std::collections::BTreeMap;

/// Heading of rows flown toward +x.
pub const EVEN_ROW_HEADING: f64 = -90.0;
/// Heading of rows flown toward -x.
pub const ODD_ROW_HEADING: f64 = 90.0;

/// Runs longer than this are reduced to their entry and exit pairs in wayline mode.
const COLLAPSE_MIN_RUN: usize = 4;

/// Group lattice points into rows by rounded y, ascending, each sorted by ascending x.
pub fn group_rows(grid_points: &[Coord<f64>]) -> Vec<Vec<Coord<f64>>> {
    let mut rows: BTreeMap<i64, Vec<Coord<f64>>> = BTreeMap::new();
    for point in grid_points {
        rows.entry(row_key(point.y)).or_default().push(*point);
    }
    rows.into_values()
        .map(|mut row| {
            row.sort_by(|a, b| a.x.total_cmp(&b.x));
            row
        })
        .collect()
}

/// Order lattice points into a single survey path.
///
/// With `generate_dense` unset, every uniform-heading run longer than four
/// points keeps only its first two and last two points, and no waypoint
/// triggers a photo.
pub fn build_path(
    grid_points: &[Coord<f64>],
    forward_spacing: f64,
    generate_dense: bool,
    generate_3d: bool,
) -> Result<Vec<Waypoint>> {
    if grid_points.is_empty() {
        return Err(PlanError::EmptyPlan(
            "no capture points inside the area at this spacing".to_string(),
        ));
    }
    if !forward_spacing.is_finite() || forward_spacing <= 0.0 {
        return Err(PlanError::validation(format!(
            "forward spacing must be positive, got {forward_spacing}"
        )));
    }

    let rows = group_rows(grid_points);
    let mut path = Vec::new();
    for (row_idx, row) in rows.iter().enumerate() {
        let row_pass = nadir_pass(row, row_idx, forward_spacing);
        if generate_3d {
            let heading = row_pass[0].heading;
            let positions: Vec<Coord<f64>> = row_pass.iter().map(|wp| wp.position).collect();
            let return_pass = oblique_pass(
                positions.iter().rev().copied(),
                -heading,
                GIMBAL_OBLIQUE_RETURN,
            );
            let forward_pass =
                oblique_pass(positions.iter().copied(), heading, GIMBAL_OBLIQUE_FORWARD);
            path.extend(row_pass);
            path.extend(return_pass);
            path.extend(forward_pass);
        } else {
            path.extend(row_pass);
        }
    }

    tracing::debug!(
        rows = rows.len(),
        waypoints = path.len(),
        generate_3d,
        "built boustrophedon path"
    );

    if generate_dense {
        Ok(path)
    } else {
        Ok(collapse_runs(path))
    }
}

/// One nadir pass over a row, bracketed by lead points.
fn nadir_pass(row: &[Coord<f64>], row_idx: usize, forward_spacing: f64) -> Vec<Waypoint> {
    let even = row_idx % 2 == 0;
    let (heading, direction) = if even {
        (EVEN_ROW_HEADING, 1.0)
    } else {
        (ODD_ROW_HEADING, -1.0)
    };

    let ordered: Vec<Coord<f64>> = if even {
        row.to_vec()
    } else {
        row.iter().rev().copied().collect()
    };
    // group_rows never yields an empty row
    let first = ordered[0];
    let last = ordered[ordered.len() - 1];
    let row_y = first.y;

    let mut pass = Vec::with_capacity(ordered.len() + 2);
    pass.push(Waypoint::lead(
        Coord {
            x: first.x - direction * forward_spacing,
            y: row_y,
        },
        heading,
    ));
    pass.extend(ordered.iter().map(|p| Waypoint::capture(*p, heading)));
    pass.push(Waypoint::lead(
        Coord {
            x: last.x + direction * forward_spacing,
            y: row_y,
        },
        heading,
    ));
    pass
}

/// An oblique pass; its first and last points never trigger the camera.
fn oblique_pass(
    positions: impl ExactSizeIterator<Item = Coord<f64>>,
    heading: f64,
    gimbal_angle: &str,
) -> Vec<Waypoint> {
    let len = positions.len();
    positions
        .enumerate()
        .map(|(i, position)| {
            let interior = i != 0 && i + 1 != len;
            Waypoint::new(position, heading, interior, gimbal_angle)
        })
        .collect()
}

/// Reduce each uniform-heading run to its entry and exit pairs, photos off.
fn collapse_runs(path: Vec<Waypoint>) -> Vec<Waypoint> {
    split_legs(path, |wp| wp.heading)
        .into_iter()
        .flat_map(|leg| {
            let points = leg.points;
            let kept: Vec<Waypoint> = if points.len() > COLLAPSE_MIN_RUN {
                let n = points.len();
                [0, 1, n - 2, n - 1]
                    .iter()
                    .map(|&i| points[i].clone())
                    .collect()
            } else {
                points
            };
            kept.into_iter().map(|wp| wp.with_take_photo(false))
        })
        .collect()
}
