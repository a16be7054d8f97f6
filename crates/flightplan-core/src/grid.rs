//! Regular capture lattice clipped to the area of interest.
//!
//! Boundary convention: a lattice point is kept only if it lies strictly inside
//! the polygon. Points exactly on an edge or vertex are dropped.

use crate::error::{PlanError, Result};
use geo::{Area, BoundingRect, Contains, Coord, Point, Polygon};
use std::collections::HashSet;

/// Upper bound on candidate lattice points for one AOI.
pub const MAX_LATTICE_POINTS: usize = 5_000_000;

/// Decimal places used when comparing planar y-values for row membership.
pub const ROW_PRECISION_DECIMALS: i32 = 6;

/// Check that a planar polygon is usable for gridding or containment tests.
pub fn validate_polygon(polygon: &Polygon<f64>) -> Result<()> {
    let exterior = polygon.exterior();
    if exterior.0.iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
        return Err(PlanError::geometry("polygon has non-finite coordinates"));
    }

    let distinct: HashSet<(u64, u64)> = exterior
        .0
        .iter()
        .map(|c| (c.x.to_bits(), c.y.to_bits()))
        .collect();
    if distinct.len() < 3 {
        return Err(PlanError::geometry(format!(
            "polygon needs at least 3 distinct vertices, got {}",
            distinct.len()
        )));
    }

    let area = polygon.unsigned_area();
    if !area.is_finite() || area <= 0.0 {
        return Err(PlanError::geometry("polygon has zero area"));
    }
    Ok(())
}

/// Quantize a planar y-value to the row grouping precision.
pub fn row_key(y: f64) -> i64 {
    (y * 10f64.powi(ROW_PRECISION_DECIMALS)).round() as i64
}

/// Tile the polygon's bounding box with a lattice anchored at the box minimum
/// and keep the points strictly inside the polygon.
///
/// Points come out row-major: ascending y, then ascending x.
pub fn generate_grid(aoi: &Polygon<f64>, x_spacing: f64, y_spacing: f64) -> Result<Vec<Coord<f64>>> {
    for (name, spacing) in [("x_spacing", x_spacing), ("y_spacing", y_spacing)] {
        if !spacing.is_finite() || spacing <= 0.0 {
            return Err(PlanError::validation(format!(
                "{name} must be positive, got {spacing}"
            )));
        }
    }
    validate_polygon(aoi)?;

    let bounds = aoi
        .bounding_rect()
        .ok_or_else(|| PlanError::geometry("polygon has no bounding box"))?;
    let min = bounds.min();
    let max = bounds.max();

    // Integer step counts keep the lattice free of accumulated float drift.
    let cols = ((max.x - min.x) / x_spacing).floor() as usize + 1;
    let rows = ((max.y - min.y) / y_spacing).floor() as usize + 1;
    if cols.saturating_mul(rows) > MAX_LATTICE_POINTS {
        return Err(PlanError::validation(format!(
            "lattice of {cols} x {rows} points exceeds the limit of {MAX_LATTICE_POINTS}; increase spacing"
        )));
    }

    let mut points = Vec::new();
    for row in 0..rows {
        let y = min.y + row as f64 * y_spacing;
        for col in 0..cols {
            let x = min.x + col as f64 * x_spacing;
            if aoi.contains(&Point::new(x, y)) {
                points.push(Coord { x, y });
            }
        }
    }

    tracing::debug!(
        cols,
        rows,
        kept = points.len(),
        "generated capture lattice"
    );
    Ok(points)
}
