//! Removal of waypoints that fall inside no-fly zones.

use crate::models::Waypoint;
use geo::{Contains, Coord, Point, Polygon};

/// True if `point` lies strictly inside any zone. Touching an edge does not count.
pub fn is_blocked(point: Coord<f64>, zones: &[Polygon<f64>]) -> bool {
    let point = Point::from(point);
    zones.iter().any(|zone| zone.contains(&point))
}

/// Drop waypoints strictly inside any no-fly polygon, preserving order.
pub fn exclude(waypoints: Vec<Waypoint>, zones: &[Polygon<f64>]) -> Vec<Waypoint> {
    if zones.is_empty() {
        return waypoints;
    }
    let before = waypoints.len();
    let kept: Vec<Waypoint> = waypoints
        .into_iter()
        .filter(|wp| !is_blocked(wp.position, zones))
        .collect();
    tracing::debug!(
        zones = zones.len(),
        removed = before - kept.len(),
        "applied no-fly zones"
    );
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn row(xs: &[f64]) -> Vec<Waypoint> {
        xs.iter()
            .map(|&x| Waypoint::capture(Coord { x, y: 5.0 }, -90.0))
            .collect()
    }

    #[test]
    fn inside_points_are_removed_and_order_kept() {
        let zone = polygon![
            (x: 15.0, y: 0.0),
            (x: 35.0, y: 0.0),
            (x: 35.0, y: 10.0),
            (x: 15.0, y: 10.0),
        ];
        let kept = exclude(row(&[0.0, 10.0, 20.0, 30.0, 40.0]), &[zone]);
        let xs: Vec<f64> = kept.iter().map(|wp| wp.position.x).collect();
        assert_eq!(xs, vec![0.0, 10.0, 40.0]);
    }

    #[test]
    fn touching_the_boundary_is_not_excluded() {
        let zone = polygon![
            (x: 10.0, y: 0.0),
            (x: 20.0, y: 0.0),
            (x: 20.0, y: 10.0),
            (x: 10.0, y: 10.0),
        ];
        let kept = exclude(row(&[10.0, 15.0, 20.0]), &[zone]);
        let xs: Vec<f64> = kept.iter().map(|wp| wp.position.x).collect();
        assert_eq!(xs, vec![10.0, 20.0]);
    }

    #[test]
    fn zones_apply_independently() {
        let a = polygon![(x: -1.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 10.0), (x: -1.0, y: 10.0)];
        let b = polygon![(x: 39.0, y: 0.0), (x: 41.0, y: 0.0), (x: 41.0, y: 10.0), (x: 39.0, y: 10.0)];
        let kept = exclude(row(&[0.0, 20.0, 40.0]), &[a, b]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].position.x, 20.0);
    }

    #[test]
    fn no_zones_is_identity() {
        let waypoints = row(&[0.0, 1.0]);
        assert_eq!(exclude(waypoints.clone(), &[]), waypoints);
    }
}
