//! Commanded altitude and speed for terrain-aware output.

use crate::models::PlannedWaypoint;

/// Set each waypoint's commanded altitude relative to the first waypoint's terrain.
///
/// `altitude = agl + (base_elevation - elevation)`, where the base is the first
/// waypoint's elevation (0 when it has none). Waypoints without elevation fly at
/// `agl`. Every waypoint gets `speed = ground_speed`.
pub fn apply_terrain_altitude(
    waypoints: Vec<PlannedWaypoint>,
    agl: f64,
    ground_speed: f64,
) -> Vec<PlannedWaypoint> {
    let base_elevation = waypoints
        .first()
        .and_then(|wp| wp.elevation)
        .unwrap_or(0.0);

    waypoints
        .into_iter()
        .map(|wp| {
            let altitude = match wp.elevation {
                Some(elevation) => agl + (base_elevation - elevation),
                None => agl,
            };
            PlannedWaypoint {
                altitude: Some(altitude),
                speed: Some(ground_speed),
                ..wp
            }
        })
        .collect()
}
