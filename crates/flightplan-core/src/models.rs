//! Core data models for survey flight plans.

use geo::Coord;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Gimbal pitch for straight-down capture.
pub const GIMBAL_NADIR: &str = "-90";
/// Gimbal tilt used on the oblique return pass of a 3D row.
pub const GIMBAL_OBLIQUE_RETURN: &str = "-45";
/// Gimbal tilt used on the oblique forward pass of a 3D row.
pub const GIMBAL_OBLIQUE_FORWARD: &str = "45";

/// A waypoint in the planar (metric) frame, before index assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint {
    pub position: Coord<f64>,
    /// Heading in degrees, expressed in the gridding frame.
    pub heading: f64,
    pub take_photo: bool,
    pub gimbal_angle: String,
}

impl Waypoint {
    pub fn new(position: Coord<f64>, heading: f64, take_photo: bool, gimbal_angle: &str) -> Self {
        Self {
            position,
            heading,
            take_photo,
            gimbal_angle: gimbal_angle.to_string(),
        }
    }

    /// Photo-triggering nadir waypoint.
    pub fn capture(position: Coord<f64>, heading: f64) -> Self {
        Self::new(position, heading, true, GIMBAL_NADIR)
    }

    /// Lead-in/lead-out point that absorbs acceleration without exposing a frame.
    pub fn lead(position: Coord<f64>, heading: f64) -> Self {
        Self::new(position, heading, false, GIMBAL_NADIR)
    }

    /// Copy of this waypoint with a different photo flag.
    pub fn with_take_photo(&self, take_photo: bool) -> Self {
        Self {
            take_photo,
            ..self.clone()
        }
    }
}

/// A waypoint as emitted in the final plan, in geographic coordinates.
///
/// `index` equals the waypoint's position in the emitted sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedWaypoint {
    pub index: usize,
    pub lon: f64,
    pub lat: f64,
    pub heading: f64,
    pub take_photo: bool,
    pub gimbal_angle: String,
    /// Terrain elevation under the waypoint, meters above datum.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation: Option<f64>,
    /// Commanded altitude after terrain adjustment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    /// Feature properties this crate does not interpret, passed through unchanged.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

/// A waypoint of a dense leg, annotated with terrain elevation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainPoint {
    /// Original index in the dense sequence.
    pub index: usize,
    pub position: Coord<f64>,
    pub elevation: f64,
}

/// A maximal contiguous run of waypoints sharing one heading.
#[derive(Debug, Clone, PartialEq)]
pub struct Leg<T> {
    pub heading: f64,
    pub points: Vec<T>,
}

impl<T> Leg<T> {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Split an ordered sequence into legs wherever the heading changes.
///
/// Every element lands in exactly one leg and the final run is always emitted.
pub fn split_legs<T, F>(items: impl IntoIterator<Item = T>, heading_of: F) -> Vec<Leg<T>>
where
    F: Fn(&T) -> f64,
{
    let mut legs: Vec<Leg<T>> = Vec::new();
    for item in items {
        let heading = heading_of(&item);
        match legs.last_mut() {
            Some(leg) if leg.heading == heading => leg.points.push(item),
            _ => legs.push(Leg {
                heading,
                points: vec![item],
            }),
        }
    }
    legs
}
