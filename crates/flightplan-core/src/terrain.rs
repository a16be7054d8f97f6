//! Elevation lookup seam between the planner and a DEM collaborator.

use crate::error::{RasterError, Result};
use crate::models::PlannedWaypoint;

/// Anything that can report terrain elevation, in meters, under a geographic point.
pub trait ElevationSource: Send + Sync {
    fn sample_elevation(&self, lon: f64, lat: f64) -> std::result::Result<f64, RasterError>;

    /// Sample many points; the first failure aborts the whole batch.
    fn sample_points(&self, points: &[(f64, f64)]) -> std::result::Result<Vec<f64>, RasterError> {
        points
            .iter()
            .map(|&(lon, lat)| self.sample_elevation(lon, lat))
            .collect()
    }
}

/// Attach a sampled elevation to every waypoint.
pub fn attach_elevation(
    waypoints: Vec<PlannedWaypoint>,
    source: &dyn ElevationSource,
) -> Result<Vec<PlannedWaypoint>> {
    let points: Vec<(f64, f64)> = waypoints.iter().map(|wp| (wp.lon, wp.lat)).collect();
    let elevations = source.sample_points(&points)?;
    tracing::debug!(points = points.len(), "sampled elevations");
    Ok(waypoints
        .into_iter()
        .zip(elevations)
        .map(|(wp, elevation)| PlannedWaypoint {
            elevation: Some(elevation),
            ..wp
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlanError;

    struct Slope;

    impl ElevationSource for Slope {
        fn sample_elevation(&self, lon: f64, lat: f64) -> std::result::Result<f64, RasterError> {
            if lon > 10.0 {
                return Err(RasterError::OutOfRasterBounds { lon, lat });
            }
            Ok(100.0 + lon * 10.0)
        }
    }

    fn waypoint(lon: f64) -> PlannedWaypoint {
        PlannedWaypoint {
            index: 0,
            lon,
            lat: 0.0,
            heading: 0.0,
            take_photo: true,
            gimbal_angle: "-90".to_string(),
            elevation: None,
            altitude: None,
            speed: None,
            extra: Default::default(),
        }
    }

    #[test]
    fn elevations_are_attached_in_order() {
        let out = attach_elevation(vec![waypoint(1.0), waypoint(2.0)], &Slope).unwrap();
        assert_eq!(out[0].elevation, Some(110.0));
        assert_eq!(out[1].elevation, Some(120.0));
    }

    #[test]
    fn out_of_bounds_fails_the_batch() {
        let err = attach_elevation(vec![waypoint(1.0), waypoint(11.0)], &Slope).unwrap_err();
        assert!(matches!(
            err,
            PlanError::Raster(RasterError::OutOfRasterBounds { .. })
        ));
    }
}
