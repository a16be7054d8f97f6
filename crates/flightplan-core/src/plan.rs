//! End-to-end flight plan generation.
//!
//! Runs the pipeline parameters → projection → rotation → grid → path →
//! rotate back → no-fly filter → home point → geographic conversion →
//! terrain (elevation, wayline simplification, placemark altitude) → indexing.

use crate::error::{PlanError, Result};
use crate::grid::{generate_grid, validate_polygon};
use crate::models::{split_legs, PlannedWaypoint, TerrainPoint, Waypoint, GIMBAL_NADIR};
use crate::no_fly;
use crate::parameters::{calculate_parameters, Altitude, FlightParameters};
use crate::path::build_path;
use crate::placemark::apply_terrain_altitude;
use crate::projection::{
    haversine_distance, project_polygon, rotate_about, rotate_polygon, Projection, WebMercator,
};
use crate::sensor::SensorProfile;
use crate::terrain::ElevationSource;
use crate::wayline::{simplify_path, DeviationPolicy, WaylineConfig};
use geo::{Centroid, Polygon};
use serde::{Deserialize, Serialize};

/// Recognized planning options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanOptions {
    pub altitude: Altitude,
    /// Forward overlap, percent in `[0, 100)`.
    pub forward_overlap: f64,
    /// Side overlap, percent in `[0, 100)`.
    pub side_overlap: f64,
    /// Overrides the sensor profile's image interval.
    pub image_interval_s: Option<f64>,
    /// Grid orientation, degrees counter-clockwise.
    pub rotation_angle_deg: f64,
    /// Emit every capture point instead of per-leg entry/exit waylines.
    pub generate_dense: bool,
    /// Add oblique return and forward passes per row.
    pub generate_3d: bool,
    /// Sample terrain and adjust altitudes; requires an elevation source.
    pub terrain_follow: bool,
    pub agl_deviation_threshold_m: f64,
    pub deviation_policy: DeviationPolicy,
    pub max_simplify_passes: Option<usize>,
    /// Start and finish at the AOI centroid.
    pub include_home_point: bool,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            altitude: Altitude::Agl(115.0),
            forward_overlap: 70.0,
            side_overlap: 70.0,
            image_interval_s: None,
            rotation_angle_deg: 0.0,
            generate_dense: false,
            generate_3d: false,
            terrain_follow: false,
            agl_deviation_threshold_m: 5.0,
            deviation_policy: DeviationPolicy::UpwardOnly,
            max_simplify_passes: None,
            include_home_point: true,
        }
    }
}

impl PlanOptions {
    pub fn wayline_config(&self) -> WaylineConfig {
        WaylineConfig {
            threshold_m: self.agl_deviation_threshold_m,
            policy: self.deviation_policy,
            max_passes: self.max_simplify_passes,
        }
    }

    /// Terrain-following waylines are simplified from the dense path.
    fn simplifies_terrain(&self) -> bool {
        self.terrain_follow && !self.generate_dense
    }
}

/// Summary figures of a generated plan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanStats {
    pub waypoint_count: usize,
    pub photo_count: usize,
    pub leg_count: usize,
    /// Great-circle length of the whole path, meters.
    pub total_distance_m: f64,
}

impl PlanStats {
    fn from_waypoints(waypoints: &[PlannedWaypoint]) -> Self {
        let total_distance_m = waypoints
            .windows(2)
            .map(|pair| haversine_distance(pair[0].lat, pair[0].lon, pair[1].lat, pair[1].lon))
            .sum();
        Self {
            waypoint_count: waypoints.len(),
            photo_count: waypoints.iter().filter(|wp| wp.take_photo).count(),
            leg_count: split_legs(waypoints.iter(), |wp| wp.heading).len(),
            total_distance_m,
        }
    }
}

/// A generated flight plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightPlan {
    pub parameters: FlightParameters,
    pub waypoints: Vec<PlannedWaypoint>,
    pub stats: PlanStats,
}

/// Generate a flight plan over a geographic AOI using Web Mercator as the planar frame.
pub fn create_plan(
    aoi: &Polygon<f64>,
    no_fly_zones: &[Polygon<f64>],
    options: &PlanOptions,
    sensor: &SensorProfile,
    elevation: Option<&dyn ElevationSource>,
) -> Result<FlightPlan> {
    create_plan_with_projection(&WebMercator, aoi, no_fly_zones, options, sensor, elevation)
}

/// [`create_plan`] with an explicit planar projection.
pub fn create_plan_with_projection(
    projection: &dyn Projection,
    aoi: &Polygon<f64>,
    no_fly_zones: &[Polygon<f64>],
    options: &PlanOptions,
    sensor: &SensorProfile,
    elevation: Option<&dyn ElevationSource>,
) -> Result<FlightPlan> {
    let elevation = match (options.terrain_follow, elevation) {
        (true, None) => {
            return Err(PlanError::validation(
                "terrain_follow requires an elevation source",
            ))
        }
        (true, source) => source,
        (false, _) => None,
    };
    let wayline = options.wayline_config();
    if options.simplifies_terrain() {
        wayline.validate()?;
    }
    if !options.rotation_angle_deg.is_finite() {
        return Err(PlanError::validation("rotation angle must be finite"));
    }

    let parameters = calculate_parameters(
        options.altitude,
        options.forward_overlap,
        options.side_overlap,
        options.image_interval_s,
        sensor,
    )?;

    // Planar frame
    let planar_aoi = project_polygon(aoi, projection)?;
    validate_polygon(&planar_aoi)?;
    let centroid = planar_aoi
        .centroid()
        .ok_or_else(|| PlanError::geometry("area of interest has no centroid"))?
        .0;
    let (_, centroid_lat) = projection.to_geographic(centroid);
    let scale = projection.scale_factor(centroid_lat);
    let forward_spacing = parameters.forward_spacing * scale;
    let side_spacing = parameters.side_spacing * scale;

    let zones = no_fly_zones
        .iter()
        .map(|zone| {
            let planar = project_polygon(zone, projection)?;
            validate_polygon(&planar)?;
            Ok(planar)
        })
        .collect::<Result<Vec<_>>>()?;

    // Grid and path in the rotated frame
    let gridding_aoi = rotate_polygon(&planar_aoi, centroid, -options.rotation_angle_deg);
    let grid = generate_grid(&gridding_aoi, forward_spacing, side_spacing)?;
    let dense = options.generate_dense || options.simplifies_terrain();
    let path: Vec<Waypoint> = build_path(&grid, forward_spacing, dense, options.generate_3d)?
        .into_iter()
        .map(|wp| Waypoint {
            position: rotate_about(wp.position, centroid, options.rotation_angle_deg),
            ..wp
        })
        .collect();

    let mut path = no_fly::exclude(path, &zones);
    if path.is_empty() {
        return Err(PlanError::EmptyPlan(
            "every waypoint falls inside a no-fly zone".to_string(),
        ));
    }

    if options.include_home_point {
        let home = Waypoint::new(centroid, 0.0, false, GIMBAL_NADIR);
        path.insert(0, home.clone());
        path.push(home);
    }

    let geographic: Vec<(f64, f64)> = path
        .iter()
        .map(|wp| projection.to_geographic(wp.position))
        .collect();

    let elevations = match elevation {
        Some(source) => Some(source.sample_points(&geographic)?),
        None => None,
    };

    let retained: Vec<usize> = match &elevations {
        Some(elevations) if options.simplifies_terrain() => {
            let points: Vec<TerrainPoint> = path
                .iter()
                .zip(elevations)
                .enumerate()
                .map(|(index, (wp, &elevation))| TerrainPoint {
                    index,
                    position: wp.position,
                    elevation,
                })
                .collect();
            let headings: Vec<f64> = path.iter().map(|wp| wp.heading).collect();
            simplify_path(&points, &headings, &wayline)?
        }
        _ => (0..path.len()).collect(),
    };

    let mut waypoints: Vec<PlannedWaypoint> = retained
        .iter()
        .map(|&i| {
            let wp = &path[i];
            let (lon, lat) = geographic[i];
            PlannedWaypoint {
                index: 0,
                lon,
                lat,
                heading: wp.heading,
                take_photo: wp.take_photo && options.generate_dense,
                gimbal_angle: wp.gimbal_angle.clone(),
                elevation: elevations.as_ref().map(|e| e[i]),
                altitude: None,
                speed: None,
                extra: Default::default(),
            }
        })
        .collect();

    if options.terrain_follow {
        waypoints = apply_terrain_altitude(
            waypoints,
            parameters.altitude_above_ground_level,
            parameters.ground_speed,
        );
    }

    for (index, wp) in waypoints.iter_mut().enumerate() {
        wp.index = index;
    }

    let stats = PlanStats::from_waypoints(&waypoints);
    tracing::info!(
        waypoints = stats.waypoint_count,
        photos = stats.photo_count,
        legs = stats.leg_count,
        distance_m = stats.total_distance_m,
        agl = parameters.altitude_above_ground_level,
        terrain_follow = options.terrain_follow,
        "flight plan created"
    );

    Ok(FlightPlan {
        parameters,
        waypoints,
        stats,
    })
}
