//! Survey flight planning: capture grids, boustrophedon paths and
//! terrain-following wayline simplification.

pub mod error;
pub mod features;
pub mod grid;
pub mod models;
pub mod no_fly;
pub mod parameters;
pub mod path;
pub mod placemark;
pub mod plan;
pub mod projection;
pub mod sensor;
pub mod terrain;
pub mod wayline;

pub use error::{PlanError, RasterError, Result};
pub use features::{
    aoi_from_geojson, legs_from_features, polygons_from_geojson, waypoints_from_geojson,
    waypoints_to_feature_collection,
};
pub use grid::generate_grid;
pub use models::{split_legs, Leg, PlannedWaypoint, TerrainPoint, Waypoint};
pub use parameters::{calculate_parameters, Altitude, FlightParameters};
pub use path::build_path;
pub use placemark::apply_terrain_altitude;
pub use plan::{create_plan, create_plan_with_projection, FlightPlan, PlanOptions, PlanStats};
pub use projection::{Projection, WebMercator};
pub use sensor::SensorProfile;
pub use terrain::{attach_elevation, ElevationSource};
pub use wayline::{
    simplify_leg, simplify_legs, simplify_path, simplify_waypoints, DeviationPolicy, KeeperSet,
    WaylineConfig,
};
