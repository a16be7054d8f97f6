//! Generate a survey waypoint plan over an area of interest.

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser};
use flightplan_cli::{init_tracing, load_sensor_profile, read_geojson, report, write_geojson};
use flightplan_core::{
    aoi_from_geojson, create_plan, polygons_from_geojson, Altitude, DeviationPolicy,
    ElevationSource, PlanOptions,
};
use flightplan_terrain::load_geotiff;
use geojson::GeoJson;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(ClapArgs, Debug)]
#[group(required = true, multiple = false)]
struct AltitudeArgs {
    /// Flight altitude above ground level, meters
    #[arg(long = "altitude-above-ground-level", visible_alias = "agl")]
    agl: Option<f64>,

    /// Ground sample distance, cm/px
    #[arg(long)]
    gsd: Option<f64>,
}

/// Generate waypoints for a drone survey mission
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// GeoJSON polygon of the area of interest
    #[arg(long, visible_alias = "project-geojson")]
    aoi: PathBuf,

    #[command(flatten)]
    altitude: AltitudeArgs,

    /// Forward overlap, percent
    #[arg(long, default_value_t = 70.0)]
    forward_overlap: f64,

    /// Side overlap, percent
    #[arg(long, default_value_t = 70.0)]
    side_overlap: f64,

    /// Seconds between photos; defaults to the sensor profile
    #[arg(long)]
    image_interval: Option<f64>,

    /// Grid rotation, degrees counter-clockwise
    #[arg(long, default_value_t = 0.0)]
    rotation_angle: f64,

    /// Emit every capture point instead of waylines
    #[arg(long, visible_alias = "generate-each-points")]
    generate_dense: bool,

    /// Add oblique passes for 3D imagery
    #[arg(long)]
    generate_3d: bool,

    /// GeoJSON polygons the drone must not enter
    #[arg(long)]
    no_fly_zones: Option<PathBuf>,

    /// DEM GeoTIFF; enables terrain following
    #[arg(long, visible_alias = "inraster")]
    dem: Option<PathBuf>,

    /// Allowed AGL deviation for terrain waylines, meters
    #[arg(long, default_value_t = 5.0)]
    threshold: f64,

    /// Inject waypoints for terrain dips as well as rises
    #[arg(long)]
    symmetric: bool,

    /// Fail if a leg needs more refinement passes than this
    #[arg(long)]
    max_passes: Option<usize>,

    /// Do not start and finish at the AOI centroid
    #[arg(long)]
    no_home_point: bool,

    /// Sensor profile JSON
    #[arg(long)]
    sensor_profile: Option<PathBuf>,

    /// Output waypoint GeoJSON
    #[arg(long)]
    outfile: PathBuf,

    /// Log as JSON lines
    #[arg(long)]
    log_json: bool,
}

impl Args {
    fn plan_options(&self) -> Result<PlanOptions> {
        Ok(PlanOptions {
            altitude: Altitude::from_options(self.altitude.agl, self.altitude.gsd)?,
            forward_overlap: self.forward_overlap,
            side_overlap: self.side_overlap,
            image_interval_s: self.image_interval,
            rotation_angle_deg: self.rotation_angle,
            generate_dense: self.generate_dense,
            generate_3d: self.generate_3d,
            terrain_follow: self.dem.is_some(),
            agl_deviation_threshold_m: self.threshold,
            deviation_policy: if self.symmetric {
                DeviationPolicy::Symmetric
            } else {
                DeviationPolicy::UpwardOnly
            },
            max_simplify_passes: self.max_passes,
            include_home_point: !self.no_home_point,
        })
    }
}

fn run(args: Args) -> Result<()> {
    let options = args.plan_options()?;
    let sensor = load_sensor_profile(args.sensor_profile.as_deref())?;

    let aoi = aoi_from_geojson(&read_geojson(&args.aoi)?)
        .with_context(|| format!("invalid area of interest in {}", args.aoi.display()))?;
    let no_fly = match &args.no_fly_zones {
        Some(path) => polygons_from_geojson(&read_geojson(path)?)
            .with_context(|| format!("invalid no-fly zones in {}", path.display()))?,
        None => Vec::new(),
    };
    let dem = match &args.dem {
        Some(path) => Some(
            load_geotiff(path).with_context(|| format!("failed to load DEM {}", path.display()))?,
        ),
        None => None,
    };

    let plan = create_plan(
        &aoi,
        &no_fly,
        &options,
        &sensor,
        dem.as_ref().map(|d| d as &dyn ElevationSource),
    )?;

    let rounded = plan.parameters.rounded();
    tracing::info!(
        agl = rounded.altitude_above_ground_level,
        forward_spacing = rounded.forward_spacing,
        side_spacing = rounded.side_spacing,
        ground_speed = rounded.ground_speed,
        "flight parameters"
    );

    write_geojson(&args.outfile, &GeoJson::FeatureCollection(plan.to_feature_collection()))
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(err) = init_tracing(args.log_json) {
        eprintln!("failed to initialise logging: {err:#}");
        return ExitCode::FAILURE;
    }
    report(run(args))
}
