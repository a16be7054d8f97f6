//! Reduce a terrain-following waypoint mission to a wayline mission.
//!
//! Removes as many waypoints as possible while keeping the AGL deviation
//! between consecutive kept waypoints within the threshold.

use anyhow::{Context, Result};
use clap::Parser;
use flightplan_cli::{init_tracing, read_geojson, report, write_geojson};
use flightplan_core::{
    simplify_waypoints, waypoints_from_geojson, waypoints_to_feature_collection,
    DeviationPolicy, WaylineConfig, WebMercator,
};
use geojson::GeoJson;
use std::path::PathBuf;
use std::process::ExitCode;

/// Convert terrain-following waypoints into terrain-following waylines
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Waypoint GeoJSON with elevation on every point
    #[arg(long, visible_alias = "infile")]
    waypoints: PathBuf,

    /// Output GeoJSON
    #[arg(long)]
    outfile: PathBuf,

    /// Allowable altitude deviation, meters
    #[arg(long, default_value_t = 5.0)]
    threshold: f64,

    /// Inject waypoints for terrain dips as well as rises
    #[arg(long)]
    symmetric: bool,

    /// Fail if a leg needs more refinement passes than this
    #[arg(long)]
    max_passes: Option<usize>,

    /// Log as JSON lines
    #[arg(long)]
    log_json: bool,
}

fn run(args: Args) -> Result<()> {
    let config = WaylineConfig {
        threshold_m: args.threshold,
        policy: if args.symmetric {
            DeviationPolicy::Symmetric
        } else {
            DeviationPolicy::UpwardOnly
        },
        max_passes: args.max_passes,
    };
    let waypoints = waypoints_from_geojson(&read_geojson(&args.waypoints)?)
        .with_context(|| format!("invalid waypoints in {}", args.waypoints.display()))?;
    let dense = waypoints.len();

    let waylines = simplify_waypoints(&waypoints, &WebMercator, &config)?;
    tracing::info!(dense, kept = waylines.len(), "wrote terrain waylines");

    write_geojson(
        &args.outfile,
        &GeoJson::FeatureCollection(waypoints_to_feature_collection(&waylines)),
    )
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(err) = init_tracing(args.log_json) {
        eprintln!("failed to initialise logging: {err:#}");
        return ExitCode::FAILURE;
    }
    report(run(args))
}
