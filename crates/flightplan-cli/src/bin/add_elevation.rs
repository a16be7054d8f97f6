//! Sample a DEM under every waypoint of a GeoJSON point layer.

use anyhow::{Context, Result};
use clap::Parser;
use flightplan_cli::{init_tracing, read_geojson, report, write_geojson};
use flightplan_core::{
    attach_elevation, waypoints_from_geojson, waypoints_to_feature_collection, PlannedWaypoint,
};
use flightplan_terrain::load_geotiff;
use geojson::GeoJson;
use std::path::PathBuf;
use std::process::ExitCode;

/// Add DEM elevation to each waypoint as z and an `elevation` property
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// DEM GeoTIFF
    #[arg(long, visible_alias = "inraster")]
    dem: PathBuf,

    /// Waypoint GeoJSON
    #[arg(long, visible_alias = "infile")]
    waypoints: PathBuf,

    /// Output GeoJSON
    #[arg(long)]
    outfile: PathBuf,

    /// Log as JSON lines
    #[arg(long)]
    log_json: bool,
}

fn run(args: Args) -> Result<()> {
    let dem = load_geotiff(&args.dem)
        .with_context(|| format!("failed to load DEM {}", args.dem.display()))?;
    let waypoints = waypoints_from_geojson(&read_geojson(&args.waypoints)?)
        .with_context(|| format!("invalid waypoints in {}", args.waypoints.display()))?;

    // elevation wins over any stale altitude as the third coordinate
    let waypoints: Vec<PlannedWaypoint> = attach_elevation(waypoints, &dem)?
        .into_iter()
        .map(|wp| PlannedWaypoint {
            altitude: None,
            ..wp
        })
        .collect();
    tracing::info!(waypoints = waypoints.len(), "added elevation");

    write_geojson(
        &args.outfile,
        &GeoJson::FeatureCollection(waypoints_to_feature_collection(&waypoints)),
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
