//! Flight planning CLI - shared plumbing for the command line tools.
//!
//! This crate provides the binaries:
//! - create_flightplan: AOI polygon to waypoint plan
//! - add_elevation: sample a DEM under each waypoint
//! - terrain_waylines: simplify a terrain-following waypoint plan

pub mod io;
pub mod logging;
pub mod profile;

pub use io::{read_geojson, write_geojson};
pub use logging::init_tracing;
pub use profile::load_sensor_profile;

use flightplan_core::PlanError;
use std::process::ExitCode;

/// Exit status for a valid request that produced no coverage.
pub const EXIT_EMPTY_PLAN: u8 = 2;

/// True if the error chain carries an empty-plan outcome.
pub fn is_empty_plan(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<PlanError>())
        .any(PlanError::is_empty_plan)
}

/// Map a binary's result to its process exit status, logging failures.
pub fn report(result: anyhow::Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) if is_empty_plan(&err) => {
            tracing::warn!("{err:#}; try a smaller spacing or a larger area");
            ExitCode::from(EXIT_EMPTY_PLAN)
        }
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
