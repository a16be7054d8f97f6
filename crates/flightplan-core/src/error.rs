//! Error taxonomy for flight plan generation.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlanError>;

/// Errors raised while building a flight plan.
///
/// Every error is returned from the call that detects it; nothing in the core
/// retries or emits partial output.
#[derive(Debug, Error)]
pub enum PlanError {
    /// Malformed or contradictory input parameters.
    #[error("validation error: {0}")]
    Validation(String),

    /// Degenerate AOI or no-fly polygon.
    #[error("geometry error: {0}")]
    Geometry(String),

    /// Valid input, but no capture point fell inside the AOI at this spacing.
    #[error("empty plan: {0}")]
    EmptyPlan(String),

    /// Elevation sampling failed.
    #[error(transparent)]
    Raster(#[from] RasterError),

    /// The wayline simplifier hit its configured pass limit before reaching a fixed point.
    #[error("leg starting at waypoint {first_index} did not converge within {max_passes} passes")]
    NotConverged { first_index: usize, max_passes: usize },
}

impl PlanError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn geometry(msg: impl Into<String>) -> Self {
        Self::Geometry(msg.into())
    }

    /// True for the non-fatal "no coverage at this spacing" outcome.
    pub fn is_empty_plan(&self) -> bool {
        matches!(self, Self::EmptyPlan(_))
    }
}

/// Failures of the DEM sampling collaborator.
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("point ({lon:.7}, {lat:.7}) falls outside the raster extent")]
    OutOfRasterBounds { lon: f64, lat: f64 },

    #[error("unsupported raster format: {0}")]
    UnsupportedRasterFormat(String),

    #[error("failed to read raster: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode raster: {0}")]
    Decode(String),
}
