//! Digital elevation model sampling.
//!
//! Loads single-band GeoTIFF rasters in geographic coordinates and answers
//! nearest-pixel elevation queries through [`flightplan_core::ElevationSource`].

pub mod geotiff;
pub mod raster;

pub use geotiff::{load_geotiff, read_geotiff, MODEL_PIXEL_SCALE_TAG, MODEL_TIEPOINT_TAG};
pub use raster::{DemRaster, GeoTransform};
