//! GeoTIFF decoding against files written with the `tiff` encoder.
//!
//! Run with: cargo test -p flightplan-terrain --test geotiff_test

use flightplan_core::{ElevationSource, RasterError};
use flightplan_terrain::{load_geotiff, MODEL_PIXEL_SCALE_TAG, MODEL_TIEPOINT_TAG};
use std::fs::File;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tiff::encoder::{colortype, TiffEncoder};
use tiff::tags::Tag;

const WIDTH: u32 = 4;
const HEIGHT: u32 = 3;

fn write_dem(dir: &Path, name: &str, with_geotags: bool) -> PathBuf {
    let path = dir.join(name);
    let file = File::create(&path).unwrap();
    let mut encoder = TiffEncoder::new(file).unwrap();
    let mut image = encoder
        .new_image::<colortype::Gray32Float>(WIDTH, HEIGHT)
        .unwrap();
    if with_geotags {
        image
            .encoder()
            .write_tag(
                Tag::from_u16_exhaustive(MODEL_PIXEL_SCALE_TAG),
                &[0.01_f64, 0.01, 0.0][..],
            )
            .unwrap();
        image
            .encoder()
            .write_tag(
                Tag::from_u16_exhaustive(MODEL_TIEPOINT_TAG),
                &[0.0_f64, 0.0, 0.0, 85.30, 27.72, 0.0][..],
            )
            .unwrap();
    }
    let data: Vec<f32> = (0..WIDTH * HEIGHT).map(|v| 1300.0 + v as f32 * 2.5).collect();
    image.write_data(&data).unwrap();
    path
}

#[test]
fn test_decodes_float_dem_with_geotags() {
    let dir = TempDir::new().unwrap();
    let path = write_dem(dir.path(), "dem.tif", true);

    let dem = load_geotiff(&path).unwrap();
    assert_eq!(dem.width(), 4);
    assert_eq!(dem.height(), 3);

    let t = dem.transform();
    assert!((t.origin_x - 85.30).abs() < 1e-12);
    assert!((t.origin_y - 27.72).abs() < 1e-12);

    // pixel (col 1, row 2) = index 9
    let elevation = dem.sample_elevation(85.315, 27.695).unwrap();
    assert!((elevation - (1300.0 + 9.0 * 2.5)).abs() < 1e-6);
}

#[test]
fn test_query_outside_extent_fails() {
    let dir = TempDir::new().unwrap();
    let dem = load_geotiff(&write_dem(dir.path(), "dem.tif", true)).unwrap();
    assert!(matches!(
        dem.sample_elevation(85.5, 27.70),
        Err(RasterError::OutOfRasterBounds { .. })
    ));
}

#[test]
fn test_missing_geotags_are_unsupported() {
    let dir = TempDir::new().unwrap();
    let path = write_dem(dir.path(), "plain.tif", false);
    assert!(matches!(
        load_geotiff(&path),
        Err(RasterError::UnsupportedRasterFormat(_))
    ));
}

#[test]
fn test_rgb_raster_is_unsupported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rgb.tif");
    let mut encoder = TiffEncoder::new(File::create(&path).unwrap()).unwrap();
    encoder
        .write_image::<colortype::RGB8>(2, 2, &[0u8; 12])
        .unwrap();

    assert!(matches!(
        load_geotiff(&path),
        Err(RasterError::UnsupportedRasterFormat(_))
    ));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        load_geotiff(&dir.path().join("absent.tif")),
        Err(RasterError::Io(_))
    ));
}
