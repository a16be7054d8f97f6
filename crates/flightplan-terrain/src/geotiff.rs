//! Single-band GeoTIFF decoding.
//!
//! Georeferencing comes from `ModelTiepointTag` (33922) and
//! `ModelPixelScaleTag` (33550). The raster CRS is taken to be EPSG:4326.

use crate::raster::{DemRaster, GeoTransform};
use flightplan_core::RasterError;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;
use tiff::ColorType;

pub const MODEL_PIXEL_SCALE_TAG: u16 = 33550;
pub const MODEL_TIEPOINT_TAG: u16 = 33922;

fn decode_err(e: tiff::TiffError) -> RasterError {
    match e {
        tiff::TiffError::IoError(io) => RasterError::Io(io),
        tiff::TiffError::UnsupportedError(u) => RasterError::UnsupportedRasterFormat(u.to_string()),
        other => RasterError::Decode(other.to_string()),
    }
}

fn geotag<R: Read + Seek>(decoder: &mut Decoder<R>, code: u16, name: &str) -> Result<Vec<f64>, RasterError> {
    decoder
        .find_tag(Tag::from_u16_exhaustive(code))
        .map_err(decode_err)?
        .ok_or_else(|| RasterError::UnsupportedRasterFormat(format!("missing {name}")))?
        .into_f64_vec()
        .map_err(decode_err)
}

/// Derive the geotransform from the first tiepoint and the pixel scale.
fn transform_from_tags(tiepoint: &[f64], scale: &[f64]) -> Result<GeoTransform, RasterError> {
    let (&[i, j, _, x, y, _, ..], &[sx, sy, ..]) = (tiepoint, scale) else {
        return Err(RasterError::UnsupportedRasterFormat(format!(
            "malformed geotags: {} tiepoint values, {} scale values",
            tiepoint.len(),
            scale.len()
        )));
    };
    if tiepoint.len() > 6 {
        tracing::warn!(
            tiepoints = tiepoint.len() / 6,
            "raster has several tiepoints; using the first"
        );
    }
    Ok(GeoTransform {
        origin_x: x - i * sx,
        pixel_width: sx,
        origin_y: y + j * sy,
        pixel_height: sy,
    })
}

/// Decode a GeoTIFF elevation raster from any seekable reader.
pub fn read_geotiff<R: Read + Seek>(reader: R) -> Result<DemRaster, RasterError> {
    let mut decoder = Decoder::new(reader).map_err(decode_err)?;

    match decoder.colortype().map_err(decode_err)? {
        ColorType::Gray(_) => {}
        other => {
            return Err(RasterError::UnsupportedRasterFormat(format!(
                "expected a single-band elevation raster, found {other:?}"
            )))
        }
    }

    let (width, height) = decoder.dimensions().map_err(decode_err)?;
    let scale = geotag(&mut decoder, MODEL_PIXEL_SCALE_TAG, "ModelPixelScaleTag")?;
    let tiepoint = geotag(&mut decoder, MODEL_TIEPOINT_TAG, "ModelTiepointTag")?;
    let transform = transform_from_tags(&tiepoint, &scale)?;

    let values: Vec<f64> = match decoder.read_image().map_err(decode_err)? {
        DecodingResult::U8(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::U16(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::U32(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::U64(data) => data.into_iter().map(|v| v as f64).collect(),
        DecodingResult::I8(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::I16(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::I32(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::I64(data) => data.into_iter().map(|v| v as f64).collect(),
        DecodingResult::F32(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::F64(data) => data,
    };

    let raster = DemRaster::from_parts(width as usize, height as usize, transform, values)?;
    tracing::debug!(
        width,
        height,
        origin_x = transform.origin_x,
        origin_y = transform.origin_y,
        "decoded elevation raster"
    );
    Ok(raster)
}

/// Open and decode a GeoTIFF file.
pub fn load_geotiff(path: &Path) -> Result<DemRaster, RasterError> {
    let file = File::open(path)?;
    let raster = read_geotiff(BufReader::new(file))?;
    tracing::info!(
        path = %path.display(),
        width = raster.width(),
        height = raster.height(),
        "loaded DEM"
    );
    Ok(raster)
}
