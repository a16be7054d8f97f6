//! In-memory elevation grid with a north-up geotransform.

use flightplan_core::{ElevationSource, RasterError};

/// Affine mapping from pixel to geographic coordinates, without rotation terms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    /// Longitude of the top-left corner of the top-left pixel.
    pub origin_x: f64,
    /// Pixel width in degrees.
    pub pixel_width: f64,
    /// Latitude of the top-left corner of the top-left pixel.
    pub origin_y: f64,
    /// Pixel height in degrees, positive for north-up rasters.
    pub pixel_height: f64,
}

impl GeoTransform {
    /// Pixel `(col, row)` containing the point, or `None` outside the grid.
    pub fn pixel_of(&self, lon: f64, lat: f64, width: usize, height: usize) -> Option<(usize, usize)> {
        let col = ((lon - self.origin_x) / self.pixel_width).floor();
        let row = ((self.origin_y - lat) / self.pixel_height).floor();
        if !col.is_finite() || !row.is_finite() || col < 0.0 || row < 0.0 {
            return None;
        }
        let (col, row) = (col as usize, row as usize);
        (col < width && row < height).then_some((col, row))
    }
}

/// One band of elevations, row-major from the north-west corner.
#[derive(Debug, Clone)]
pub struct DemRaster {
    width: usize,
    height: usize,
    transform: GeoTransform,
    values: Vec<f64>,
}

impl DemRaster {
    pub fn from_parts(
        width: usize,
        height: usize,
        transform: GeoTransform,
        values: Vec<f64>,
    ) -> Result<Self, RasterError> {
        if width == 0 || height == 0 || values.len() != width * height {
            return Err(RasterError::Decode(format!(
                "{} values do not fill a {width} x {height} grid",
                values.len()
            )));
        }
        if !(transform.pixel_width > 0.0 && transform.pixel_height > 0.0) {
            return Err(RasterError::UnsupportedRasterFormat(format!(
                "pixel size must be positive, got {} x {}",
                transform.pixel_width, transform.pixel_height
            )));
        }
        Ok(Self {
            width,
            height,
            transform,
            values,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn transform(&self) -> GeoTransform {
        self.transform
    }

    /// Geographic extent as `(min_lon, min_lat, max_lon, max_lat)`.
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        let t = &self.transform;
        (
            t.origin_x,
            t.origin_y - self.height as f64 * t.pixel_height,
            t.origin_x + self.width as f64 * t.pixel_width,
            t.origin_y,
        )
    }

    /// Elevation of the pixel containing `(lon, lat)`.
    pub fn sample(&self, lon: f64, lat: f64) -> Result<f64, RasterError> {
        let (col, row) = self
            .transform
            .pixel_of(lon, lat, self.width, self.height)
            .ok_or(RasterError::OutOfRasterBounds { lon, lat })?;
        Ok(self.values[row * self.width + col])
    }
}

impl ElevationSource for DemRaster {
    fn sample_elevation(&self, lon: f64, lat: f64) -> Result<f64, RasterError> {
        self.sample(lon, lat)
    }
}
