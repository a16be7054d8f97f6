//! Conversion between geographic coordinates and the planar (metric) frame.
//!
//! All spacing, distance and slope math happens in the planar frame.

use crate::error::{PlanError, Result};
use geo::{Coord, MapCoords, Polygon};

/// Sphere radius of EPSG:3857, meters.
pub const WEB_MERCATOR_RADIUS_M: f64 = 6_378_137.0;
/// Latitude at which Web Mercator becomes square, degrees.
pub const WEB_MERCATOR_MAX_LAT: f64 = 85.051_128_78;
/// Mean earth radius used for great-circle distances.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A conformal projection with an exact inverse.
pub trait Projection: Send + Sync {
    /// Project `(lon, lat)` in degrees to planar meters.
    fn to_planar(&self, lon: f64, lat: f64) -> Result<Coord<f64>>;

    /// Inverse of [`Projection::to_planar`], returns `(lon, lat)` in degrees.
    fn to_geographic(&self, point: Coord<f64>) -> (f64, f64);

    /// Planar units per ground meter at the given latitude.
    fn scale_factor(&self, lat: f64) -> f64;
}

/// Spherical Web Mercator (EPSG:3857).
#[derive(Debug, Clone, Copy, Default)]
pub struct WebMercator;

impl Projection for WebMercator {
    fn to_planar(&self, lon: f64, lat: f64) -> Result<Coord<f64>> {
        validate_geographic(lon, lat)?;
        if lat.abs() > WEB_MERCATOR_MAX_LAT {
            return Err(PlanError::validation(format!(
                "latitude {lat} is outside the Web Mercator domain (±{WEB_MERCATOR_MAX_LAT})"
            )));
        }
        let x = WEB_MERCATOR_RADIUS_M * lon.to_radians();
        let y = WEB_MERCATOR_RADIUS_M
            * (std::f64::consts::FRAC_PI_4 + lat.to_radians() / 2.0)
                .tan()
                .ln();
        Ok(Coord { x, y })
    }

    fn to_geographic(&self, point: Coord<f64>) -> (f64, f64) {
        let lon = (point.x / WEB_MERCATOR_RADIUS_M).to_degrees();
        let lat = (2.0 * (point.y / WEB_MERCATOR_RADIUS_M).exp().atan()
            - std::f64::consts::FRAC_PI_2)
            .to_degrees();
        (lon, lat)
    }

    fn scale_factor(&self, lat: f64) -> f64 {
        1.0 / lat.to_radians().cos().max(1e-9)
    }
}

/// Reject coordinates outside `[-180,180] x [-90,90]` or non-finite.
pub fn validate_geographic(lon: f64, lat: f64) -> Result<()> {
    if !lon.is_finite() || !lat.is_finite() {
        return Err(PlanError::validation(format!(
            "non-finite coordinate ({lon}, {lat})"
        )));
    }
    if !(-180.0..=180.0).contains(&lon) || !(-90.0..=90.0).contains(&lat) {
        return Err(PlanError::validation(format!(
            "coordinate ({lon}, {lat}) is outside [-180,180] x [-90,90]"
        )));
    }
    Ok(())
}

/// Euclidean distance in the planar frame.
pub fn planar_distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    (b.x - a.x).hypot(b.y - a.y)
}

/// Rotate `point` counter-clockwise by `angle_deg` about `center`.
pub fn rotate_about(point: Coord<f64>, center: Coord<f64>, angle_deg: f64) -> Coord<f64> {
    if angle_deg == 0.0 {
        return point;
    }
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    let dx = point.x - center.x;
    let dy = point.y - center.y;
    Coord {
        x: center.x + dx * cos - dy * sin,
        y: center.y + dx * sin + dy * cos,
    }
}

/// Project every ring of a geographic polygon into the planar frame.
pub fn project_polygon(polygon: &Polygon<f64>, projection: &dyn Projection) -> Result<Polygon<f64>> {
    polygon.try_map_coords(|c| projection.to_planar(c.x, c.y))
}

/// Rotate every ring of a planar polygon about `center`.
pub fn rotate_polygon(polygon: &Polygon<f64>, center: Coord<f64>, angle_deg: f64) -> Polygon<f64> {
    polygon.map_coords(|c| rotate_about(c, center, angle_deg))
}

/// Great-circle distance in meters between two `(lon, lat)` points.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}
