//! Photo footprint, overlap and spacing math.

use crate::error::{PlanError, Result};
use crate::sensor::SensorProfile;
use serde::{Deserialize, Serialize};

/// Flight altitude, given directly or through a ground sample distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Altitude {
    /// Altitude above ground level, meters.
    Agl(f64),
    /// Ground sample distance, cm/px.
    Gsd(f64),
}

impl Altitude {
    /// Build from the two mutually exclusive optional inputs.
    pub fn from_options(agl: Option<f64>, gsd: Option<f64>) -> Result<Self> {
        match (agl, gsd) {
            (Some(agl), None) => Ok(Self::Agl(agl)),
            (None, Some(gsd)) => Ok(Self::Gsd(gsd)),
            (Some(_), Some(_)) => Err(PlanError::validation(
                "altitude_above_ground_level and ground_sample_distance are mutually exclusive",
            )),
            (None, None) => Err(PlanError::validation(
                "one of altitude_above_ground_level or ground_sample_distance is required",
            )),
        }
    }

    /// Resolve to AGL meters.
    pub fn resolve(self, sensor: &SensorProfile) -> Result<f64> {
        let (value, name) = match self {
            Self::Agl(agl) => (agl, "altitude_above_ground_level"),
            Self::Gsd(gsd) => (gsd, "ground_sample_distance"),
        };
        if !value.is_finite() || value <= 0.0 {
            return Err(PlanError::validation(format!(
                "{name} must be a positive number, got {value}"
            )));
        }
        Ok(match self {
            Self::Agl(agl) => agl,
            Self::Gsd(gsd) => gsd * sensor.gsd_to_agl,
        })
    }
}

/// Values derived from altitude and overlap.
///
/// Spacings are in ground meters; `ground_speed` is meters per second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlightParameters {
    pub altitude_above_ground_level: f64,
    pub forward_photo_height: f64,
    pub side_photo_width: f64,
    pub forward_overlap_distance: f64,
    pub side_overlap_distance: f64,
    pub forward_spacing: f64,
    pub side_spacing: f64,
    pub ground_speed: f64,
}

impl FlightParameters {
    /// Copy rounded to reporting precision: footprint to whole meters, the rest to centimeters.
    pub fn rounded(&self) -> Self {
        Self {
            altitude_above_ground_level: round_to(self.altitude_above_ground_level, 2),
            forward_photo_height: round_to(self.forward_photo_height, 0),
            side_photo_width: round_to(self.side_photo_width, 0),
            forward_overlap_distance: round_to(self.forward_overlap_distance, 2),
            side_overlap_distance: round_to(self.side_overlap_distance, 2),
            forward_spacing: round_to(self.forward_spacing, 2),
            side_spacing: round_to(self.side_spacing, 2),
            ground_speed: round_to(self.ground_speed, 2),
        }
    }
}

/// Derive photo footprint, overlap distances, line spacing and ground speed.
///
/// `image_interval_s` overrides the sensor profile's interval when given.
pub fn calculate_parameters(
    altitude: Altitude,
    forward_overlap: f64,
    side_overlap: f64,
    image_interval_s: Option<f64>,
    sensor: &SensorProfile,
) -> Result<FlightParameters> {
    validate_overlap("forward_overlap", forward_overlap)?;
    validate_overlap("side_overlap", side_overlap)?;
    let interval = image_interval_s.unwrap_or(sensor.image_interval_s);
    if !interval.is_finite() || interval <= 0.0 {
        return Err(PlanError::validation(format!(
            "image interval must be positive, got {interval}"
        )));
    }
    let agl = altitude.resolve(sensor)?;

    let forward_photo_height = agl * sensor.vertical_fov;
    let side_photo_width = agl * sensor.horizontal_fov;
    let forward_overlap_distance = forward_photo_height * forward_overlap / 100.0;
    let side_overlap_distance = side_photo_width * side_overlap / 100.0;
    let forward_spacing = forward_photo_height - forward_overlap_distance;
    let side_spacing = side_photo_width - side_overlap_distance;

    if forward_spacing <= 0.0 || side_spacing <= 0.0 {
        return Err(PlanError::validation(format!(
            "sensor profile yields non-positive spacing ({forward_spacing}, {side_spacing})"
        )));
    }

    Ok(FlightParameters {
        altitude_above_ground_level: agl,
        forward_photo_height,
        side_photo_width,
        forward_overlap_distance,
        side_overlap_distance,
        forward_spacing,
        side_spacing,
        ground_speed: forward_spacing / interval,
    })
}

fn validate_overlap(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || !(0.0..100.0).contains(&value) {
        return Err(PlanError::validation(format!(
            "{name} must be in [0, 100), got {value}"
        )));
    }
    Ok(())
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn params(agl: f64, forward: f64, side: f64) -> Result<FlightParameters> {
        calculate_parameters(
            Altitude::Agl(agl),
            forward,
            side,
            None,
            &SensorProfile::default(),
        )
    }

    #[test]
    fn reference_values_at_115m() {
        let p = params(115.0, 75.0, 75.0).unwrap();
        assert!((p.forward_photo_height - 81.65).abs() < 1e-9);
        assert!((p.side_photo_width - 144.9).abs() < 1e-9);
        assert!((p.forward_spacing - 20.4125).abs() < 1e-9);
        assert!((p.side_spacing - 36.225).abs() < 1e-9);
        assert!((p.ground_speed - 10.20625).abs() < 1e-9);

        let r = p.rounded();
        assert_eq!(r.forward_photo_height, 82.0);
        assert_eq!(r.side_photo_width, 145.0);
        assert_eq!(r.forward_spacing, 20.41);
    }

    #[test]
    fn gsd_is_converted_to_agl() {
        let sensor = SensorProfile::default();
        let p = calculate_parameters(Altitude::Gsd(3.0), 70.0, 70.0, None, &sensor).unwrap();
        assert!((p.altitude_above_ground_level - 89.1).abs() < 1e-9);
    }

    #[test]
    fn agl_and_gsd_are_mutually_exclusive() {
        assert!(matches!(
            Altitude::from_options(Some(100.0), Some(2.0)),
            Err(PlanError::Validation(_))
        ));
        assert!(matches!(
            Altitude::from_options(None, None),
            Err(PlanError::Validation(_))
        ));
        assert_eq!(
            Altitude::from_options(None, Some(2.0)).unwrap(),
            Altitude::Gsd(2.0)
        );
    }

    #[test]
    fn overlap_outside_range_is_rejected() {
        assert!(params(100.0, 100.0, 50.0).is_err());
        assert!(params(100.0, 50.0, -1.0).is_err());
        assert!(params(100.0, f64::NAN, 50.0).is_err());
        assert!(params(100.0, 0.0, 0.0).is_ok());
    }

    #[test]
    fn non_positive_altitude_is_rejected() {
        assert!(params(0.0, 70.0, 70.0).is_err());
        assert!(params(-10.0, 70.0, 70.0).is_err());
    }

    #[test]
    fn image_interval_override() {
        let p = calculate_parameters(
            Altitude::Agl(100.0),
            70.0,
            70.0,
            Some(4.0),
            &SensorProfile::default(),
        )
        .unwrap();
        assert!((p.ground_speed - p.forward_spacing / 4.0).abs() < 1e-12);
        assert!(calculate_parameters(
            Altitude::Agl(100.0),
            70.0,
            70.0,
            Some(0.0),
            &SensorProfile::default()
        )
        .is_err());
    }

    proptest! {
        #[test]
        fn spacings_positive_and_speed_is_half_spacing(
            agl in 1.0_f64..500.0,
            forward in 0.0_f64..99.9,
            side in 0.0_f64..99.9,
        ) {
            let p = params(agl, forward, side).unwrap();
            prop_assert!(p.forward_spacing > 0.0);
            prop_assert!(p.side_spacing > 0.0);
            prop_assert!((p.ground_speed - p.forward_spacing / 2.0).abs() < 1e-9);
            let expected = p.forward_photo_height * (1.0 - forward / 100.0);
            prop_assert!((p.forward_spacing - expected).abs() < 1e-9);
        }
    }
}
