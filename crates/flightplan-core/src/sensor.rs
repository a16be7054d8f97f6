//! Camera/sensor profile used to derive photo footprints.

use serde::{Deserialize, Serialize};
use std::env;

/// Sensor-specific constants for the flight parameter calculator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SensorProfile {
    /// Ground footprint along track per meter of altitude.
    pub vertical_fov: f64,
    /// Ground footprint across track per meter of altitude.
    pub horizontal_fov: f64,
    /// Seconds between consecutive exposures.
    pub image_interval_s: f64,
    /// Multiplier turning a ground sample distance (cm/px) into AGL meters.
    pub gsd_to_agl: f64,
}

impl Default for SensorProfile {
    fn default() -> Self {
        Self {
            vertical_fov: 0.71,
            horizontal_fov: 1.26,
            image_interval_s: 2.0,
            gsd_to_agl: 29.7, // DJI Mini 4 Pro
        }
    }
}

impl SensorProfile {
    /// Apply `FLIGHTPLAN_*` environment overrides on top of `self`.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| env::var(key).ok())
    }

    /// Apply overrides from any `FLIGHTPLAN_*` key lookup. Unparseable values are ignored.
    pub fn with_overrides<F>(self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).and_then(|s| s.trim().parse::<f64>().ok());
        Self {
            vertical_fov: value("FLIGHTPLAN_VERTICAL_FOV").unwrap_or(self.vertical_fov),
            horizontal_fov: value("FLIGHTPLAN_HORIZONTAL_FOV").unwrap_or(self.horizontal_fov),
            image_interval_s: value("FLIGHTPLAN_IMAGE_INTERVAL_S")
                .unwrap_or(self.image_interval_s),
            gsd_to_agl: value("FLIGHTPLAN_GSD_TO_AGL").unwrap_or(self.gsd_to_agl),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let profile: SensorProfile = serde_json::from_str(r#"{"vertical_fov": 0.8}"#).unwrap();
        assert_eq!(profile.vertical_fov, 0.8);
        assert_eq!(profile.horizontal_fov, 1.26);
        assert_eq!(profile.image_interval_s, 2.0);
    }

    #[test]
    fn lookup_overrides_replace_only_parsed_keys() {
        let profile = SensorProfile::default().with_overrides(|key| match key {
            "FLIGHTPLAN_GSD_TO_AGL" => Some(" 31.5 ".to_string()),
            "FLIGHTPLAN_VERTICAL_FOV" => Some("wide".to_string()),
            _ => None,
        });
        assert_eq!(profile.gsd_to_agl, 31.5);
        assert_eq!(profile.vertical_fov, 0.71);
        assert_eq!(profile.horizontal_fov, 1.26);
    }

    #[test]
    fn environment_override_takes_effect() {
        env::set_var("FLIGHTPLAN_IMAGE_INTERVAL_S", "3.5");
        let profile = SensorProfile::default().with_env_overrides();
        env::remove_var("FLIGHTPLAN_IMAGE_INTERVAL_S");
        assert_eq!(profile.image_interval_s, 3.5);
    }
}
