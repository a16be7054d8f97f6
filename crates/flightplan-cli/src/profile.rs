//! Sensor profile loading: JSON file, then `FLIGHTPLAN_*` environment overrides.

use anyhow::{Context, Result};
use flightplan_core::SensorProfile;
use std::fs;
use std::path::Path;

pub fn load_sensor_profile(path: Option<&Path>) -> Result<SensorProfile> {
    let base = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read sensor profile {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("invalid sensor profile {}", path.display()))?
        }
        None => SensorProfile::default(),
    };
    let profile = base.with_env_overrides();
    tracing::debug!(?profile, "sensor profile");
    Ok(profile)
}
