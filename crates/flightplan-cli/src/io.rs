//! GeoJSON file I/O.

use anyhow::{Context, Result};
use geojson::GeoJson;
use std::fs;
use std::path::Path;

pub fn read_geojson(path: &Path) -> Result<GeoJson> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    text.parse::<GeoJson>()
        .with_context(|| format!("{} is not valid GeoJSON", path.display()))
}

/// Write pretty-printed GeoJSON, creating parent directories as needed.
pub fn write_geojson(path: &Path, geojson: &GeoJson) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let text = serde_json::to_string_pretty(geojson)?;
    fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), "wrote GeoJSON");
    Ok(())
}
