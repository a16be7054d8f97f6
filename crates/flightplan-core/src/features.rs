//! GeoJSON feature conversion for AOIs, no-fly zones and waypoint plans.
//!
//! Output property names and value types are fixed: `index` is an integer,
//! `heading` a number, `take_photo` a boolean and `gimbal_angle` a string.

use crate::error::{PlanError, Result};
use crate::models::{split_legs, Leg, PlannedWaypoint, TerrainPoint, GIMBAL_NADIR};
use crate::plan::FlightPlan;
use crate::projection::Projection;
use geo::{Coord, LineString, Polygon};
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, JsonValue, Value};
use serde_json::json;

// ========== Polygons ==========

fn features_of(geojson: &GeoJson) -> Vec<&Feature> {
    match geojson {
        GeoJson::FeatureCollection(fc) => fc.features.iter().collect(),
        GeoJson::Feature(f) => vec![f],
        GeoJson::Geometry(_) => Vec::new(),
    }
}

fn geometries_of(geojson: &GeoJson) -> Result<Vec<&Geometry>> {
    if let GeoJson::Geometry(g) = geojson {
        return Ok(vec![g]);
    }
    let features = features_of(geojson);
    if features.is_empty() {
        return Err(PlanError::validation("feature collection has no features"));
    }
    Ok(features.iter().filter_map(|f| f.geometry.as_ref()).collect())
}

fn ring(positions: &[Vec<f64>]) -> Result<LineString<f64>> {
    positions
        .iter()
        .map(|p| match p.as_slice() {
            [x, y, ..] => Ok(Coord { x: *x, y: *y }),
            _ => Err(PlanError::geometry("position needs at least two coordinates")),
        })
        .collect::<Result<Vec<_>>>()
        .map(LineString::from)
}

fn polygon(rings: &[Vec<Vec<f64>>]) -> Result<Polygon<f64>> {
    let (exterior, interiors) = rings
        .split_first()
        .ok_or_else(|| PlanError::geometry("polygon has no rings"))?;
    Ok(Polygon::new(
        ring(exterior)?,
        interiors.iter().map(|r| ring(r)).collect::<Result<Vec<_>>>()?,
    ))
}

/// Every polygon in a GeoJSON document, MultiPolygon members included, in document order.
///
/// Non-polygonal geometries are skipped. A collection without features is a validation error.
pub fn polygons_from_geojson(geojson: &GeoJson) -> Result<Vec<Polygon<f64>>> {
    let mut polygons = Vec::new();
    for geometry in geometries_of(geojson)? {
        match &geometry.value {
            Value::Polygon(rings) => polygons.push(polygon(rings)?),
            Value::MultiPolygon(members) => {
                for rings in members {
                    polygons.push(polygon(rings)?);
                }
            }
            _ => tracing::debug!("skipping non-polygon geometry"),
        }
    }
    Ok(polygons)
}

/// The area of interest: the first polygon of the document.
pub fn aoi_from_geojson(geojson: &GeoJson) -> Result<Polygon<f64>> {
    let mut polygons = polygons_from_geojson(geojson)?;
    if polygons.len() > 1 {
        tracing::warn!(
            polygons = polygons.len(),
            "area of interest has several polygons; planning only the first"
        );
    }
    if polygons.is_empty() {
        return Err(PlanError::validation("area of interest contains no polygon"));
    }
    Ok(polygons.swap_remove(0))
}

// ========== Waypoint output ==========

fn waypoint_feature(wp: &PlannedWaypoint) -> Feature {
    let mut coordinates = vec![wp.lon, wp.lat];
    if let Some(z) = wp.altitude.or(wp.elevation) {
        coordinates.push(z);
    }

    let mut properties = wp.extra.clone();
    properties.insert("index".to_string(), json!(wp.index));
    properties.insert("heading".to_string(), json!(wp.heading));
    properties.insert("take_photo".to_string(), json!(wp.take_photo));
    properties.insert("gimbal_angle".to_string(), json!(wp.gimbal_angle));
    for (key, value) in [
        ("elevation", wp.elevation),
        ("altitude", wp.altitude),
        ("speed", wp.speed),
    ] {
        if let Some(value) = value {
            properties.insert(key.to_string(), json!(value));
        }
    }

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(coordinates))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

/// Emit waypoints as an ordered point feature collection.
pub fn waypoints_to_feature_collection(waypoints: &[PlannedWaypoint]) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: waypoints.iter().map(waypoint_feature).collect(),
        foreign_members: None,
    }
}

impl FlightPlan {
    pub fn to_feature_collection(&self) -> FeatureCollection {
        waypoints_to_feature_collection(&self.waypoints)
    }
}

// ========== Waypoint input ==========

/// Properties regenerated from [`PlannedWaypoint`] fields on output.
const WAYPOINT_PROPERTIES: [&str; 7] = [
    "index",
    "heading",
    "take_photo",
    "gimbal_angle",
    "elevation",
    "altitude",
    "speed",
];

fn number_property(properties: Option<&JsonObject>, key: &str) -> Result<Option<f64>> {
    match properties.and_then(|p| p.get(key)) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::Number(n)) => Ok(n.as_f64()),
        Some(JsonValue::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| PlanError::validation(format!("property {key} is not numeric: {s:?}"))),
        Some(other) => Err(PlanError::validation(format!(
            "property {key} has unexpected value {other}"
        ))),
    }
}

fn waypoint_from_feature(position: usize, feature: &Feature) -> Result<PlannedWaypoint> {
    let coords = match feature.geometry.as_ref().map(|g| &g.value) {
        Some(Value::Point(coords)) if coords.len() >= 2 => coords,
        _ => {
            return Err(PlanError::validation(format!(
                "feature {position} is not a point"
            )))
        }
    };
    let properties = feature.properties.as_ref();

    let heading = number_property(properties, "heading")?.ok_or_else(|| {
        PlanError::validation(format!("feature {position} has no heading"))
    })?;
    let take_photo = properties
        .and_then(|p| p.get("take_photo"))
        .and_then(JsonValue::as_bool)
        .unwrap_or(false);
    let gimbal_angle = match properties.and_then(|p| p.get("gimbal_angle")) {
        Some(JsonValue::String(s)) => s.clone(),
        Some(JsonValue::Number(n)) => n.to_string(),
        _ => GIMBAL_NADIR.to_string(),
    };
    let altitude = number_property(properties, "altitude")?;
    // the third coordinate holds altitude once placemarks are applied
    let elevation = match (number_property(properties, "elevation")?, altitude) {
        (Some(elevation), _) => Some(elevation),
        (None, None) => coords.get(2).copied(),
        (None, Some(_)) => None,
    };

    Ok(PlannedWaypoint {
        index: position,
        lon: coords[0],
        lat: coords[1],
        heading,
        take_photo,
        gimbal_angle,
        elevation,
        altitude,
        speed: number_property(properties, "speed")?,
        extra: properties
            .map(|p| {
                p.iter()
                    .filter(|(key, _)| !WAYPOINT_PROPERTIES.contains(&key.as_str()))
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default(),
    })
}

/// Read a waypoint feature collection back into ordered waypoints.
///
/// `index` is taken from document order. Elevation comes from the `elevation`
/// property, or the third coordinate when neither `elevation` nor `altitude` is set.
pub fn waypoints_from_geojson(geojson: &GeoJson) -> Result<Vec<PlannedWaypoint>> {
    let features = features_of(geojson);
    if features.is_empty() {
        return Err(PlanError::validation("waypoint collection has no features"));
    }
    features
        .into_iter()
        .enumerate()
        .map(|(position, feature)| waypoint_from_feature(position, feature))
        .collect()
}

/// Split a waypoint collection with elevations into planar legs for the simplifier.
pub fn legs_from_features(
    geojson: &GeoJson,
    projection: &dyn Projection,
) -> Result<Vec<Leg<TerrainPoint>>> {
    let waypoints = waypoints_from_geojson(geojson)?;
    let mut points = Vec::with_capacity(waypoints.len());
    for wp in &waypoints {
        let elevation = wp.elevation.ok_or_else(|| {
            PlanError::validation(format!("waypoint {} has no elevation", wp.index))
        })?;
        points.push((
            TerrainPoint {
                index: wp.index,
                position: projection.to_planar(wp.lon, wp.lat)?,
                elevation,
            },
            wp.heading,
        ));
    }
    let legs: Vec<Leg<TerrainPoint>> = split_legs(points, |(_, heading)| *heading)
        .into_iter()
        .map(|leg| Leg {
            heading: leg.heading,
            points: leg.points.into_iter().map(|(p, _)| p).collect(),
        })
        .collect();
    for leg in legs.iter().filter(|leg| leg.len() == 1) {
        tracing::warn!(index = leg.points[0].index, "single-point leg");
    }
    Ok(legs)
}
