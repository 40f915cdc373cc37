//! Geography data: where it comes from and how features and meshes are
//! pulled out of it.
//!
//! ## Sources
//! - `Url`: fetched once per distinct URL by [`GeographyLoader`]
//! - `Topology`: TopoJSON, features come from its first object
//! - `FeatureCollection` / `Features`: GeoJSON, used as-is
//!
//! Meshes (outline and borders) exist only for topology input.

pub mod download;
pub mod prepare;

pub use download::{GeographyFetcher, GeographyLoader, HttpFetcher, LoadState};
pub use prepare::{prepare_features, prepare_features_with, prepare_mesh, PreparedFeature, PreparedMesh};

use crate::error::{MapError, MapResult};
use crate::topology::{Mesh, Topology};
use geojson::{Feature, FeatureCollection};
use serde_json::Value;
use std::path::Path;

/// Post-processing hook applied to extracted features.
pub type ParseGeographies = fn(Vec<Feature>) -> Vec<Feature>;

/// Where a geography comes from.
#[derive(Debug, Clone)]
pub enum GeographySource {
    Url(String),
    Topology(Topology),
    FeatureCollection(FeatureCollection),
    Features(Vec<Feature>),
}

impl GeographySource {
    /// The in-memory data, or `None` for a URL that still has to be fetched.
    pub fn data(&self) -> Option<GeographyData> {
        match self {
            GeographySource::Url(_) => None,
            GeographySource::Topology(t) => Some(GeographyData::Topology(t.clone())),
            GeographySource::FeatureCollection(fc) => {
                Some(GeographyData::FeatureCollection(fc.clone()))
            }
            GeographySource::Features(fs) => Some(GeographyData::Features(fs.clone())),
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            GeographySource::Url(url) => Some(url),
            _ => None,
        }
    }
}

impl From<GeographyData> for GeographySource {
    fn from(data: GeographyData) -> Self {
        match data {
            GeographyData::Topology(t) => GeographySource::Topology(t),
            GeographyData::FeatureCollection(fc) => GeographySource::FeatureCollection(fc),
            GeographyData::Features(fs) => GeographySource::Features(fs),
        }
    }
}

/// Geography data that is available without any network access.
#[derive(Debug, Clone)]
pub enum GeographyData {
    Topology(Topology),
    FeatureCollection(FeatureCollection),
    Features(Vec<Feature>),
}

/// Interprets a JSON document as a topology, a feature collection or a bare
/// array of features.
pub fn parse_geography(value: Value) -> MapResult<GeographyData> {
    if value.is_array() {
        return serde_json::from_value(value)
            .map(GeographyData::Features)
            .map_err(|e| MapError::parse(format!("Invalid feature list: {}", e)));
    }
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .map(str::to_string);
    match kind.as_deref() {
        Some("Topology") => Topology::from_value(value).map(GeographyData::Topology),
        Some("FeatureCollection") => serde_json::from_value(value)
            .map(GeographyData::FeatureCollection)
            .map_err(|e| MapError::parse(format!("Invalid feature collection: {}", e))),
        Some(other) => Err(MapError::parse(format!(
            "Unsupported geography type: {}",
            other
        ))),
        None => Err(MapError::parse("Geography data has no type")),
    }
}

/// Reads and parses a geography file from disk.
pub fn load_file(path: &Path) -> MapResult<GeographyData> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        MapError::geography_fetch(
            crate::error::ErrorKind::GeographyLoad,
            format!("Failed to read geography: {}", e),
            path.to_str(),
            Some(&e),
        )
    })?;
    let value: Value = serde_json::from_str(&text)
        .map_err(|e| MapError::parse(format!("Invalid JSON: {}", e)))?;
    parse_geography(value)
}

/// Features of the data, passed through `parse` when given.
pub fn get_features(data: &GeographyData, parse: Option<ParseGeographies>) -> MapResult<Vec<Feature>> {
    let features = match data {
        GeographyData::Topology(topology) => topology.features()?,
        GeographyData::FeatureCollection(fc) => fc.features.clone(),
        GeographyData::Features(features) => features.clone(),
    };
    Ok(match parse {
        Some(parse) => parse(features),
        None => features,
    })
}

/// Outline and borders; only topologies with at least one object have one.
pub fn get_mesh(data: &GeographyData) -> Option<Mesh> {
    match data {
        GeographyData::Topology(topology) => topology.mesh(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn square_topology() -> Value {
        json!({
            "type": "Topology",
            "objects": {
                "default": {
                    "type": "GeometryCollection",
                    "geometries": [{
                        "type": "Polygon",
                        "id": "100",
                        "properties": { "name": "Test Country" },
                        "arcs": [[0]]
                    }]
                }
            },
            "arcs": [[[0, 0], [0, 10], [10, 10], [10, 0], [0, 0]]]
        })
    }

    fn feature_collection() -> Value {
        json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": { "name": "A" },
                "geometry": { "type": "Point", "coordinates": [1.0, 2.0] }
            }]
        })
    }

    #[test]
    fn test_parse_topology_and_collection() {
        assert!(matches!(
            parse_geography(square_topology()).unwrap(),
            GeographyData::Topology(_)
        ));
        assert!(matches!(
            parse_geography(feature_collection()).unwrap(),
            GeographyData::FeatureCollection(_)
        ));
    }

    #[test]
    fn test_parse_rejects_other_documents() {
        let err = parse_geography(json!({ "type": "Point", "coordinates": [0, 0] })).unwrap_err();
        assert_eq!(err.kind.code(), "GEOGRAPHY_PARSE_ERROR");
        let err = parse_geography(json!("hello")).unwrap_err();
        assert_eq!(err.kind.code(), "GEOGRAPHY_PARSE_ERROR");
    }

    #[test]
    fn test_mesh_only_for_topology() {
        let topology = parse_geography(square_topology()).unwrap();
        assert!(get_mesh(&topology).is_some());

        let fc = parse_geography(feature_collection()).unwrap();
        assert!(get_mesh(&fc).is_none());
        assert_eq!(get_features(&fc, None).unwrap().len(), 1);
    }

    #[test]
    fn test_empty_objects_topology() {
        let data = parse_geography(json!({
            "type": "Topology",
            "objects": {},
            "arcs": []
        }))
        .unwrap();
        assert!(get_features(&data, None).unwrap().is_empty());
        assert!(get_mesh(&data).is_none());
    }

    #[test]
    fn test_parse_geographies_hook() {
        fn drop_all(_: Vec<Feature>) -> Vec<Feature> {
            Vec::new()
        }
        let data = parse_geography(square_topology()).unwrap();
        assert_eq!(get_features(&data, None).unwrap().len(), 1);
        assert!(get_features(&data, Some(drop_all)).unwrap().is_empty());
    }

    #[test]
    fn test_source_data() {
        assert!(GeographySource::Url("https://example.com/a.json".into())
            .data()
            .is_none());
        let source = GeographySource::Features(Vec::new());
        assert!(source.data().is_some());
        assert!(source.url().is_none());
    }
}
