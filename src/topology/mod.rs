//! TopoJSON topologies: parsing through the `topojson` crate, converting
//! objects into GeoJSON features, and extracting meshes.
//!
//! Only the first object of a topology is ever read (in document order).
//! Multi-layer topologies therefore expose a single layer.

mod mesh;

pub use mesh::{mesh, Mesh, MeshFilter};

use crate::error::{MapError, MapResult};
use geojson::feature::Id;
use geojson::{Feature, FeatureCollection};
use serde_json::Value as JsonValue;
use topojson::{NamedGeometry, TopoJson};

/// A parsed TopoJSON topology.
#[derive(Debug, Clone)]
pub struct Topology {
    raw: topojson::Topology,
}

fn malformed(message: String) -> MapError {
    MapError::parse(message)
}

impl Topology {
    /// Parses a topology from a JSON value whose `type` is `"Topology"`.
    pub fn from_value(value: JsonValue) -> MapResult<Self> {
        match value.to_string().parse::<TopoJson>() {
            Ok(TopoJson::Topology(raw)) => Ok(Self { raw }),
            Ok(TopoJson::Geometry(_)) => {
                Err(malformed("Invalid topology: expected type Topology".to_string()))
            }
            Err(e) => Err(malformed(format!("Invalid topology: {}", e))),
        }
    }

    /// Named objects in document order.
    pub fn objects(&self) -> &[NamedGeometry] {
        &self.raw.objects
    }

    /// The first object in document order.
    pub fn first_object(&self) -> Option<&NamedGeometry> {
        self.raw.objects.first()
    }

    pub fn arc_count(&self) -> usize {
        self.raw.arcs.len()
    }

    /// Decoded absolute positions of one arc.
    pub fn decode_arc(&self, index: usize) -> MapResult<Vec<Vec<f64>>> {
        let arc = self
            .raw
            .arcs
            .get(index)
            .ok_or_else(|| malformed(format!("arc {} out of range", index)))?;
        let Some(t) = self.raw.transform.as_ref() else {
            return Ok(arc.clone());
        };
        let (mut x, mut y) = (0.0, 0.0);
        let mut out = Vec::with_capacity(arc.len());
        for p in arc {
            if p.len() < 2 {
                return Err(malformed(format!("arc {} has a short position", index)));
            }
            x += p[0];
            y += p[1];
            let mut decoded = vec![x * t.scale[0] + t.translate[0], y * t.scale[1] + t.translate[1]];
            decoded.extend_from_slice(&p[2..]);
            out.push(decoded);
        }
        Ok(out)
    }

    /// Features of one object: one per member of a collection, or a single
    /// feature otherwise.
    pub fn object_features(&self, object: &NamedGeometry) -> MapResult<Vec<Feature>> {
        self.check_arcs(&object.geometry)?;
        let collection = topojson::to_geojson(&self.raw, &object.name)
            .map_err(|e| malformed(format!("topology object {}: {}", object.name, e)))?;
        let mut features = bridge_features(collection)?;

        // Ids and properties come from the topology objects.
        let sources = leaf_sources(&object.geometry);
        if sources.len() == features.len() {
            for (feature, source) in features.iter_mut().zip(sources) {
                feature.id = source.id.as_ref().and_then(feature_id);
                feature.properties = Some(source.properties.clone().unwrap_or_default());
            }
        }
        Ok(features)
    }

    /// Features of the first object; empty when there are no objects.
    pub fn features(&self) -> MapResult<Vec<Feature>> {
        match self.first_object() {
            Some(object) => self.object_features(object),
            None => Ok(Vec::new()),
        }
    }

    /// Rejects arc references past the end of the arc table.
    fn check_arcs(&self, geometry: &topojson::Geometry) -> MapResult<()> {
        let count = self.arc_count();
        let mut bad = None;
        visit_arc_indexes(geometry, &mut |_, index| {
            if bad.is_none() && arc_index(index) >= count {
                bad = Some(index);
            }
        });
        match bad {
            Some(index) => Err(malformed(format!("arc {} out of range", index))),
            None => Ok(()),
        }
    }
}

/// Converts a `topojson` feature collection into this crate's `geojson`
/// types through their shared JSON form.
fn bridge_features<T: serde::Serialize>(collection: T) -> MapResult<Vec<Feature>> {
    let value = serde_json::to_value(collection)
        .map_err(|e| malformed(format!("Invalid topology features: {}", e)))?;
    let collection: FeatureCollection = serde_json::from_value(value)
        .map_err(|e| malformed(format!("Invalid topology features: {}", e)))?;
    Ok(collection.features)
}

/// Leaf geometries of an object: collection members, or the object itself.
fn leaf_sources(geometry: &topojson::Geometry) -> Vec<&topojson::Geometry> {
    match &geometry.value {
        topojson::Value::GeometryCollection(members) => members.iter().collect(),
        _ => vec![geometry],
    }
}

/// Calls `f(leaf, index)` for every arc index under `geometry`, numbering
/// leaf geometries in traversal order starting at zero.
pub(crate) fn visit_arc_indexes(geometry: &topojson::Geometry, f: &mut impl FnMut(usize, i32)) {
    fn walk(geometry: &topojson::Geometry, next: &mut usize, f: &mut impl FnMut(usize, i32)) {
        use topojson::Value;

        let leaf = *next;
        match &geometry.value {
            Value::GeometryCollection(members) => {
                for member in members {
                    walk(member, next, f);
                }
                return;
            }
            Value::LineString(arcs) => arcs.iter().for_each(|&i| f(leaf, i)),
            Value::MultiLineString(lines) | Value::Polygon(lines) => {
                lines.iter().flatten().for_each(|&i| f(leaf, i))
            }
            Value::MultiPolygon(polygons) => {
                polygons.iter().flatten().flatten().for_each(|&i| f(leaf, i))
            }
            Value::Point(_) | Value::MultiPoint(_) => {}
        }
        *next += 1;
    }

    walk(geometry, &mut 0, f);
}

/// A negative index `i` refers to arc `!i` traversed in reverse.
pub(crate) fn arc_index(i: i32) -> usize {
    if i < 0 {
        (!i) as usize
    } else {
        i as usize
    }
}

fn feature_id(id: &JsonValue) -> Option<Id> {
    match id {
        JsonValue::String(s) => Some(Id::String(s.clone())),
        JsonValue::Number(n) => Some(Id::Number(n.clone())),
        _ => None,
    }
}
