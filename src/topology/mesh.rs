//! Mesh extraction: the subset of a topology's arcs selected by which
//! geometries share them.

use super::{arc_index, visit_arc_indexes, Topology};
use crate::error::{MapError, MapResult};
use geojson::{Geometry, Value};
use topojson::NamedGeometry;

/// Decides whether an arc shared by geometries `a` and `b` (indices of leaf
/// geometries in traversal order) belongs in the mesh. For an arc used by
/// one geometry, `a == b`.
pub type MeshFilter = fn(usize, usize) -> bool;

/// Outline and internal borders of a topology object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    /// Arcs used by exactly one geometry.
    pub outline: Option<Geometry>,
    /// Arcs shared by two distinct geometries.
    pub borders: Option<Geometry>,
}

#[derive(Debug, Clone, Copy)]
struct ArcUse {
    index: i32,
    geometry: usize,
}

/// Uses of each arc, indexed by arc. References past the arc table fail.
fn collect_uses(topology: &Topology, object: &NamedGeometry) -> MapResult<Vec<Vec<ArcUse>>> {
    let mut uses = vec![Vec::new(); topology.arc_count()];
    let mut bad = None;
    visit_arc_indexes(&object.geometry, &mut |geometry, index| {
        match uses.get_mut(arc_index(index)) {
            Some(arc) => arc.push(ArcUse { index, geometry }),
            None => bad = bad.or(Some(index)),
        }
    });
    match bad {
        Some(index) => Err(MapError::parse(format!(
            "topology object {} references arc {} of {}",
            object.name,
            index,
            topology.arc_count()
        ))),
        None => Ok(uses),
    }
}

/// Mesh of `object` as a MultiLineString, keeping arcs accepted by
/// `filter`. Consecutive arcs that meet end to start are joined.
pub fn mesh(topology: &Topology, object: &NamedGeometry, filter: MeshFilter) -> MapResult<Geometry> {
    let uses = collect_uses(topology, object)?;

    let mut lines: Vec<Vec<Vec<f64>>> = Vec::new();
    for arc_uses in uses.iter().filter(|u| !u.is_empty()) {
        let first = arc_uses[0];
        let last = arc_uses[arc_uses.len() - 1];
        if !filter(first.geometry, last.geometry) {
            continue;
        }
        let mut points = topology.decode_arc(arc_index(first.index))?;
        if first.index < 0 {
            points.reverse();
        }
        match lines.last_mut() {
            Some(line) if line.last() == points.first() => line.extend(points.into_iter().skip(1)),
            _ => lines.push(points),
        }
    }
    Ok(Geometry::new(Value::MultiLineString(lines)))
}

impl Topology {
    /// Outline and borders of the first object; `None` without objects.
    ///
    /// Malformed arcs do not fail the call; both meshes come back empty.
    pub fn mesh(&self) -> Option<Mesh> {
        let object = self.first_object()?;
        let outline = mesh(self, object, |a, b| a == b);
        let borders = mesh(self, object, |a, b| a != b);
        match (outline, borders) {
            (Ok(outline), Ok(borders)) => Some(Mesh {
                outline: Some(outline),
                borders: Some(borders),
            }),
            (Err(e), _) | (_, Err(e)) => {
                log::warn!("mesh for topology object {} unavailable: {}", object.name, e);
                Some(Mesh::default())
            }
        }
    }
}
