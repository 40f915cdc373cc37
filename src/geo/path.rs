//! Path generation: GeoJSON geometry through a projection into SVG path
//! data and screen-space rings for the native painter.

use super::coords::Coordinates;
use super::projection::Projection;
use geojson::{Feature, Geometry, Value};
use std::fmt::Write;

/// Radius of the circle drawn for point geometries.
pub const DEFAULT_POINT_RADIUS: f64 = 4.5;

/// Anything the path generator can draw.
#[derive(Debug, Clone, Copy)]
pub enum GeoObject<'a> {
    Feature(&'a Feature),
    Geometry(&'a Geometry),
    /// The outline of the whole globe as seen through the projection.
    Sphere,
}

impl<'a> From<&'a Feature> for GeoObject<'a> {
    fn from(feature: &'a Feature) -> Self {
        GeoObject::Feature(feature)
    }
}

impl<'a> From<&'a Geometry> for GeoObject<'a> {
    fn from(geometry: &'a Geometry) -> Self {
        GeoObject::Geometry(geometry)
    }
}

/// One projected polyline; `closed` rings are filled by the painter.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedRing {
    pub points: Vec<[f64; 2]>,
    pub closed: bool,
}

/// Screen-space geometry produced by a [`PathGenerator`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectedPath {
    pub rings: Vec<ProjectedRing>,
    pub points: Vec<[f64; 2]>,
}

impl ProjectedPath {
    pub fn is_empty(&self) -> bool {
        self.rings.is_empty() && self.points.is_empty()
    }

    /// Serializes to SVG path data, points drawn as circles of `radius`.
    pub fn to_svg(&self, radius: f64) -> String {
        let mut out = String::new();
        for ring in &self.rings {
            for (i, p) in ring.points.iter().enumerate() {
                let _ = write!(
                    out,
                    "{}{},{}",
                    if i == 0 { 'M' } else { 'L' },
                    fmt_num(p[0]),
                    fmt_num(p[1])
                );
            }
            if ring.closed {
                out.push('Z');
            }
        }
        let r = fmt_num(radius);
        let d = fmt_num(radius * 2.0);
        for p in &self.points {
            let _ = write!(
                out,
                "M{},{}m0,{r}a{r},{r} 0 1,1 0,-{d}a{r},{r} 0 1,1 0,{d}z",
                fmt_num(p[0]),
                fmt_num(p[1]),
            );
        }
        out
    }
}

/// Three decimals, trailing zeros dropped, no negative zero.
fn fmt_num(v: f64) -> String {
    let rounded = (v * 1000.0).round() / 1000.0;
    if rounded == 0.0 {
        "0".to_string()
    } else {
        rounded.to_string()
    }
}

/// Turns geometry into path data through a fixed projection.
#[derive(Debug, Clone)]
pub struct PathGenerator {
    projection: Projection,
    point_radius: f64,
}

impl PathGenerator {
    pub fn new(projection: Projection) -> Self {
        Self {
            projection,
            point_radius: DEFAULT_POINT_RADIUS,
        }
    }

    pub fn with_point_radius(mut self, radius: f64) -> Self {
        self.point_radius = radius;
        self
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// SVG path data for the object, or `None` when nothing is visible.
    pub fn svg<'a>(&self, object: impl Into<GeoObject<'a>>) -> Option<String> {
        let projected = self.project(object.into());
        (!projected.is_empty()).then(|| projected.to_svg(self.point_radius))
    }

    /// SVG path data for geometry already run through [`project`](Self::project).
    pub fn svg_of(&self, projected: &ProjectedPath) -> String {
        projected.to_svg(self.point_radius)
    }

    pub fn sphere(&self) -> Option<String> {
        self.svg(GeoObject::Sphere)
    }

    /// Projects and clips the object into screen space.
    pub fn project(&self, object: GeoObject<'_>) -> ProjectedPath {
        let mut out = ProjectedPath::default();
        match object {
            GeoObject::Feature(feature) => {
                if let Some(geometry) = &feature.geometry {
                    self.project_value(&geometry.value, &mut out);
                }
            }
            GeoObject::Geometry(geometry) => self.project_value(&geometry.value, &mut out),
            GeoObject::Sphere => {
                let ring = self.projection.clip().sphere();
                self.emit_ring(&ring, &mut out);
            }
        }
        out
    }

    fn project_value(&self, value: &Value, out: &mut ProjectedPath) {
        match value {
            Value::Point(p) => self.point(p, out),
            Value::MultiPoint(points) => {
                for p in points {
                    self.point(p, out);
                }
            }
            Value::LineString(line) => self.line(line, out),
            Value::MultiLineString(lines) => {
                for line in lines {
                    self.line(line, out);
                }
            }
            Value::Polygon(rings) => self.polygon(rings, out),
            Value::MultiPolygon(polygons) => {
                for rings in polygons {
                    self.polygon(rings, out);
                }
            }
            Value::GeometryCollection(geometries) => {
                for geometry in geometries {
                    self.project_value(&geometry.value, out);
                }
            }
        }
    }

    fn rotated(&self, positions: &[Vec<f64>]) -> Vec<[f64; 2]> {
        positions
            .iter()
            .filter(|p| p.len() >= 2)
            .map(|p| self.projection.rotate_point(p[0], p[1]))
            .collect()
    }

    fn point(&self, position: &[f64], out: &mut ProjectedPath) {
        if position.len() < 2 {
            return;
        }
        if let Some(p) = self.projection.project(Coordinates::from_lon_lat(position[0], position[1])) {
            out.points.push(p);
        }
    }

    fn line(&self, positions: &[Vec<f64>], out: &mut ProjectedPath) {
        let rotated = self.rotated(positions);
        for piece in self.projection.clip().line(&rotated) {
            self.emit_open(&piece, out);
        }
    }

    fn polygon(&self, rings: &[Vec<Vec<f64>>], out: &mut ProjectedPath) {
        for ring in rings {
            let mut rotated = self.rotated(ring);
            if rotated.len() > 1 && rotated.first() == rotated.last() {
                rotated.pop();
            }
            for clipped in self.projection.clip().ring(&rotated) {
                self.emit_ring(&clipped, out);
            }
        }
    }

    /// Projects an open run, splitting it where a vertex fails to project.
    fn emit_open(&self, points: &[[f64; 2]], out: &mut ProjectedPath) {
        let mut run = Vec::with_capacity(points.len());
        for p in points {
            match self.projection.project_rotated(*p) {
                Some(px) => run.push(px),
                None => flush_open(&mut run, out),
            }
        }
        flush_open(&mut run, out);
    }

    fn emit_ring(&self, points: &[[f64; 2]], out: &mut ProjectedPath) {
        let projected: Vec<Option<[f64; 2]>> = points
            .iter()
            .map(|p| self.projection.project_rotated(*p))
            .collect();
        if projected.iter().all(Option::is_some) {
            let points: Vec<[f64; 2]> = projected.into_iter().flatten().collect();
            if points.len() >= 3 {
                out.rings.push(ProjectedRing {
                    points,
                    closed: true,
                });
            }
            return;
        }
        // A ring that cannot be fully projected degrades to open runs.
        let mut run = Vec::new();
        for p in projected {
            match p {
                Some(px) => run.push(px),
                None => flush_open(&mut run, out),
            }
        }
        flush_open(&mut run, out);
    }
}

fn flush_open(run: &mut Vec<[f64; 2]>, out: &mut ProjectedPath) {
    if run.len() >= 2 {
        out.rings.push(ProjectedRing {
            points: std::mem::take(run),
            closed: false,
        });
    } else {
        run.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::projection::named_projection;

    fn generator(name: &str) -> PathGenerator {
        PathGenerator::new(
            named_projection(name)
                .unwrap()
                .translate([400.0, 300.0]),
        )
    }

    fn geometry(value: Value) -> Geometry {
        Geometry::new(value)
    }

    #[test]
    fn test_point_is_a_circle() {
        let path = generator("geoEquirectangular");
        let svg = path.svg(&geometry(Value::Point(vec![0.0, 0.0]))).unwrap();
        assert_eq!(
            svg,
            "M400,300m0,4.5a4.5,4.5 0 1,1 0,-9a4.5,4.5 0 1,1 0,9z"
        );
    }

    #[test]
    fn test_line_string_is_open() {
        let path = generator("geoEquirectangular");
        let svg = path
            .svg(&geometry(Value::LineString(vec![
                vec![0.0, 0.0],
                vec![10.0, 0.0],
            ])))
            .unwrap();
        assert!(svg.starts_with("M400,300L"));
        assert!(!svg.ends_with('Z'));
    }

    #[test]
    fn test_polygon_is_closed_without_repeating_first_vertex() {
        let path = generator("geoEquirectangular");
        let polygon = geometry(Value::Polygon(vec![vec![
            vec![0.0, 0.0],
            vec![10.0, 0.0],
            vec![10.0, 10.0],
            vec![0.0, 0.0],
        ]]));
        let projected = path.project(GeoObject::Geometry(&polygon));
        assert_eq!(projected.rings.len(), 1);
        assert!(projected.rings[0].closed);
        assert_eq!(projected.rings[0].points.len(), 3);
        assert!(path.svg(&polygon).unwrap().ends_with('Z'));
    }

    #[test]
    fn test_hidden_geometry_yields_none() {
        let path = generator("geoOrthographic");
        let far = geometry(Value::Point(vec![180.0, 0.0]));
        assert!(path.svg(&far).is_none());
        let feature = Feature {
            bbox: None,
            geometry: None,
            id: None,
            properties: None,
            foreign_members: None,
        };
        assert!(path.svg(&feature).is_none());
    }

    #[test]
    fn test_line_across_antimeridian_is_split() {
        let path = generator("geoEquirectangular");
        let line = geometry(Value::LineString(vec![
            vec![170.0, 0.0],
            vec![-170.0, 0.0],
        ]));
        let projected = path.project(GeoObject::Geometry(&line));
        assert_eq!(projected.rings.len(), 2);
        let svg = projected.to_svg(DEFAULT_POINT_RADIUS);
        assert_eq!(svg.matches('M').count(), 2);
    }

    #[test]
    fn test_sphere_outline_exists_for_every_projection() {
        for name in crate::geo::projection::PROJECTION_NAMES {
            let path = generator(name);
            assert!(path.sphere().is_some(), "{}", name);
        }
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(fmt_num(1.23456), "1.235");
        assert_eq!(fmt_num(-0.0001), "0");
        assert_eq!(fmt_num(12.0), "12");
    }
}
