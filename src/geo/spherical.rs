//! Spherical measurements on features: centroid, bounds and representative
//! coordinates, used for labels and hover/click data.

use super::coords::Coordinates;
use geojson::{Feature, Geometry, Value};
use glam::DVec3;

const EPSILON: f64 = 1e-9;

fn unit(position: &[f64]) -> Option<DVec3> {
    if position.len() < 2 || !position[0].is_finite() || !position[1].is_finite() {
        return None;
    }
    let (lambda, phi) = (position[0].to_radians(), position[1].to_radians());
    let cos_phi = phi.cos();
    Some(DVec3::new(
        lambda.cos() * cos_phi,
        lambda.sin() * cos_phi,
        phi.sin(),
    ))
}

fn to_coordinates(v: DVec3) -> Option<Coordinates> {
    if v.length() < EPSILON || !v.is_finite() {
        return None;
    }
    let v = v.normalize();
    Some(Coordinates::from_lon_lat(
        v.y.atan2(v.x).to_degrees(),
        v.z.clamp(-1.0, 1.0).asin().to_degrees(),
    ))
}

/// Weighted centroid sums, by dimension. The highest dimension present wins.
#[derive(Debug, Default)]
struct CentroidSums {
    points: DVec3,
    lines: DVec3,
    areas: DVec3,
}

impl CentroidSums {
    fn point(&mut self, position: &[f64]) {
        if let Some(v) = unit(position) {
            self.points += v;
        }
    }

    fn line(&mut self, positions: &[Vec<f64>]) {
        let vs: Vec<DVec3> = positions.iter().filter_map(|p| unit(p)).collect();
        for pair in vs.windows(2) {
            let angle = pair[0].angle_between(pair[1]);
            if angle.is_finite() {
                self.lines += (pair[0] + pair[1]).normalize_or_zero() * angle;
            }
        }
        if vs.len() == 1 {
            self.points += vs[0];
        }
    }

    /// Area-weighted contribution of one ring, oriented toward (exterior)
    /// or away from (hole) the ring's own vertices regardless of winding.
    fn ring(&mut self, positions: &[Vec<f64>], hole: bool) {
        let vs: Vec<DVec3> = positions.iter().filter_map(|p| unit(p)).collect();
        if vs.len() < 3 {
            return;
        }
        let mut sum = DVec3::ZERO;
        let mut mean = DVec3::ZERO;
        for (i, a) in vs.iter().enumerate() {
            let b = vs[(i + 1) % vs.len()];
            let c = a.cross(b);
            let m = c.length();
            if m > EPSILON {
                sum += c * (m.clamp(-1.0, 1.0).asin() / m);
            }
            mean += *a;
        }
        if sum.dot(mean) < 0.0 {
            sum = -sum;
        }
        if hole {
            sum = -sum;
        }
        self.areas += sum;
        // Degenerate rings still count as lines.
        self.line(positions);
    }

    fn polygon(&mut self, rings: &[Vec<Vec<f64>>]) {
        for (i, ring) in rings.iter().enumerate() {
            self.ring(ring, i > 0);
        }
    }

    fn value(&mut self, value: &Value) {
        match value {
            Value::Point(p) => self.point(p),
            Value::MultiPoint(points) => points.iter().for_each(|p| self.point(p)),
            Value::LineString(line) => self.line(line),
            Value::MultiLineString(lines) => lines.iter().for_each(|l| self.line(l)),
            Value::Polygon(rings) => self.polygon(rings),
            Value::MultiPolygon(polygons) => polygons.iter().for_each(|p| self.polygon(p)),
            Value::GeometryCollection(geometries) => {
                geometries.iter().for_each(|g| self.value(&g.value))
            }
        }
    }

    fn result(&self) -> Option<Coordinates> {
        [self.areas, self.lines, self.points]
            .into_iter()
            .find(|v| v.length() > EPSILON)
            .and_then(to_coordinates)
    }
}

/// Spherical centroid of a geometry; `None` when undefined.
pub fn geometry_centroid(geometry: &Geometry) -> Option<Coordinates> {
    let mut sums = CentroidSums::default();
    sums.value(&geometry.value);
    sums.result()
}

fn collect_positions<'a>(value: &'a Value, out: &mut Vec<&'a [f64]>) {
    match value {
        Value::Point(p) => out.push(p),
        Value::MultiPoint(ps) | Value::LineString(ps) => out.extend(ps.iter().map(Vec::as_slice)),
        Value::MultiLineString(lines) | Value::Polygon(lines) => {
            out.extend(lines.iter().flatten().map(Vec::as_slice))
        }
        Value::MultiPolygon(polygons) => {
            out.extend(polygons.iter().flatten().flatten().map(Vec::as_slice))
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                collect_positions(&g.value, out);
            }
        }
    }
}

/// Longitude/latitude bounds `[southwest, northeast]` over the vertices.
///
/// The longitude interval is the smallest one covering every vertex, so a
/// geometry straddling the antimeridian reports `southwest.lon >
/// northeast.lon`.
pub fn geometry_bounds(geometry: &Geometry) -> Option<[Coordinates; 2]> {
    let mut positions = Vec::new();
    collect_positions(&geometry.value, &mut positions);
    let mut lons = Vec::with_capacity(positions.len());
    let (mut south, mut north) = (f64::INFINITY, f64::NEG_INFINITY);
    for p in positions {
        if p.len() < 2 || !p[0].is_finite() || !p[1].is_finite() {
            continue;
        }
        lons.push(super::convert::normalize_longitude(p[0]));
        south = south.min(p[1]);
        north = north.max(p[1]);
    }
    if lons.is_empty() {
        return None;
    }
    lons.sort_by(|a, b| a.total_cmp(b));

    // The widest gap between consecutive longitudes (cyclically) is the
    // part of the globe the geometry does not cover.
    let n = lons.len();
    let (mut gap, mut gap_end) = (lons[0] + 360.0 - lons[n - 1], 0);
    for i in 1..n {
        let d = lons[i] - lons[i - 1];
        if d > gap {
            gap = d;
            gap_end = i;
        }
    }
    let west = lons[gap_end];
    let east = lons[(gap_end + n - 1) % n];

    let sw = Coordinates::from_lon_lat(west, south);
    let ne = Coordinates::from_lon_lat(east, north);
    (is_valid_coordinates(&sw.to_array()) && is_valid_coordinates(&ne.to_array()))
        .then_some([sw, ne])
}

/// Centroid of a feature's geometry, rejected when non-finite or out of
/// range.
pub fn get_geography_centroid(feature: &Feature) -> Option<Coordinates> {
    let centroid = geometry_centroid(feature.geometry.as_ref()?)?;
    is_valid_coordinates(&centroid.to_array()).then_some(centroid)
}

pub fn get_geography_bounds(feature: &Feature) -> Option<[Coordinates; 2]> {
    geometry_bounds(feature.geometry.as_ref()?)
}

fn first_position(value: &Value) -> Option<&[f64]> {
    let p: &[f64] = match value {
        Value::Point(p) => p,
        Value::MultiPoint(ps) | Value::LineString(ps) => ps.first()?,
        Value::MultiLineString(ls) | Value::Polygon(ls) => ls.first()?.first()?,
        Value::MultiPolygon(polys) => polys.first()?.first()?.first()?,
        Value::GeometryCollection(gs) => return first_position(&gs.first()?.value),
    };
    (p.len() >= 2).then_some(p)
}

/// The first coordinate of a feature's geometry, descending into the first
/// member of collections.
pub fn get_geography_coordinates(feature: &Feature) -> Option<Coordinates> {
    let p = first_position(&feature.geometry.as_ref()?.value)?;
    Some(Coordinates::from_lon_lat(p[0], p[1]))
}

/// Centroid when defined, else the first coordinate.
pub fn get_best_geography_coordinates(feature: &Feature) -> Option<Coordinates> {
    get_geography_centroid(feature).or_else(|| get_geography_coordinates(feature))
}

/// Two finite numbers within longitude/latitude range.
pub fn is_valid_coordinates(coords: &[f64]) -> bool {
    coords.len() == 2
        && coords[0].is_finite()
        && coords[1].is_finite()
        && coords[0].abs() <= 180.0
        && coords[1].abs() <= 90.0
}

/// Data handed to geography hover/click handlers.
#[derive(Debug, Clone)]
pub struct GeographyEventData {
    pub geography: Feature,
    pub centroid: Option<Coordinates>,
    pub bounds: Option<[Coordinates; 2]>,
    pub coordinates: Option<Coordinates>,
}

impl GeographyEventData {
    pub fn for_feature(feature: &Feature) -> Self {
        Self {
            geography: feature.clone(),
            centroid: get_geography_centroid(feature),
            bounds: get_geography_bounds(feature),
            coordinates: get_best_geography_coordinates(feature),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature(value: Value) -> Feature {
        Feature {
            bbox: None,
            geometry: Some(Geometry::new(value)),
            id: None,
            properties: None,
            foreign_members: None,
        }
    }

    fn square(x0: f64, y0: f64, size: f64) -> Vec<Vec<f64>> {
        vec![
            vec![x0, y0],
            vec![x0 + size, y0],
            vec![x0 + size, y0 + size],
            vec![x0, y0 + size],
            vec![x0, y0],
        ]
    }

    #[test]
    fn test_point_centroid() {
        let c = get_geography_centroid(&feature(Value::Point(vec![10.0, 20.0]))).unwrap();
        assert!((c.lon() - 10.0).abs() < 1e-9);
        assert!((c.lat() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_polygon_centroid_ignores_winding() {
        let ccw = square(10.0, 10.0, 2.0);
        let mut cw = ccw.clone();
        cw.reverse();
        for ring in [ccw, cw] {
            let c = get_geography_centroid(&feature(Value::Polygon(vec![ring]))).unwrap();
            assert!((c.lon() - 11.0).abs() < 0.01, "{:?}", c);
            assert!((c.lat() - 11.0).abs() < 0.01, "{:?}", c);
        }
    }

    #[test]
    fn test_line_centroid_is_midpoint() {
        let line = Value::LineString(vec![vec![0.0, 0.0], vec![20.0, 0.0]]);
        let c = get_geography_centroid(&feature(line)).unwrap();
        assert!((c.lon() - 10.0).abs() < 1e-9);
        assert!(c.lat().abs() < 1e-9);
    }

    #[test]
    fn test_bounds_across_antimeridian() {
        let line = Value::LineString(vec![vec![170.0, -5.0], vec![-170.0, 5.0]]);
        let [sw, ne] = get_geography_bounds(&feature(line)).unwrap();
        assert_eq!(sw.lon(), 170.0);
        assert_eq!(ne.lon(), -170.0);
        assert_eq!(sw.lat(), -5.0);
        assert_eq!(ne.lat(), 5.0);
    }

    #[test]
    fn test_bounds_of_square() {
        let [sw, ne] =
            get_geography_bounds(&feature(Value::Polygon(vec![square(-10.0, 0.0, 20.0)])))
                .unwrap();
        assert_eq!(sw.to_array(), [-10.0, 0.0]);
        assert_eq!(ne.to_array(), [10.0, 20.0]);
    }

    #[test]
    fn test_first_coordinates() {
        let multi = Value::MultiPolygon(vec![vec![square(3.0, 4.0, 1.0)]]);
        assert_eq!(
            get_geography_coordinates(&feature(multi)).unwrap().to_array(),
            [3.0, 4.0]
        );
        let collection = Value::GeometryCollection(vec![Geometry::new(Value::Point(vec![
            7.0, 8.0,
        ]))]);
        assert_eq!(
            get_geography_coordinates(&feature(collection))
                .unwrap()
                .to_array(),
            [7.0, 8.0]
        );
        assert!(get_geography_coordinates(&feature(Value::LineString(vec![]))).is_none());
    }

    #[test]
    fn test_missing_geometry() {
        let mut f = feature(Value::Point(vec![0.0, 0.0]));
        f.geometry = None;
        assert!(get_best_geography_coordinates(&f).is_none());
        assert!(get_geography_bounds(&f).is_none());
    }

    #[test]
    fn test_is_valid_coordinates() {
        assert!(is_valid_coordinates(&[180.0, -90.0]));
        assert!(!is_valid_coordinates(&[190.0, 0.0]));
        assert!(!is_valid_coordinates(&[f64::NAN, 0.0]));
        assert!(!is_valid_coordinates(&[1.0]));
    }

    #[test]
    fn test_event_data() {
        let data = GeographyEventData::for_feature(&feature(Value::Point(vec![1.0, 2.0])));
        assert!(data.centroid.is_some());
        assert!(data.bounds.is_some());
        let [lon, lat] = data.coordinates.unwrap().to_array();
        assert!((lon - 1.0).abs() < 1e-9);
        assert!((lat - 2.0).abs() < 1e-9);
    }
}
