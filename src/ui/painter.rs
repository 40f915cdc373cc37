//! Map painting.
//!
//! Draws projected paths to the egui canvas through the current zoom
//! transform, and hit-tests prepared features under the pointer.

use eframe::egui::{Color32, Painter, Pos2, Shape, Stroke};
use mapcanvas::data::PreparedFeature;
use mapcanvas::geo::path::DEFAULT_POINT_RADIUS;
use mapcanvas::geo::{ProjectedPath, ProjectedRing};
use mapcanvas::zoom::Transform;

/// Maps projection output to screen pixels: zoom transform, then the
/// canvas origin.
#[derive(Debug, Clone, Copy)]
pub struct ScreenTransform {
    pub origin: Pos2,
    pub transform: Transform,
}

impl ScreenTransform {
    pub fn new(origin: Pos2, transform: Transform) -> Self {
        Self { origin, transform }
    }

    pub fn to_screen(&self, p: [f64; 2]) -> Pos2 {
        let [x, y] = self.transform.apply(p);
        Pos2::new(self.origin.x + x as f32, self.origin.y + y as f32)
    }

    /// Projection-space point under a screen position.
    pub fn to_map(&self, pos: Pos2) -> [f64; 2] {
        self.transform.invert([
            (pos.x - self.origin.x) as f64,
            (pos.y - self.origin.y) as f64,
        ])
    }
}

/// How a path is drawn.
#[derive(Debug, Clone, Copy)]
pub struct PathStyle {
    pub stroke: Stroke,
    /// Fill for closed rings. Only used for convex outlines such as the
    /// sphere; concave fills would need tessellation.
    pub fill: Option<Color32>,
    pub point_color: Color32,
}

impl PathStyle {
    pub fn stroke(width: f32, color: Color32) -> Self {
        Self {
            stroke: Stroke::new(width, color),
            fill: None,
            point_color: color,
        }
    }

    pub fn with_fill(mut self, fill: Color32) -> Self {
        self.fill = Some(fill);
        self
    }
}

/// Renders every ring and point of a projected path.
pub fn paint_path(painter: &Painter, path: &ProjectedPath, view: &ScreenTransform, style: PathStyle) {
    for ring in &path.rings {
        paint_ring(painter, ring, view, style);
    }

    // Markers grow with the zoom like the rest of the map.
    let radius = (DEFAULT_POINT_RADIUS * view.transform.k) as f32;
    for p in &path.points {
        painter.circle_filled(view.to_screen(*p), radius, style.point_color);
    }
}

fn paint_ring(painter: &Painter, ring: &ProjectedRing, view: &ScreenTransform, style: PathStyle) {
    if ring.points.len() < 2 {
        return;
    }

    let points: Vec<Pos2> = ring.points.iter().map(|p| view.to_screen(*p)).collect();
    if !is_on_screen(painter, &points) {
        return;
    }

    if ring.closed {
        match style.fill {
            Some(fill) => {
                painter.add(Shape::convex_polygon(points, fill, style.stroke));
            }
            None => {
                painter.add(Shape::closed_line(points, style.stroke));
            }
        }
    } else {
        for window in points.windows(2) {
            painter.line_segment([window[0], window[1]], style.stroke);
        }
    }
}

/// Quick bounding box check against the clip rect.
fn is_on_screen(painter: &Painter, points: &[Pos2]) -> bool {
    let clip = painter.clip_rect();
    let (min, max) = points.iter().fold(
        (Pos2::new(f32::MAX, f32::MAX), Pos2::new(f32::MIN, f32::MIN)),
        |(min, max), p| (min.min(*p), max.max(*p)),
    );
    max.x >= clip.min.x && min.x <= clip.max.x && max.y >= clip.min.y && min.y <= clip.max.y
}

/// Even-odd containment over all closed rings of a path.
pub fn path_contains(path: &ProjectedPath, p: [f64; 2]) -> bool {
    path.rings
        .iter()
        .filter(|ring| ring.closed)
        .fold(false, |inside, ring| inside ^ ring_contains(&ring.points, p))
}

fn ring_contains(ring: &[[f64; 2]], p: [f64; 2]) -> bool {
    let mut inside = false;
    let mut j = ring.len().wrapping_sub(1);
    for i in 0..ring.len() {
        let (a, b) = (ring[i], ring[j]);
        if (a[1] > p[1]) != (b[1] > p[1]) {
            let x = (b[0] - a[0]) * (p[1] - a[1]) / (b[1] - a[1]) + a[0];
            if p[0] < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Index of the topmost feature at the projection-space point `p`. Point
/// markers count within their radius, which is given in projection units.
pub fn hit_test(features: &[PreparedFeature], p: [f64; 2], point_radius: f64) -> Option<usize> {
    features.iter().rposition(|prepared| {
        let path = &prepared.projected;
        path_contains(path, p)
            || path.points.iter().any(|q| {
                let (dx, dy) = (q[0] - p[0], q[1] - p[1]);
                dx * dx + dy * dy <= point_radius * point_radius
            })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geojson::Feature;

    fn square(x0: f64, y0: f64, size: f64) -> ProjectedRing {
        ProjectedRing {
            points: vec![
                [x0, y0],
                [x0 + size, y0],
                [x0 + size, y0 + size],
                [x0, y0 + size],
                [x0, y0],
            ],
            closed: true,
        }
    }

    fn prepared(projected: ProjectedPath) -> PreparedFeature {
        PreparedFeature {
            feature: Feature {
                bbox: None,
                geometry: None,
                id: None,
                properties: None,
                foreign_members: None,
            },
            svg_path: projected.to_svg(DEFAULT_POINT_RADIUS),
            projected,
        }
    }

    #[test]
    fn test_screen_transform_round_trip() {
        let view = ScreenTransform::new(Pos2::new(10.0, 20.0), Transform::new(5.0, -5.0, 2.0));
        let screen = view.to_screen([100.0, 50.0]);
        assert_eq!(screen, Pos2::new(215.0, 115.0));
        let back = view.to_map(screen);
        assert!((back[0] - 100.0).abs() < 1e-4);
        assert!((back[1] - 50.0).abs() < 1e-4);
    }

    #[test]
    fn test_hole_is_outside() {
        let path = ProjectedPath {
            rings: vec![square(0.0, 0.0, 100.0), square(25.0, 25.0, 50.0)],
            points: Vec::new(),
        };
        assert!(path_contains(&path, [10.0, 10.0]));
        assert!(!path_contains(&path, [50.0, 50.0]));
        assert!(!path_contains(&path, [150.0, 50.0]));
    }

    #[test]
    fn test_open_lines_never_contain() {
        let mut ring = square(0.0, 0.0, 100.0);
        ring.closed = false;
        let path = ProjectedPath {
            rings: vec![ring],
            points: Vec::new(),
        };
        assert!(!path_contains(&path, [50.0, 50.0]));
    }

    #[test]
    fn test_hit_test_prefers_topmost() {
        let features = vec![
            prepared(ProjectedPath {
                rings: vec![square(0.0, 0.0, 100.0)],
                points: Vec::new(),
            }),
            prepared(ProjectedPath {
                rings: vec![square(50.0, 50.0, 100.0)],
                points: Vec::new(),
            }),
            prepared(ProjectedPath {
                rings: Vec::new(),
                points: vec![[300.0, 300.0]],
            }),
        ];
        assert_eq!(hit_test(&features, [75.0, 75.0], 4.5), Some(1));
        assert_eq!(hit_test(&features, [10.0, 10.0], 4.5), Some(0));
        assert_eq!(hit_test(&features, [303.0, 300.0], 4.5), Some(2));
        assert_eq!(hit_test(&features, [400.0, 400.0], 4.5), None);
    }
}
