//! Spherical clipping in the rotated frame (radians).
//!
//! Two strategies, matching what the projections need:
//! - `Antimeridian`: cut lines and rings where they cross lambda = +/-pi,
//!   closing cut rings along the seam (or via a pole for rings that
//!   encircle one).
//! - `Circle`: keep only points within `radius` of the rotated origin,
//!   closing cut rings along the clip circle.
//!
//! The output is still spherical; projection happens afterwards.

use glam::DVec3;
use std::f64::consts::{FRAC_PI_2, PI, TAU};

const EPSILON: f64 = 1e-6;
/// Angular step used when walking along a seam, pole or clip circle.
const SEAM_STEP: f64 = PI / 90.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Clip {
    Antimeridian,
    /// Small circle of the given angular radius (radians) around the origin.
    Circle { radius: f64 },
}

/// A run of points cut from a line or ring.
#[derive(Debug, Clone)]
struct Piece {
    points: Vec<[f64; 2]>,
}

fn cartesian(p: [f64; 2]) -> DVec3 {
    let cos_phi = p[1].cos();
    DVec3::new(p[0].cos() * cos_phi, p[0].sin() * cos_phi, p[1].sin())
}

fn spherical(v: DVec3) -> [f64; 2] {
    [v.y.atan2(v.x), v.z.clamp(-1.0, 1.0).asin()]
}

fn side_of(lambda: f64) -> f64 {
    if lambda < 0.0 {
        -PI
    } else {
        PI
    }
}

/// Latitude where the great-circle arc between two points crosses the
/// antimeridian.
fn antimeridian_intersect(a: [f64; 2], b: [f64; 2]) -> f64 {
    let sin_l0_l1 = (a[0] - b[0]).sin();
    if sin_l0_l1.abs() > EPSILON {
        let cos_phi0 = a[1].cos();
        let cos_phi1 = b[1].cos();
        ((a[1].sin() * cos_phi1 * b[0].sin() - b[1].sin() * cos_phi0 * a[0].sin())
            / (cos_phi0 * cos_phi1 * sin_l0_l1))
            .atan()
    } else {
        (a[1] + b[1]) / 2.0
    }
}

/// Points walking along a meridian `lambda` from `from` to `to` latitude.
fn walk_meridian(lambda: f64, from: f64, to: f64, out: &mut Vec<[f64; 2]>) {
    let steps = ((to - from).abs() / SEAM_STEP).ceil().max(1.0) as usize;
    for i in 1..=steps {
        let t = i as f64 / steps as f64;
        out.push([lambda, from + (to - from) * t]);
    }
}

/// Points walking along a parallel `phi` from `from` to `to` longitude.
fn walk_parallel(phi: f64, from: f64, to: f64, out: &mut Vec<[f64; 2]>) {
    let steps = ((to - from).abs() / SEAM_STEP).ceil().max(1.0) as usize;
    for i in 1..=steps {
        let t = i as f64 / steps as f64;
        out.push([from + (to - from) * t, phi]);
    }
}

impl Clip {
    /// Whether a single rotated point survives clipping.
    pub fn visible(&self, p: [f64; 2]) -> bool {
        match self {
            Clip::Antimeridian => p[0].is_finite() && p[1].is_finite(),
            Clip::Circle { radius } => p[0].cos() * p[1].cos() > radius.cos() - EPSILON,
        }
    }

    /// Cuts an open line into visible runs.
    pub fn line(&self, points: &[[f64; 2]]) -> Vec<Vec<[f64; 2]>> {
        match self {
            Clip::Antimeridian => split_antimeridian(points, false)
                .into_iter()
                .map(|piece| piece.points)
                .collect(),
            Clip::Circle { radius } => split_circle(points, *radius, false)
                .0
                .into_iter()
                .map(|piece| piece.points)
                .collect(),
        }
    }

    /// Cuts a closed ring (first point need not repeat) into closed rings.
    pub fn ring(&self, points: &[[f64; 2]]) -> Vec<Vec<[f64; 2]>> {
        if points.len() < 3 {
            return Vec::new();
        }
        match self {
            Clip::Antimeridian => close_antimeridian(split_antimeridian(points, true)),
            Clip::Circle { radius } => {
                let (pieces, cut) = split_circle(points, *radius, true);
                if cut {
                    close_circle(pieces, *radius)
                } else {
                    pieces.into_iter().map(|piece| piece.points).collect()
                }
            }
        }
    }

    /// Outline of the whole visible sphere, as a closed ring.
    pub fn sphere(&self) -> Vec<[f64; 2]> {
        match self {
            Clip::Antimeridian => {
                let south = -FRAC_PI_2 + EPSILON;
                let north = FRAC_PI_2 - EPSILON;
                let mut ring = vec![[-PI, south]];
                walk_meridian(-PI, south, north, &mut ring);
                walk_parallel(north, -PI, PI, &mut ring);
                walk_meridian(PI, north, south, &mut ring);
                walk_parallel(south, PI, -PI, &mut ring);
                ring.pop();
                ring
            }
            Clip::Circle { radius } => {
                let steps = (TAU / SEAM_STEP).ceil() as usize;
                (0..steps)
                    .map(|i| circle_point(*radius, i as f64 / steps as f64 * TAU))
                    .collect()
            }
        }
    }
}

fn split_antimeridian(points: &[[f64; 2]], closed: bool) -> Vec<Piece> {
    let mut pieces = Vec::new();
    let mut current: Vec<[f64; 2]> = Vec::new();
    let n = points.len();
    let edges = if closed { n } else { n.saturating_sub(1) };

    if let Some(first) = points.first() {
        current.push(*first);
    }
    for i in 0..edges {
        let a = points[i];
        let b = points[(i + 1) % n];
        if (b[0] - a[0]).abs() > PI {
            let phi = antimeridian_intersect(a, b);
            current.push([side_of(a[0]), phi]);
            pieces.push(Piece {
                points: std::mem::take(&mut current),
            });
            current.push([side_of(b[0]), phi]);
        }
        if closed && i + 1 == n {
            break;
        }
        current.push(b);
    }

    if closed && !pieces.is_empty() {
        // The ring wraps: the trailing run continues into the first piece.
        let mut head = pieces.remove(0);
        current.append(&mut head.points);
        pieces.push(Piece { points: current });
    } else if !current.is_empty() {
        pieces.push(Piece { points: current });
    }
    pieces
}

fn close_antimeridian(pieces: Vec<Piece>) -> Vec<Vec<[f64; 2]>> {
    let mut rings = Vec::with_capacity(pieces.len());
    for piece in pieces {
        let mut points = piece.points;
        let (Some(&start), Some(&end)) = (points.first(), points.last()) else {
            continue;
        };
        let cut = (start[0].abs() - PI).abs() < EPSILON && (end[0].abs() - PI).abs() < EPSILON;
        if !cut || points.len() < 2 {
            rings.push(points);
            continue;
        }
        if (start[0] - end[0]).abs() < EPSILON {
            // Same side: close along the seam.
            walk_meridian(end[0], end[1], start[1], &mut points);
        } else {
            // Opposite sides: the ring encircles a pole.
            let mean_phi = points.iter().map(|p| p[1]).sum::<f64>() / points.len() as f64;
            let pole = if mean_phi < 0.0 {
                -FRAC_PI_2 + EPSILON
            } else {
                FRAC_PI_2 - EPSILON
            };
            walk_meridian(end[0], end[1], pole, &mut points);
            walk_parallel(pole, end[0], start[0], &mut points);
            walk_meridian(start[0], pole, start[1], &mut points);
        }
        points.pop();
        rings.push(points);
    }
    rings
}

fn circle_point(radius: f64, azimuth: f64) -> [f64; 2] {
    let (s, c) = radius.sin_cos();
    spherical(DVec3::new(c, s * azimuth.cos(), s * azimuth.sin()))
}

fn azimuth_of(p: [f64; 2]) -> f64 {
    let v = cartesian(p);
    v.z.atan2(v.y)
}

/// Point where the arc from `inside` to `outside` meets the clip circle.
fn circle_intersect(inside: [f64; 2], outside: [f64; 2], radius: f64) -> [f64; 2] {
    let a = cartesian(inside);
    let b = cartesian(outside);
    let target = radius.cos();
    let (mut lo, mut hi) = (0.0, 1.0);
    for _ in 0..40 {
        let mid = (lo + hi) / 2.0;
        let v = a.lerp(b, mid).normalize();
        if v.x > target {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    spherical(a.lerp(b, lo).normalize())
}

fn split_circle(points: &[[f64; 2]], radius: f64, closed: bool) -> (Vec<Piece>, bool) {
    let clip = Clip::Circle { radius };
    let n = points.len();
    let mut pieces = Vec::new();
    let mut current: Vec<[f64; 2]> = Vec::new();
    let edges = if closed { n } else { n.saturating_sub(1) };

    let Some(&first) = points.first() else {
        return (pieces, false);
    };
    let mut prev_visible = clip.visible(first);
    if prev_visible {
        current.push(first);
    }
    let mut any_cut = false;
    for i in 0..edges {
        let a = points[i];
        let b = points[(i + 1) % n];
        let b_visible = clip.visible(b);
        match (prev_visible, b_visible) {
            (true, false) => {
                current.push(circle_intersect(a, b, radius));
                pieces.push(Piece {
                    points: std::mem::take(&mut current),
                });
                any_cut = true;
            }
            (false, true) => {
                current.push(circle_intersect(b, a, radius));
                any_cut = true;
            }
            _ => {}
        }
        if b_visible && !(closed && i + 1 == n) {
            current.push(b);
        }
        prev_visible = b_visible;
    }

    if closed && any_cut && !pieces.is_empty() && clip.visible(first) {
        let mut head = pieces.remove(0);
        current.append(&mut head.points);
    }
    if !current.is_empty() {
        pieces.push(Piece { points: current });
    }
    (pieces, any_cut)
}

fn close_circle(pieces: Vec<Piece>, radius: f64) -> Vec<Vec<[f64; 2]>> {
    if pieces.len() <= 1 {
        return pieces
            .into_iter()
            .filter(|p| p.points.len() >= 2)
            .map(|p| {
                let mut points = p.points;
                if let (Some(&start), Some(&end)) = (points.first(), points.last()) {
                    walk_circle(radius, azimuth_of(end), azimuth_of(start), &mut points);
                }
                points
            })
            .collect();
    }

    // Join each piece to the next along the clip circle, forming one ring.
    let mut ring = Vec::new();
    let count = pieces.len();
    for (i, piece) in pieces.iter().enumerate() {
        ring.extend_from_slice(&piece.points);
        let next = &pieces[(i + 1) % count];
        if let (Some(&end), Some(&start)) = (piece.points.last(), next.points.first()) {
            walk_circle(radius, azimuth_of(end), azimuth_of(start), &mut ring);
        }
    }
    vec![ring]
}

/// Walks the clip circle the short way between two azimuths.
fn walk_circle(radius: f64, from: f64, to: f64, out: &mut Vec<[f64; 2]>) {
    let mut delta = to - from;
    if delta > PI {
        delta -= TAU;
    } else if delta < -PI {
        delta += TAU;
    }
    let steps = (delta.abs() / SEAM_STEP).ceil() as usize;
    for i in 1..steps {
        out.push(circle_point(radius, from + delta * i as f64 / steps as f64));
    }
}
