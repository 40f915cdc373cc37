//! Raw (unit-sphere, unscaled) projection formulas.
//!
//! Inputs are rotated `(lambda, phi)` in radians; outputs are planar units
//! before scale/translate. `y` grows northward here and is flipped by the
//! scale-translate step.

use super::rotation::Rotation;
use std::f64::consts::{FRAC_PI_2, PI};
use std::fmt;
use std::sync::Arc;

const EPSILON: f64 = 1e-6;

/// A raw projection on the unit sphere.
pub trait RawProjection: fmt::Debug + Send + Sync {
    fn forward(&self, lambda: f64, phi: f64) -> [f64; 2];

    /// Inverse mapping; `None` outside the projectable domain.
    fn invert(&self, x: f64, y: f64) -> Option<[f64; 2]>;
}

/// Builds a conic raw projection from its two standard parallels (radians).
pub type ConicFactory = fn(f64, f64) -> Arc<dyn RawProjection>;

fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

fn finite(p: [f64; 2]) -> Option<[f64; 2]> {
    (p[0].is_finite() && p[1].is_finite()).then_some(p)
}

#[derive(Debug, Clone, Copy)]
pub struct Equirectangular;

impl RawProjection for Equirectangular {
    fn forward(&self, lambda: f64, phi: f64) -> [f64; 2] {
        [lambda, phi]
    }

    fn invert(&self, x: f64, y: f64) -> Option<[f64; 2]> {
        finite([x, y])
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Mercator;

impl RawProjection for Mercator {
    fn forward(&self, lambda: f64, phi: f64) -> [f64; 2] {
        [lambda, ((FRAC_PI_2 + phi) / 2.0).tan().ln()]
    }

    fn invert(&self, x: f64, y: f64) -> Option<[f64; 2]> {
        finite([x, 2.0 * y.exp().atan() - FRAC_PI_2])
    }
}

/// Transverse Mercator with the quarter-turn roll folded in, so the
/// central meridian runs vertically without an explicit gamma rotation.
#[derive(Debug, Clone, Copy)]
pub struct TransverseMercator {
    roll: Rotation,
}

impl TransverseMercator {
    pub fn new() -> Self {
        Self {
            roll: Rotation::new(0.0, 0.0, FRAC_PI_2),
        }
    }
}

impl Default for TransverseMercator {
    fn default() -> Self {
        Self::new()
    }
}

impl RawProjection for TransverseMercator {
    fn forward(&self, lambda: f64, phi: f64) -> [f64; 2] {
        let [l, p] = self.roll.forward(lambda, phi);
        [((FRAC_PI_2 + p) / 2.0).tan().ln(), -l]
    }

    fn invert(&self, x: f64, y: f64) -> Option<[f64; 2]> {
        let [l, p] = finite([-y, 2.0 * x.exp().atan() - FRAC_PI_2])?;
        finite(self.roll.invert(l, p))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EqualEarth;

impl EqualEarth {
    const A1: f64 = 1.340264;
    const A2: f64 = -0.081106;
    const A3: f64 = 0.000893;
    const A4: f64 = 0.003796;
    const ITERATIONS: usize = 12;

    fn m() -> f64 {
        3f64.sqrt() / 2.0
    }
}

impl RawProjection for EqualEarth {
    fn forward(&self, lambda: f64, phi: f64) -> [f64; 2] {
        let (a1, a2, a3, a4) = (Self::A1, Self::A2, Self::A3, Self::A4);
        let l = (Self::m() * phi.sin()).asin();
        let l2 = l * l;
        let l6 = l2 * l2 * l2;
        [
            lambda * l.cos() / (Self::m() * (a1 + 3.0 * a2 * l2 + l6 * (7.0 * a3 + 9.0 * a4 * l2))),
            l * (a1 + a2 * l2 + l6 * (a3 + a4 * l2)),
        ]
    }

    fn invert(&self, x: f64, y: f64) -> Option<[f64; 2]> {
        let (a1, a2, a3, a4) = (Self::A1, Self::A2, Self::A3, Self::A4);
        let mut l = y;
        let mut l2 = l * l;
        let mut l6 = l2 * l2 * l2;
        for _ in 0..Self::ITERATIONS {
            let fy = l * (a1 + a2 * l2 + l6 * (a3 + a4 * l2)) - y;
            let fpy = a1 + 3.0 * a2 * l2 + l6 * (7.0 * a3 + 9.0 * a4 * l2);
            let delta = fy / fpy;
            l -= delta;
            l2 = l * l;
            l6 = l2 * l2 * l2;
            if delta.abs() < 1e-12 {
                break;
            }
        }
        finite([
            Self::m() * x * (a1 + 3.0 * a2 * l2 + l6 * (7.0 * a3 + 9.0 * a4 * l2)) / l.cos(),
            (l.sin() / Self::m()).asin(),
        ])
    }
}

#[derive(Debug, Clone, Copy)]
pub struct NaturalEarth1;

impl RawProjection for NaturalEarth1 {
    fn forward(&self, lambda: f64, phi: f64) -> [f64; 2] {
        let phi2 = phi * phi;
        let phi4 = phi2 * phi2;
        [
            lambda
                * (0.8707 - 0.131979 * phi2
                    + phi4 * (-0.013791 + phi4 * (0.003971 * phi2 - 0.001529 * phi4))),
            phi * (1.007226
                + phi2 * (0.015085 + phi4 * (-0.044475 + 0.028874 * phi2 - 0.005916 * phi4))),
        ]
    }

    fn invert(&self, x: f64, y: f64) -> Option<[f64; 2]> {
        let mut phi = y;
        for _ in 0..25 {
            let phi2 = phi * phi;
            let phi4 = phi2 * phi2;
            let delta = (phi
                * (1.007226
                    + phi2 * (0.015085 + phi4 * (-0.044475 + 0.028874 * phi2 - 0.005916 * phi4)))
                - y)
                / (1.007226
                    + phi2
                        * (0.015085 * 3.0
                            + phi4
                                * (-0.044475 * 7.0 + 0.028874 * 9.0 * phi2
                                    - 0.005916 * 11.0 * phi4)));
            phi -= delta;
            if delta.abs() <= EPSILON {
                break;
            }
        }
        let phi2 = phi * phi;
        finite([
            x / (0.8707
                + phi2 * (-0.131979 + phi2 * (-0.013791 + phi2 * phi2 * phi2 * (0.003971 - 0.001529 * phi2)))),
            phi,
        ])
    }
}

/// Family of azimuthal projections, parameterized by their radial scale
/// and inverse angle functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Azimuthal {
    Orthographic,
    Stereographic,
    Gnomonic,
    EqualArea,
    Equidistant,
}

impl Azimuthal {
    fn radial_scale(&self, cxcy: f64) -> f64 {
        match self {
            Azimuthal::Orthographic => 1.0,
            Azimuthal::Stereographic => 1.0 / (1.0 + cxcy),
            Azimuthal::Gnomonic => 1.0 / cxcy,
            Azimuthal::EqualArea => (2.0 / (1.0 + cxcy)).sqrt(),
            Azimuthal::Equidistant => {
                let c = cxcy.clamp(-1.0, 1.0).acos();
                if c == 0.0 {
                    1.0
                } else {
                    c / c.sin()
                }
            }
        }
    }

    fn angle(&self, z: f64) -> f64 {
        match self {
            Azimuthal::Orthographic => z.asin(),
            Azimuthal::Stereographic => 2.0 * z.atan(),
            Azimuthal::Gnomonic => z.atan(),
            Azimuthal::EqualArea => 2.0 * (z / 2.0).asin(),
            Azimuthal::Equidistant => z,
        }
    }
}

impl RawProjection for Azimuthal {
    fn forward(&self, lambda: f64, phi: f64) -> [f64; 2] {
        let cx = lambda.cos();
        let cy = phi.cos();
        let k = self.radial_scale(cx * cy);
        if k.is_infinite() {
            return [2.0, 0.0];
        }
        [k * cy * lambda.sin(), k * phi.sin()]
    }

    fn invert(&self, x: f64, y: f64) -> Option<[f64; 2]> {
        let z = (x * x + y * y).sqrt();
        let c = self.angle(z);
        let sc = c.sin();
        let cc = c.cos();
        let phi = if z == 0.0 { 0.0 } else { (y * sc / z).asin() };
        finite([(x * sc).atan2(z * cc), phi])
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CylindricalEqualArea {
    cos_phi0: f64,
}

impl RawProjection for CylindricalEqualArea {
    fn forward(&self, lambda: f64, phi: f64) -> [f64; 2] {
        [lambda * self.cos_phi0, phi.sin() / self.cos_phi0]
    }

    fn invert(&self, x: f64, y: f64) -> Option<[f64; 2]> {
        finite([x / self.cos_phi0, (y * self.cos_phi0).asin()])
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ConicEqualArea {
    n: f64,
    c: f64,
    r0: f64,
}

pub fn conic_equal_area(y0: f64, y1: f64) -> Arc<dyn RawProjection> {
    let sy0 = y0.sin();
    let n = (sy0 + y1.sin()) / 2.0;
    if n.abs() < EPSILON {
        return Arc::new(CylindricalEqualArea { cos_phi0: y0.cos() });
    }
    let c = 1.0 + sy0 * (2.0 * n - sy0);
    Arc::new(ConicEqualArea {
        n,
        c,
        r0: c.sqrt() / n,
    })
}

impl RawProjection for ConicEqualArea {
    fn forward(&self, lambda: f64, phi: f64) -> [f64; 2] {
        let r = (self.c - 2.0 * self.n * phi.sin()).sqrt() / self.n;
        let x = lambda * self.n;
        [r * x.sin(), self.r0 - r * x.cos()]
    }

    fn invert(&self, x: f64, y: f64) -> Option<[f64; 2]> {
        let r0y = self.r0 - y;
        let mut l = x.atan2(r0y.abs()) * sign(r0y);
        if r0y * self.n < 0.0 {
            l -= PI * sign(x) * sign(r0y);
        }
        finite([
            l / self.n,
            ((self.c - (x * x + r0y * r0y) * self.n * self.n) / (2.0 * self.n)).asin(),
        ])
    }
}

fn tany(y: f64) -> f64 {
    ((FRAC_PI_2 + y) / 2.0).tan()
}

#[derive(Debug, Clone, Copy)]
pub struct ConicConformal {
    n: f64,
    f: f64,
}

pub fn conic_conformal(y0: f64, y1: f64) -> Arc<dyn RawProjection> {
    let cy0 = y0.cos();
    let n = if y0 == y1 {
        y0.sin()
    } else {
        (cy0 / y1.cos()).ln() / (tany(y1) / tany(y0)).ln()
    };
    if n == 0.0 || !n.is_finite() {
        return Arc::new(Mercator);
    }
    let f = cy0 * tany(y0).powf(n) / n;
    Arc::new(ConicConformal { n, f })
}

impl RawProjection for ConicConformal {
    fn forward(&self, lambda: f64, mut phi: f64) -> [f64; 2] {
        if self.f > 0.0 {
            if phi < -FRAC_PI_2 + EPSILON {
                phi = -FRAC_PI_2 + EPSILON;
            }
        } else if phi > FRAC_PI_2 - EPSILON {
            phi = FRAC_PI_2 - EPSILON;
        }
        let r = self.f / tany(phi).powf(self.n);
        [r * (self.n * lambda).sin(), self.f - r * (self.n * lambda).cos()]
    }

    fn invert(&self, x: f64, y: f64) -> Option<[f64; 2]> {
        let fy = self.f - y;
        let r = sign(self.n) * (x * x + fy * fy).sqrt();
        let mut l = x.atan2(fy.abs()) * sign(fy);
        if fy * self.n < 0.0 {
            l -= PI * sign(x) * sign(fy);
        }
        finite([
            l / self.n,
            2.0 * (self.f / r).powf(1.0 / self.n).atan() - FRAC_PI_2,
        ])
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ConicEquidistant {
    n: f64,
    g: f64,
}

pub fn conic_equidistant(y0: f64, y1: f64) -> Arc<dyn RawProjection> {
    let cy0 = y0.cos();
    let n = if y0 == y1 {
        y0.sin()
    } else {
        (cy0 - y1.cos()) / (y1 - y0)
    };
    if n.abs() < EPSILON {
        return Arc::new(Equirectangular);
    }
    Arc::new(ConicEquidistant { n, g: cy0 / n + y0 })
}

impl RawProjection for ConicEquidistant {
    fn forward(&self, lambda: f64, phi: f64) -> [f64; 2] {
        let gy = self.g - phi;
        let nx = self.n * lambda;
        [gy * nx.sin(), self.g - gy * nx.cos()]
    }

    fn invert(&self, x: f64, y: f64) -> Option<[f64; 2]> {
        let gy = self.g - y;
        let mut l = x.atan2(gy.abs()) * sign(gy);
        if gy * self.n < 0.0 {
            l -= PI * sign(x) * sign(gy);
        }
        finite([l / self.n, self.g - sign(self.n) * (x * x + gy * gy).sqrt()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_round_trip(raw: &dyn RawProjection, lambda: f64, phi: f64) {
        let [x, y] = raw.forward(lambda, phi);
        let back = raw.invert(x, y).expect("invertible");
        assert!(
            (back[0] - lambda).abs() < 1e-6 && (back[1] - phi).abs() < 1e-6,
            "{:?}: ({}, {}) -> {:?}",
            raw,
            lambda,
            phi,
            back
        );
    }

    #[test]
    fn test_round_trips() {
        let samples = [(0.0, 0.0), (0.5, 0.3), (-1.2, -0.8), (2.0, 1.0)];
        let raws: Vec<Arc<dyn RawProjection>> = vec![
            Arc::new(Equirectangular),
            Arc::new(Mercator),
            Arc::new(TransverseMercator::new()),
            Arc::new(EqualEarth),
            Arc::new(NaturalEarth1),
            conic_equal_area(0.0, PI / 3.0),
            conic_conformal(PI / 6.0, PI / 6.0),
            conic_equidistant(0.0, PI / 3.0),
        ];
        for raw in &raws {
            for &(lambda, phi) in &samples {
                assert_round_trip(raw.as_ref(), lambda, phi);
            }
        }
    }

    #[test]
    fn test_azimuthal_round_trips_near_center() {
        for az in [
            Azimuthal::Orthographic,
            Azimuthal::Stereographic,
            Azimuthal::Gnomonic,
            Azimuthal::EqualArea,
            Azimuthal::Equidistant,
        ] {
            assert_round_trip(&az, 0.3, -0.4);
        }
    }

    #[test]
    fn test_orthographic_invert_outside_disk() {
        assert!(Azimuthal::Orthographic.invert(1.5, 0.0).is_none());
    }

    #[test]
    fn test_conic_falls_back_when_degenerate() {
        let raw = conic_equal_area(0.0, 0.0);
        let [x, y] = raw.forward(0.5, 0.5);
        assert!((x - 0.5).abs() < 1e-9);
        assert!((y - 0.5f64.sin()).abs() < 1e-9);
    }
}
