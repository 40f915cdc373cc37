//! Three-axis spherical rotation, in radians.

use glam::DVec3;
use std::f64::consts::{PI, TAU};

/// Rotation by `[delta_lambda, delta_phi, delta_gamma]` (radians).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotation {
    delta_lambda: f64,
    cos_phi: f64,
    sin_phi: f64,
    cos_gamma: f64,
    sin_gamma: f64,
    tilted: bool,
}

fn wrap_lambda(mut lambda: f64) -> f64 {
    if lambda.abs() > PI {
        lambda -= (lambda / TAU).round() * TAU;
    }
    lambda
}

fn cartesian(lambda: f64, phi: f64) -> DVec3 {
    let cos_phi = phi.cos();
    DVec3::new(lambda.cos() * cos_phi, lambda.sin() * cos_phi, phi.sin())
}

impl Rotation {
    pub fn new(delta_lambda: f64, delta_phi: f64, delta_gamma: f64) -> Self {
        Self {
            delta_lambda: delta_lambda % TAU,
            cos_phi: delta_phi.cos(),
            sin_phi: delta_phi.sin(),
            cos_gamma: delta_gamma.cos(),
            sin_gamma: delta_gamma.sin(),
            tilted: delta_phi != 0.0 || delta_gamma != 0.0,
        }
    }

    /// Builds a rotation from angles in degrees.
    pub fn from_degrees(angles: [f64; 3]) -> Self {
        Self::new(
            angles[0].to_radians(),
            angles[1].to_radians(),
            angles[2].to_radians(),
        )
    }

    pub fn forward(&self, lambda: f64, phi: f64) -> [f64; 2] {
        let lambda = wrap_lambda(lambda + self.delta_lambda);
        if !self.tilted {
            return [lambda, phi];
        }
        let v = cartesian(lambda, phi);
        let k = v.z * self.cos_phi + v.x * self.sin_phi;
        [
            (v.y * self.cos_gamma - k * self.sin_gamma)
                .atan2(v.x * self.cos_phi - v.z * self.sin_phi),
            (k * self.cos_gamma + v.y * self.sin_gamma).clamp(-1.0, 1.0).asin(),
        ]
    }

    pub fn invert(&self, lambda: f64, phi: f64) -> [f64; 2] {
        let [lambda, phi] = if self.tilted {
            let v = cartesian(lambda, phi);
            let k = v.z * self.cos_gamma - v.y * self.sin_gamma;
            [
                (v.y * self.cos_gamma + v.z * self.sin_gamma)
                    .atan2(v.x * self.cos_phi + k * self.sin_phi),
                (k * self.cos_phi - v.x * self.sin_phi).clamp(-1.0, 1.0).asin(),
            ]
        } else {
            [lambda, phi]
        };
        [wrap_lambda(lambda - self.delta_lambda), phi]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_rotation() {
        let r = Rotation::new(0.0, 0.0, 0.0);
        assert_eq!(r.forward(0.5, 0.25), [0.5, 0.25]);
    }

    #[test]
    fn test_lambda_wraps() {
        let r = Rotation::from_degrees([90.0, 0.0, 0.0]);
        let [lambda, _] = r.forward(170f64.to_radians(), 0.0);
        assert!((lambda.to_degrees() - -100.0).abs() < 1e-9);
    }

    #[test]
    fn test_round_trip_tilted() {
        let r = Rotation::from_degrees([-30.0, 45.0, 10.0]);
        let p = [0.4, -0.7];
        let f = r.forward(p[0], p[1]);
        let back = r.invert(f[0], f[1]);
        assert!((back[0] - p[0]).abs() < 1e-9);
        assert!((back[1] - p[1]).abs() < 1e-9);
    }

    #[test]
    fn test_tilt_moves_pole() {
        // Tilting by -90 degrees brings the north pole to the rotated origin.
        let r = Rotation::from_degrees([0.0, -90.0, 0.0]);
        let [_, phi] = r.forward(0.0, std::f64::consts::FRAC_PI_2);
        assert!(phi.abs() < 1e-9);
    }
}
