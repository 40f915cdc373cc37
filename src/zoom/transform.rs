//! The camera transform `translate(x, y) scale(k)` and its constraints.

use crate::geo::{ScaleExtent, TranslateExtent};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Screen point = map point * k + (x, y).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub x: f64,
    pub y: f64,
    pub k: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        x: 0.0,
        y: 0.0,
        k: 1.0,
    };

    pub const fn new(x: f64, y: f64, k: f64) -> Self {
        Self { x, y, k }
    }

    pub fn apply(&self, p: [f64; 2]) -> [f64; 2] {
        [p[0] * self.k + self.x, p[1] * self.k + self.y]
    }

    pub fn invert(&self, p: [f64; 2]) -> [f64; 2] {
        [self.invert_x(p[0]), self.invert_y(p[1])]
    }

    pub fn invert_x(&self, x: f64) -> f64 {
        (x - self.x) / self.k
    }

    pub fn invert_y(&self, y: f64) -> f64 {
        (y - self.y) / self.k
    }

    /// Composes a further scale by `k`.
    pub fn scale(&self, k: f64) -> Self {
        Self::new(self.x, self.y, self.k * k)
    }

    /// Composes a translation by `(dx, dy)` in map units.
    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + self.k * dx, self.y + self.k * dy, self.k)
    }

    /// Same translation, scale replaced by `k` clamped into `extent`.
    pub fn with_scale(&self, k: f64, extent: &ScaleExtent) -> Self {
        Self::new(self.x, self.y, extent.clamp(k))
    }

    /// Moves the translation so map point `map` lands on screen point
    /// `screen`.
    pub fn anchor(&self, screen: [f64; 2], map: [f64; 2]) -> Self {
        Self::new(screen[0] - map[0] * self.k, screen[1] - map[1] * self.k, self.k)
    }

    /// SVG `transform` attribute value.
    pub fn to_svg_transform(&self) -> String {
        format!("translate({} {}) scale({})", self.x, self.y, self.k)
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "translate({}, {}) scale({})", self.x, self.y, self.k)
    }
}

/// Picks the shift along one axis that keeps the viewport inside the
/// translate extent; centres it when the extent is smaller than the view.
fn axis_shift(d0: f64, d1: f64) -> f64 {
    if d1 > d0 {
        (d0 + d1) / 2.0
    } else {
        let low = d0.min(0.0);
        if low != 0.0 {
            low
        } else {
            d1.max(0.0)
        }
    }
}

/// Clamps the scale into `scale_extent`, then shifts the translation so the
/// viewport `[[0, 0], [width, height]]` seen through the transform stays
/// inside `translate_extent`.
pub fn constrain(
    t: Transform,
    viewport: [[f64; 2]; 2],
    scale_extent: &ScaleExtent,
    translate_extent: &TranslateExtent,
) -> Transform {
    let t = t.with_scale(t.k, scale_extent);
    if translate_extent.is_unbounded() {
        return t;
    }
    let [[ex0, ey0], [ex1, ey1]] = viewport;
    let [tx0, ty0] = translate_extent.top_left;
    let [tx1, ty1] = translate_extent.bottom_right;
    let dx0 = t.invert_x(ex0) - tx0;
    let dx1 = t.invert_x(ex1) - tx1;
    let dy0 = t.invert_y(ey0) - ty0;
    let dy1 = t.invert_y(ey1) - ty1;
    let dx = axis_shift(dx0, dx1);
    let dy = axis_shift(dy0, dy1);
    if dx.is_finite() && dy.is_finite() {
        t.translate(dx, dy)
    } else {
        t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEW: [[f64; 2]; 2] = [[0.0, 0.0], [800.0, 600.0]];

    #[test]
    fn test_apply_invert() {
        let t = Transform::new(10.0, -20.0, 2.0);
        let p = t.apply([3.0, 4.0]);
        assert_eq!(p, [16.0, -12.0]);
        assert_eq!(t.invert(p), [3.0, 4.0]);
    }

    #[test]
    fn test_svg_transform() {
        assert_eq!(
            Transform::new(-400.0, 12.5, 2.0).to_svg_transform(),
            "translate(-400 12.5) scale(2)"
        );
        assert_eq!(
            Transform::IDENTITY.to_svg_transform(),
            "translate(0 0) scale(1)"
        );
    }

    #[test]
    fn test_constrain_clamps_scale() {
        let extent = ScaleExtent::new(1.0, 8.0);
        let t = constrain(
            Transform::new(0.0, 0.0, 20.0),
            VIEW,
            &extent,
            &TranslateExtent::unbounded(),
        );
        assert_eq!(t.k, 8.0);
        let t = constrain(
            Transform::new(0.0, 0.0, 0.1),
            VIEW,
            &extent,
            &TranslateExtent::unbounded(),
        );
        assert_eq!(t.k, 1.0);
    }

    #[test]
    fn test_constrain_keeps_view_inside_extent() {
        let extent = TranslateExtent::new([0.0, 0.0], [800.0, 600.0]);
        // Panned far right at zoom 2: the left edge must not go past 0.
        let t = constrain(
            Transform::new(500.0, 0.0, 2.0),
            VIEW,
            &ScaleExtent::default(),
            &extent,
        );
        assert!(t.invert_x(0.0) >= -1e-9);
        assert!(t.invert_x(800.0) <= 800.0 + 1e-9);

        let t = constrain(
            Transform::new(-5000.0, -5000.0, 2.0),
            VIEW,
            &ScaleExtent::default(),
            &extent,
        );
        assert!((t.invert_x(800.0) - 800.0).abs() < 1e-9);
        assert!((t.invert_y(600.0) - 600.0).abs() < 1e-9);
    }

    #[test]
    fn test_constrain_centres_small_extent() {
        let extent = TranslateExtent::new([0.0, 0.0], [400.0, 300.0]);
        let t = constrain(
            Transform::new(123.0, 45.0, 1.0),
            VIEW,
            &ScaleExtent::default(),
            &extent,
        );
        // The 400x300 extent sits in the middle of the 800x600 view.
        assert!((t.x - 200.0).abs() < 1e-9);
        assert!((t.y - 150.0).abs() < 1e-9);
    }
}
