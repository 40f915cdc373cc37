//! Graticule: the grid of meridians and parallels drawn behind a map.

use super::coords::GraticuleStep;
use geojson::{Geometry, Value};

const EPSILON: f64 = 1e-6;

/// Meridian/parallel grid generator.
///
/// Minor lines use `step` within the minor extent (parallels stop at +/-80);
/// major meridians run the full +/-90 and every 90 degrees.
#[derive(Debug, Clone, PartialEq)]
pub struct Graticule {
    step: GraticuleStep,
    major_step: [f64; 2],
    minor_extent: [[f64; 2]; 2],
    major_extent: [[f64; 2]; 2],
    precision: f64,
}

impl Default for Graticule {
    fn default() -> Self {
        Self::new(GraticuleStep::default())
    }
}

/// `start, start + step, ...` strictly below `stop`.
fn range(start: f64, stop: f64, step: f64) -> Vec<f64> {
    if step <= 0.0 || !step.is_finite() {
        return Vec::new();
    }
    let n = ((stop - start) / step).ceil().max(0.0) as usize;
    (0..n).map(|i| start + i as f64 * step).collect()
}

fn meridian(x: f64, y0: f64, y1: f64, precision: f64) -> Vec<[f64; 2]> {
    let mut line: Vec<[f64; 2]> = range(y0, y1 - EPSILON, precision)
        .into_iter()
        .map(|y| [x, y])
        .collect();
    line.push([x, y1]);
    line
}

fn parallel(y: f64, x0: f64, x1: f64, precision: f64) -> Vec<[f64; 2]> {
    let mut line: Vec<[f64; 2]> = range(x0, x1 - EPSILON, precision)
        .into_iter()
        .map(|x| [x, y])
        .collect();
    line.push([x1, y]);
    line
}

impl Graticule {
    pub fn new(step: GraticuleStep) -> Self {
        Self {
            step,
            major_step: [90.0, 360.0],
            minor_extent: [[-180.0, -80.0 - EPSILON], [180.0, 80.0 + EPSILON]],
            major_extent: [[-180.0, -90.0 + EPSILON], [180.0, 90.0 - EPSILON]],
            precision: 2.5,
        }
    }

    pub fn step(&self) -> GraticuleStep {
        self.step
    }

    /// All grid lines in degrees.
    pub fn lines(&self) -> Vec<Vec<[f64; 2]>> {
        let [dx, dy] = self.step.0;
        let [mdx, mdy] = self.major_step;
        let [[x0, y0], [x1, y1]] = self.minor_extent;
        let [[mx0, my0], [mx1, my1]] = self.major_extent;
        let p = self.precision;

        let mut lines = Vec::new();
        for x in range((mx0 / mdx).ceil() * mdx, mx1, mdx) {
            lines.push(meridian(x, my0, my1, p));
        }
        for y in range((my0 / mdy).ceil() * mdy, my1, mdy) {
            lines.push(parallel(y, mx0, mx1, p));
        }
        for x in range((x0 / dx).ceil() * dx, x1, dx) {
            if (x % mdx).abs() > EPSILON {
                lines.push(meridian(x, y0, y1, p));
            }
        }
        for y in range((y0 / dy).ceil() * dy, y1, dy) {
            if (y % mdy).abs() > EPSILON {
                lines.push(parallel(y, x0, x1, p));
            }
        }
        lines
    }

    /// The grid as one MultiLineString geometry.
    pub fn geometry(&self) -> Geometry {
        let lines = self
            .lines()
            .into_iter()
            .map(|line| line.into_iter().map(|p| p.to_vec()).collect())
            .collect();
        Geometry::new(Value::MultiLineString(lines))
    }

    /// Polygon bounding the major extent.
    pub fn outline(&self) -> Geometry {
        let [[x0, y0], [x1, y1]] = self.major_extent;
        let p = self.precision;
        let mut ring = meridian(x0, y0, y1, p);
        ring.extend(parallel(y1, x0, x1, p).into_iter().skip(1));
        let mut back = meridian(x1, y0, y1, p);
        back.reverse();
        ring.extend(back.into_iter().skip(1));
        let mut bottom = parallel(y0, x0, x1, p);
        bottom.reverse();
        ring.extend(bottom.into_iter().skip(1));
        let ring = ring.into_iter().map(|p| p.to_vec()).collect();
        Geometry::new(Value::Polygon(vec![ring]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_line_count() {
        let lines = Graticule::default().lines();
        // 4 major meridians, the equator, 32 minor meridians, 16 minor parallels.
        assert_eq!(lines.len(), 4 + 1 + 32 + 16);
    }

    #[test]
    fn test_minor_parallels_stop_at_eighty() {
        let lines = Graticule::default().lines();
        let max_parallel = lines
            .iter()
            .filter(|l| l[0][1] == l[l.len() - 1][1])
            .map(|l| l[0][1].abs())
            .fold(0.0, f64::max);
        assert!((max_parallel - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_lines_end_on_extent() {
        for line in Graticule::new(GraticuleStep::new(30.0, 30.0)).lines() {
            let last = line[line.len() - 1];
            assert!(last[0].abs() <= 180.0 && last[1].abs() <= 90.0);
            assert!(line.len() >= 2);
        }
    }

    #[test]
    fn test_outline_is_closed() {
        match Graticule::default().outline().value {
            Value::Polygon(rings) => {
                let ring = &rings[0];
                assert_eq!(ring.first(), ring.last());
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
