//! Strongly-typed geographic primitives.
//!
//! Longitude and latitude are distinct newtypes so the compiler rejects
//! swapped arguments. Extents and rotation triples get their own wrappers
//! for the same reason.

use geo_types::Coord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Longitude in degrees.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Longitude(pub f64);

/// Latitude in degrees.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Latitude(pub f64);

impl Longitude {
    pub fn degrees(self) -> f64 {
        self.0
    }
}

impl Latitude {
    pub fn degrees(self) -> f64 {
        self.0
    }
}

/// A `(longitude, latitude)` pair. Serializes as `[lon, lat]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinates {
    pub lon: Longitude,
    pub lat: Latitude,
}

impl Coordinates {
    pub const fn new(lon: Longitude, lat: Latitude) -> Self {
        Self { lon, lat }
    }

    /// Builds coordinates from raw degrees, longitude first.
    pub const fn from_lon_lat(lon: f64, lat: f64) -> Self {
        Self::new(Longitude(lon), Latitude(lat))
    }

    /// Builds coordinates with longitude wrapped and latitude clamped.
    pub fn normalized(lon: f64, lat: f64) -> Self {
        super::convert::create_normalized_coordinates(lon, lat)
    }

    pub fn lon(&self) -> f64 {
        self.lon.0
    }

    pub fn lat(&self) -> f64 {
        self.lat.0
    }

    pub fn to_array(self) -> [f64; 2] {
        [self.lon.0, self.lat.0]
    }

    /// True when both parts are finite and inside their geographic range.
    pub fn is_valid(&self) -> bool {
        self.lon.0.is_finite()
            && self.lat.0.is_finite()
            && self.lon.0.abs() <= 180.0
            && self.lat.0.abs() <= 90.0
    }
}

impl From<[f64; 2]> for Coordinates {
    fn from(value: [f64; 2]) -> Self {
        Self::from_lon_lat(value[0], value[1])
    }
}

impl From<Coordinates> for [f64; 2] {
    fn from(value: Coordinates) -> Self {
        value.to_array()
    }
}

impl From<Coordinates> for Coord<f64> {
    fn from(value: Coordinates) -> Self {
        Coord {
            x: value.lon.0,
            y: value.lat.0,
        }
    }
}

impl From<Coord<f64>> for Coordinates {
    fn from(value: Coord<f64>) -> Self {
        Self::from_lon_lat(value.x, value.y)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.4}, {:.4})", self.lon.0, self.lat.0)
    }
}

/// Permitted zoom range `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleExtent {
    pub min: f64,
    pub max: f64,
}

impl ScaleExtent {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, k: f64) -> f64 {
        k.max(self.min).min(self.max)
    }
}

impl Default for ScaleExtent {
    fn default() -> Self {
        Self::new(1.0, 8.0)
    }
}

/// Permitted pan range in transform (pixel) space: top-left and bottom-right.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TranslateExtent {
    pub top_left: [f64; 2],
    pub bottom_right: [f64; 2],
}

impl TranslateExtent {
    pub fn new(top_left: [f64; 2], bottom_right: [f64; 2]) -> Self {
        Self {
            top_left,
            bottom_right,
        }
    }

    pub fn unbounded() -> Self {
        Self::new(
            [f64::NEG_INFINITY, f64::NEG_INFINITY],
            [f64::INFINITY, f64::INFINITY],
        )
    }

    pub fn is_unbounded(&self) -> bool {
        self.top_left.iter().all(|v| v.is_infinite())
            && self.bottom_right.iter().all(|v| v.is_infinite())
    }
}

impl Default for TranslateExtent {
    fn default() -> Self {
        Self::unbounded()
    }
}

/// Three-axis rotation `[lambda, phi, gamma]` in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RotationAngles(pub [f64; 3]);

impl RotationAngles {
    pub fn new(lambda: f64, phi: f64, gamma: f64) -> Self {
        Self([lambda, phi, gamma])
    }
}

/// Standard parallels of a conic projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Parallels(pub [f64; 2]);

impl Parallels {
    pub fn new(p1: f64, p2: f64) -> Self {
        Self([p1, p2])
    }
}

/// Graticule spacing `[longitude step, latitude step]` in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GraticuleStep(pub [f64; 2]);

impl GraticuleStep {
    pub fn new(x: f64, y: f64) -> Self {
        Self([x, y])
    }
}

impl Default for GraticuleStep {
    fn default() -> Self {
        Self::new(10.0, 10.0)
    }
}
