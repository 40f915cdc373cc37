//! Coordinate conversion between screen pixels, transform space and
//! geographic degrees.
//!
//! Everything here is pure. The equirectangular helpers assume the simple
//! `lon = x / width * 360 - 180` mapping and do not consult the active
//! projection; use [`crate::geo::Projection::invert`] for exact positions.

use super::coords::{Coordinates, Latitude, Longitude};
use crate::zoom::Transform;

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Returns the untransformed projection-space pixel currently shown at the
/// centre of a `width` x `height` viewport.
pub fn get_coords(width: f64, height: f64, t: &Transform) -> [f64; 2] {
    let x_offset = (width * t.k - width) / 2.0;
    let y_offset = (height * t.k - height) / 2.0;
    [
        width / 2.0 - (x_offset + t.x) / t.k,
        height / 2.0 - (y_offset + t.y) / t.k,
    ]
}

/// Converts a screen pixel into equirectangular degrees.
pub fn screen_to_map(
    screen_x: f64,
    screen_y: f64,
    width: f64,
    height: f64,
    t: &Transform,
) -> Coordinates {
    let map_x = (screen_x - t.x) / t.k;
    let map_y = (screen_y - t.y) / t.k;

    let lon = (map_x / width) * 360.0 - 180.0;
    let lat = 90.0 - (map_y / height) * 180.0;

    Coordinates::from_lon_lat(lon, lat)
}

/// Converts equirectangular degrees into a screen pixel.
pub fn map_to_screen(coordinates: Coordinates, width: f64, height: f64, t: &Transform) -> [f64; 2] {
    let map_x = ((coordinates.lon() + 180.0) / 360.0) * width;
    let map_y = ((90.0 - coordinates.lat()) / 180.0) * height;

    [map_x * t.k + t.x, map_y * t.k + t.y]
}

/// Great-circle distance in kilometres (haversine).
pub fn calculate_distance(a: Coordinates, b: Coordinates) -> f64 {
    let d_lat = to_radians(b.lat() - a.lat());
    let d_lon = to_radians(b.lon() - a.lon());

    let h = (d_lat / 2.0).sin().powi(2)
        + to_radians(a.lat()).cos() * to_radians(b.lat()).cos() * (d_lon / 2.0).sin().powi(2);

    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

pub fn to_radians(degrees: f64) -> f64 {
    degrees * (std::f64::consts::PI / 180.0)
}

pub fn to_degrees(radians: f64) -> f64 {
    radians * (180.0 / std::f64::consts::PI)
}

/// Wraps a longitude by repeated 360 degree steps until it is within
/// [-180, 180]. Values already inside the range (including 180) are kept.
pub fn normalize_longitude(mut longitude: f64) -> f64 {
    if !longitude.is_finite() {
        return longitude;
    }
    while longitude > 180.0 {
        longitude -= 360.0;
    }
    while longitude < -180.0 {
        longitude += 360.0;
    }
    longitude
}

pub fn normalize_latitude(latitude: f64) -> f64 {
    latitude.clamp(-90.0, 90.0)
}

pub fn create_normalized_coordinates(lon: f64, lat: f64) -> Coordinates {
    Coordinates::new(
        Longitude(normalize_longitude(lon)),
        Latitude(normalize_latitude(lat)),
    )
}
