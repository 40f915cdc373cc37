//! Geometry engine: projections, clipping, path generation and spherical
//! utilities.
//!
//! This module is the only place that knows about projection math; the
//! rest of the crate works with [`Projection`] and [`PathGenerator`].

mod clip;
pub mod convert;
mod coords;
pub mod graticule;
pub mod path;
pub mod projection;
pub mod spherical;

pub use coords::{
    Coordinates, GraticuleStep, Latitude, Longitude, Parallels, RotationAngles, ScaleExtent,
    TranslateExtent,
};
pub use graticule::Graticule;
pub use path::{GeoObject, PathGenerator, ProjectedPath, ProjectedRing};
pub use projection::{
    make_path, make_projection, named_projection, Projection, ProjectionCapability,
    ProjectionConfig, ProjectionSource, PROJECTION_NAMES,
};
pub use spherical::GeographyEventData;

use geojson::{Geometry, Value};

/// Builds a LineString from `from` to `to`, or from explicit coordinates
/// when given (which take precedence).
pub fn line_geometry(
    from: Coordinates,
    to: Coordinates,
    coordinates: Option<&[Coordinates]>,
) -> Geometry {
    let points = match coordinates {
        Some(points) if !points.is_empty() => points.iter().map(|c| c.to_array().to_vec()).collect(),
        _ => vec![from.to_array().to_vec(), to.to_array().to_vec()],
    };
    Geometry::new(Value::LineString(points))
}
