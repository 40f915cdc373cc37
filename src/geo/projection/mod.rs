//! Map projections: raw formulas wrapped with rotation, clipping and a
//! scale/translate step, plus the registry of named projections.
//!
//! A [`Projection`] is immutable once built. The builder-style adjusters
//! (`scale`, `translate`, `center`, `rotate`, `parallels`) consume the value
//! and return a new projection.

mod raw;
mod rotation;

pub use raw::{Azimuthal, ConicFactory, RawProjection};
pub use rotation::Rotation;

use super::clip::Clip;
use super::coords::{Coordinates, Parallels, RotationAngles};
use super::path::PathGenerator;
use crate::error::{MapError, MapResult};
use crate::validation;
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;
use std::fmt;
use std::sync::Arc;

const POLE_LIMIT: f64 = FRAC_PI_2 - 1e-6;

/// An adjustment a projection may or may not support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectionCapability {
    Center,
    Rotate,
    Scale,
    Parallels,
    Invert,
}

/// Set of supported capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub center: bool,
    pub rotate: bool,
    pub scale: bool,
    pub parallels: bool,
    pub invert: bool,
}

impl Capabilities {
    pub const STANDARD: Capabilities = Capabilities {
        center: true,
        rotate: true,
        scale: true,
        parallels: false,
        invert: true,
    };

    pub const CONIC: Capabilities = Capabilities {
        parallels: true,
        ..Capabilities::STANDARD
    };

    pub fn supports(&self, capability: ProjectionCapability) -> bool {
        match capability {
            ProjectionCapability::Center => self.center,
            ProjectionCapability::Rotate => self.rotate,
            ProjectionCapability::Scale => self.scale,
            ProjectionCapability::Parallels => self.parallels,
            ProjectionCapability::Invert => self.invert,
        }
    }
}

/// A configured projection from (longitude, latitude) to pixels.
#[derive(Clone)]
pub struct Projection {
    name: String,
    raw: Arc<dyn RawProjection>,
    conic: Option<ConicFactory>,
    capabilities: Capabilities,
    scale: f64,
    translate: [f64; 2],
    /// Degrees.
    center: [f64; 2],
    /// Degrees.
    rotate: [f64; 3],
    /// Degrees.
    parallels: [f64; 2],
    /// Degrees; `None` clips at the antimeridian instead.
    clip_angle: Option<f64>,
    // Derived from the fields above by `recenter`.
    rotation: Rotation,
    dx: f64,
    dy: f64,
}

impl fmt::Debug for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Projection")
            .field("name", &self.name)
            .field("scale", &self.scale)
            .field("translate", &self.translate)
            .field("center", &self.center)
            .field("rotate", &self.rotate)
            .field("clip_angle", &self.clip_angle)
            .finish()
    }
}

impl Projection {
    /// Wraps a raw projection with default scale 150 and translate
    /// `[480, 250]`. Conic parallels are not adjustable on the result.
    pub fn from_raw(name: impl Into<String>, raw: Arc<dyn RawProjection>) -> Self {
        let mut projection = Self {
            name: name.into(),
            raw,
            conic: None,
            capabilities: Capabilities::STANDARD,
            scale: 150.0,
            translate: [480.0, 250.0],
            center: [0.0, 0.0],
            rotate: [0.0, 0.0, 0.0],
            parallels: [0.0, 60.0],
            clip_angle: None,
            rotation: Rotation::new(0.0, 0.0, 0.0),
            dx: 0.0,
            dy: 0.0,
        };
        projection.recenter();
        projection
    }

    fn conic(name: &str, factory: ConicFactory, parallels: [f64; 2]) -> Self {
        let raw = factory(parallels[0].to_radians(), parallels[1].to_radians());
        let mut projection = Self::from_raw(name, raw);
        projection.conic = Some(factory);
        projection.capabilities = Capabilities::CONIC;
        projection.parallels = parallels;
        projection
    }

    /// Restricts the capabilities this projection advertises.
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_clip_angle(mut self, degrees: Option<f64>) -> Self {
        self.clip_angle = degrees;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn supports(&self, capability: ProjectionCapability) -> bool {
        self.capabilities.supports(capability)
    }

    pub fn scale(mut self, k: f64) -> Self {
        self.scale = k;
        self.recenter();
        self
    }

    pub fn translate(mut self, translate: [f64; 2]) -> Self {
        self.translate = translate;
        self.recenter();
        self
    }

    pub fn center(mut self, center: Coordinates) -> Self {
        self.center = [center.lon() % 360.0, center.lat() % 360.0];
        self.recenter();
        self
    }

    pub fn rotate(mut self, angles: RotationAngles) -> Self {
        let [l, p, g] = angles.0;
        self.rotate = [l % 360.0, p % 360.0, g % 360.0];
        self.recenter();
        self
    }

    /// Rebuilds the raw conic formula for new standard parallels. No-op for
    /// non-conic projections.
    pub fn parallels(mut self, parallels: Parallels) -> Self {
        if let Some(factory) = self.conic {
            self.parallels = parallels.0;
            self.raw = factory(parallels.0[0].to_radians(), parallels.0[1].to_radians());
            self.recenter();
        }
        self
    }

    pub fn get_scale(&self) -> f64 {
        self.scale
    }

    pub fn get_translate(&self) -> [f64; 2] {
        self.translate
    }

    pub fn get_center(&self) -> Coordinates {
        Coordinates::from_lon_lat(self.center[0], self.center[1])
    }

    pub fn get_rotate(&self) -> RotationAngles {
        RotationAngles(self.rotate)
    }

    pub fn get_parallels(&self) -> Option<Parallels> {
        self.conic.map(|_| Parallels(self.parallels))
    }

    pub fn clip_angle(&self) -> Option<f64> {
        self.clip_angle
    }

    fn recenter(&mut self) {
        self.rotation = Rotation::from_degrees(self.rotate);
        let [cx, cy] = self
            .raw
            .forward(self.center[0].to_radians(), self.center[1].to_radians());
        self.dx = self.translate[0] - self.scale * cx;
        self.dy = self.translate[1] + self.scale * cy;
    }

    pub(crate) fn clip(&self) -> Clip {
        match self.clip_angle {
            Some(angle) => Clip::Circle {
                radius: angle.to_radians(),
            },
            None => Clip::Antimeridian,
        }
    }

    /// Rotates a geographic point into the projection frame (radians).
    pub(crate) fn rotate_point(&self, lon: f64, lat: f64) -> [f64; 2] {
        self.rotation.forward(lon.to_radians(), lat.to_radians())
    }

    /// Projects an already-rotated point to pixels, without clipping.
    pub(crate) fn project_rotated(&self, p: [f64; 2]) -> Option<[f64; 2]> {
        // Poles are nudged inward so cylindrical formulas stay finite.
        let phi = p[1].clamp(-POLE_LIMIT, POLE_LIMIT);
        let [x, y] = self.raw.forward(p[0], phi);
        let out = [self.dx + self.scale * x, self.dy - self.scale * y];
        (out[0].is_finite() && out[1].is_finite()).then_some(out)
    }

    /// Projects a coordinate to pixels; `None` when it is clipped away
    /// (e.g. the far side of an orthographic globe) or not finite.
    pub fn project(&self, coordinates: Coordinates) -> Option<[f64; 2]> {
        let rotated = self.rotate_point(coordinates.lon(), coordinates.lat());
        if !self.clip().visible(rotated) {
            return None;
        }
        self.project_rotated(rotated)
    }

    /// Inverse projection; `None` outside the projectable domain or when
    /// the projection does not support inversion.
    pub fn invert(&self, point: [f64; 2]) -> Option<Coordinates> {
        if !self.supports(ProjectionCapability::Invert) {
            return None;
        }
        let x = (point[0] - self.dx) / self.scale;
        let y = (self.dy - point[1]) / self.scale;
        let [lambda, phi] = self.raw.invert(x, y)?;
        let [lambda, phi] = self.rotation.invert(lambda, phi);
        let (lon, lat) = (lambda.to_degrees(), phi.to_degrees());
        (lon.is_finite() && lat.is_finite()).then(|| Coordinates::from_lon_lat(lon, lat))
    }
}

/// Names of every registered projection, in registry order.
pub const PROJECTION_NAMES: &[&str] = &[
    "geoEqualEarth",
    "geoEquirectangular",
    "geoMercator",
    "geoTransverseMercator",
    "geoNaturalEarth1",
    "geoOrthographic",
    "geoStereographic",
    "geoGnomonic",
    "geoAzimuthalEqualArea",
    "geoAzimuthalEquidistant",
    "geoConicEqualArea",
    "geoAlbers",
    "geoConicConformal",
    "geoConicEquidistant",
];

fn azimuthal(name: &str, kind: Azimuthal, scale: f64, clip_angle: f64) -> Projection {
    Projection::from_raw(name, Arc::new(kind))
        .scale(scale)
        .with_clip_angle(Some(clip_angle))
}

/// Builds the named projection with its default configuration.
pub fn named_projection(name: &str) -> Option<Projection> {
    let projection = match name {
        "geoEqualEarth" => Projection::from_raw(name, Arc::new(raw::EqualEarth)).scale(177.158),
        "geoEquirectangular" => {
            Projection::from_raw(name, Arc::new(raw::Equirectangular)).scale(152.63)
        }
        "geoMercator" => Projection::from_raw(name, Arc::new(raw::Mercator))
            .scale(961.0 / std::f64::consts::TAU),
        "geoTransverseMercator" => {
            Projection::from_raw(name, Arc::new(raw::TransverseMercator::new())).scale(159.155)
        }
        "geoNaturalEarth1" => {
            Projection::from_raw(name, Arc::new(raw::NaturalEarth1)).scale(175.295)
        }
        "geoOrthographic" => azimuthal(name, Azimuthal::Orthographic, 249.5, 90.0 + 1e-6),
        "geoStereographic" => azimuthal(name, Azimuthal::Stereographic, 250.0, 142.0),
        "geoGnomonic" => azimuthal(name, Azimuthal::Gnomonic, 144.049, 60.0),
        "geoAzimuthalEqualArea" => {
            azimuthal(name, Azimuthal::EqualArea, 124.75, 180.0 - 1e-3)
        }
        "geoAzimuthalEquidistant" => {
            azimuthal(name, Azimuthal::Equidistant, 79.4188, 180.0 - 1e-3)
        }
        "geoConicEqualArea" => Projection::conic(name, raw::conic_equal_area, [0.0, 60.0])
            .scale(155.424)
            .center(Coordinates::from_lon_lat(0.0, 33.6442)),
        "geoAlbers" => Projection::conic(name, raw::conic_equal_area, [29.5, 45.5])
            .scale(1070.0)
            .rotate(RotationAngles::new(96.0, 0.0, 0.0))
            .center(Coordinates::from_lon_lat(-0.6, 38.7)),
        "geoConicConformal" => {
            Projection::conic(name, raw::conic_conformal, [30.0, 30.0]).scale(109.5)
        }
        "geoConicEquidistant" => Projection::conic(name, raw::conic_equidistant, [0.0, 60.0])
            .scale(131.154)
            .center(Coordinates::from_lon_lat(0.0, 13.9389)),
        _ => return None,
    };
    Some(projection)
}

/// Optional adjustments applied on top of a named projection's defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    pub center: Option<Coordinates>,
    pub rotate: Option<RotationAngles>,
    pub scale: Option<f64>,
    pub parallels: Option<Parallels>,
}

/// Either a registry name or a ready-made projection.
#[derive(Debug, Clone)]
pub enum ProjectionSource {
    Named(String),
    Custom(Projection),
}

impl Default for ProjectionSource {
    fn default() -> Self {
        ProjectionSource::Named("geoEqualEarth".to_string())
    }
}

impl From<&str> for ProjectionSource {
    fn from(name: &str) -> Self {
        ProjectionSource::Named(name.to_string())
    }
}

impl From<Projection> for ProjectionSource {
    fn from(projection: Projection) -> Self {
        ProjectionSource::Custom(projection)
    }
}

/// Resolves a projection source for a `width` x `height` viewport.
///
/// Custom projections are returned untouched. Named projections are looked
/// up, centred on the viewport and then adjusted by `config`, each setting
/// applied only if the projection supports it.
pub fn make_projection(
    source: &ProjectionSource,
    config: &ProjectionConfig,
    width: f64,
    height: f64,
) -> MapResult<Projection> {
    let name = match source {
        ProjectionSource::Custom(projection) => return Ok(projection.clone()),
        ProjectionSource::Named(name) => validation::sanitize_str(name, false)?,
    };
    validation::check_projection_config(config)?;

    let mut projection = named_projection(&name).ok_or_else(|| {
        MapError::projection(format!("Unknown projection: {}", name), &name).with_detail(
            "available_projections",
            PROJECTION_NAMES
                .iter()
                .map(|n| serde_json::Value::from(*n))
                .collect::<Vec<_>>(),
        )
    })?;
    projection = projection.translate([width / 2.0, height / 2.0]);

    if let Some(center) = config.center {
        if projection.supports(ProjectionCapability::Center) {
            projection = projection.center(center);
        }
    }
    if let Some(rotate) = config.rotate {
        if projection.supports(ProjectionCapability::Rotate) {
            projection = projection.rotate(rotate);
        }
    }
    if let Some(scale) = config.scale {
        if projection.supports(ProjectionCapability::Scale) {
            projection = projection.scale(scale);
        }
    }
    if let Some(parallels) = config.parallels {
        if projection.supports(ProjectionCapability::Parallels) {
            projection = projection.parallels(parallels);
        }
    }
    log::debug!("built projection {} for {}x{}", name, width, height);
    Ok(projection)
}

/// Path generator bound to `projection`.
pub fn make_path(projection: &Projection) -> PathGenerator {
    PathGenerator::new(projection.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_registered_name_builds() {
        for name in PROJECTION_NAMES {
            let projection = named_projection(name).expect("registered");
            assert_eq!(projection.name(), *name);
        }
        assert!(named_projection("geoNope").is_none());
    }

    #[test]
    fn test_origin_maps_to_translate() {
        let p = named_projection("geoEqualEarth")
            .unwrap()
            .translate([400.0, 300.0]);
        let [x, y] = p.project(Coordinates::from_lon_lat(0.0, 0.0)).unwrap();
        assert!((x - 400.0).abs() < 1e-9);
        assert!((y - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_center_moves_to_translate() {
        let p = named_projection("geoMercator")
            .unwrap()
            .translate([400.0, 300.0])
            .center(Coordinates::from_lon_lat(10.0, 20.0));
        let [x, y] = p.project(Coordinates::from_lon_lat(10.0, 20.0)).unwrap();
        assert!((x - 400.0).abs() < 1e-6);
        assert!((y - 300.0).abs() < 1e-6);
    }

    #[test]
    fn test_north_is_up() {
        let p = named_projection("geoEquirectangular").unwrap();
        let north = p.project(Coordinates::from_lon_lat(0.0, 45.0)).unwrap();
        let south = p.project(Coordinates::from_lon_lat(0.0, -45.0)).unwrap();
        assert!(north[1] < south[1]);
    }

    #[test]
    fn test_invert_round_trip_with_rotation() {
        for name in ["geoEqualEarth", "geoNaturalEarth1", "geoAlbers", "geoOrthographic"] {
            let p = named_projection(name)
                .unwrap()
                .translate([400.0, 300.0])
                .rotate(RotationAngles::new(-20.0, -10.0, 0.0));
            let c = Coordinates::from_lon_lat(25.0, 15.0);
            let px = p.project(c).unwrap();
            let back = p.invert(px).unwrap();
            assert!((back.lon() - 25.0).abs() < 1e-6, "{}: {:?}", name, back);
            assert!((back.lat() - 15.0).abs() < 1e-6, "{}: {:?}", name, back);
        }
    }

    #[test]
    fn test_orthographic_far_side_is_hidden() {
        let p = named_projection("geoOrthographic").unwrap();
        assert!(p.project(Coordinates::from_lon_lat(0.0, 0.0)).is_some());
        assert!(p.project(Coordinates::from_lon_lat(180.0, 0.0)).is_none());
        // Outside the globe disk there is nothing to invert.
        assert!(p.invert([480.0 + 300.0, 250.0]).is_none());
    }

    #[test]
    fn test_parallels_only_apply_to_conics() {
        let conic = named_projection("geoConicEqualArea")
            .unwrap()
            .parallels(Parallels::new(20.0, 50.0));
        assert_eq!(conic.get_parallels(), Some(Parallels::new(20.0, 50.0)));

        let flat = named_projection("geoMercator")
            .unwrap()
            .parallels(Parallels::new(20.0, 50.0));
        assert_eq!(flat.get_parallels(), None);
        assert!(!flat.supports(ProjectionCapability::Parallels));
    }

    #[test]
    fn test_make_projection_centers_on_viewport() {
        let source = ProjectionSource::from("geoMercator");
        let p = make_projection(&source, &ProjectionConfig::default(), 800.0, 600.0).unwrap();
        assert_eq!(p.get_translate(), [400.0, 300.0]);
    }

    #[test]
    fn test_make_projection_unknown_name_lists_registry() {
        let source = ProjectionSource::from("geoNotAThing");
        let err = make_projection(&source, &ProjectionConfig::default(), 800.0, 600.0).unwrap_err();
        assert_eq!(err.kind.code(), "PROJECTION_ERROR");
        let listed = err.details["available_projections"].as_array().unwrap();
        assert_eq!(listed.len(), PROJECTION_NAMES.len());
        for name in PROJECTION_NAMES {
            assert!(listed.iter().any(|v| v == name));
        }
    }

    #[test]
    fn test_make_projection_applies_config() {
        let config = ProjectionConfig {
            center: Some(Coordinates::from_lon_lat(10.0, 5.0)),
            rotate: Some(RotationAngles::new(-10.0, 0.0, 0.0)),
            scale: Some(300.0),
            parallels: Some(Parallels::new(10.0, 40.0)),
        };
        let p = make_projection(&"geoConicConformal".into(), &config, 800.0, 600.0).unwrap();
        assert_eq!(p.get_scale(), 300.0);
        assert_eq!(p.get_rotate(), RotationAngles::new(-10.0, 0.0, 0.0));
        assert_eq!(p.get_parallels(), Some(Parallels::new(10.0, 40.0)));

        // Parallels are skipped silently where unsupported.
        let p = make_projection(&"geoEqualEarth".into(), &config, 800.0, 600.0).unwrap();
        assert_eq!(p.get_parallels(), None);
        assert_eq!(p.get_scale(), 300.0);
    }

    #[test]
    fn test_make_projection_rejects_bad_config() {
        let config = ProjectionConfig {
            scale: Some(0.0),
            ..ProjectionConfig::default()
        };
        let err = make_projection(&"geoEqualEarth".into(), &config, 800.0, 600.0).unwrap_err();
        assert_eq!(err.kind.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_custom_projection_is_returned_unchanged() {
        let custom = named_projection("geoGnomonic").unwrap().scale(42.0);
        let p = make_projection(
            &ProjectionSource::Custom(custom),
            &ProjectionConfig {
                scale: Some(99.0),
                ..ProjectionConfig::default()
            },
            800.0,
            600.0,
        )
        .unwrap();
        assert_eq!(p.get_scale(), 42.0);
        assert_eq!(p.get_translate(), [480.0, 250.0]);
    }
}
