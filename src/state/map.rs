//! Map context: viewport size and projection inputs with the projection and
//! path generator derived from them.

use super::memo::Memo;
use crate::error::MapResult;
use crate::geo::{
    make_path, make_projection, Coordinates, PathGenerator, Projection, ProjectionConfig,
    ProjectionSource,
};
use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, Ordering};

pub const DEFAULT_WIDTH: f64 = 800.0;
pub const DEFAULT_HEIGHT: f64 = 600.0;

static NEXT_MAP_ID: AtomicU64 = AtomicU64::new(0);

/// Width, height and projection as one reactive unit.
///
/// Setters bump [`revision`](Self::revision) only when the value actually
/// changes; the projection and path are rebuilt lazily on the first read
/// after a bump.
#[derive(Debug)]
pub struct MapState {
    id: u64,
    width: f64,
    height: f64,
    source: ProjectionSource,
    config: ProjectionConfig,
    revision: u64,
    projection: RefCell<Memo<u64, MapResult<Projection>>>,
    path: RefCell<Memo<u64, MapResult<PathGenerator>>>,
}

impl Default for MapState {
    fn default() -> Self {
        Self::new(
            DEFAULT_WIDTH,
            DEFAULT_HEIGHT,
            ProjectionSource::default(),
            ProjectionConfig::default(),
        )
    }
}

impl MapState {
    pub fn new(
        width: f64,
        height: f64,
        source: ProjectionSource,
        config: ProjectionConfig,
    ) -> Self {
        Self {
            id: NEXT_MAP_ID.fetch_add(1, Ordering::Relaxed),
            width,
            height,
            source,
            config,
            revision: 0,
            projection: RefCell::new(Memo::new()),
            path: RefCell::new(Memo::new()),
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn projection_source(&self) -> &ProjectionSource {
        &self.source
    }

    pub fn projection_config(&self) -> &ProjectionConfig {
        &self.config
    }

    /// Distinguishes this map from every other one in the process.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Changes whenever any input changes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn set_size(&mut self, width: f64, height: f64) {
        if width != self.width || height != self.height {
            self.width = width;
            self.height = height;
            self.revision += 1;
        }
    }

    pub fn set_projection(&mut self, source: impl Into<ProjectionSource>) {
        let source = source.into();
        let unchanged = match (&self.source, &source) {
            (ProjectionSource::Named(a), ProjectionSource::Named(b)) => a == b,
            _ => false,
        };
        if !unchanged {
            self.source = source;
            self.revision += 1;
        }
    }

    pub fn set_projection_config(&mut self, config: ProjectionConfig) {
        if config != self.config {
            self.config = config;
            self.revision += 1;
        }
    }

    /// The configured projection, rebuilt when an input changed.
    pub fn projection(&self) -> MapResult<Projection> {
        self.projection.borrow_mut().get_or_compute(self.revision, || {
            log::debug!("Rebuilding projection (revision {})", self.revision);
            make_projection(&self.source, &self.config, self.width, self.height)
        })
    }

    /// Path generator over [`projection`](Self::projection).
    pub fn path(&self) -> MapResult<PathGenerator> {
        if let Some(path) = self.path.borrow().get(self.revision) {
            return path.clone();
        }
        let projection = self.projection();
        self.path
            .borrow_mut()
            .get_or_compute(self.revision, || projection.map(|p| make_path(&p)))
    }

    /// Screen position of a marker, `None` when it is not visible.
    pub fn project(&self, coordinates: Coordinates) -> MapResult<Option<[f64; 2]>> {
        Ok(self.projection()?.project(coordinates))
    }

    /// Number of projection rebuilds so far.
    pub fn projection_builds(&self) -> u64 {
        self.projection.borrow().computations()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_defaults() {
        let map = MapState::default();
        assert_eq!(map.width(), 800.0);
        assert_eq!(map.height(), 600.0);
        let projection = map.projection().unwrap();
        assert_eq!(projection.name(), "geoEqualEarth");
        assert_eq!(projection.get_translate(), [400.0, 300.0]);
    }

    #[test]
    fn test_projection_is_memoized_by_revision() {
        let mut map = MapState::default();
        map.projection().unwrap();
        map.path().unwrap();
        map.projection().unwrap();
        assert_eq!(map.projection_builds(), 1);

        map.set_size(800.0, 600.0);
        map.set_projection("geoEqualEarth");
        map.set_projection_config(ProjectionConfig::default());
        map.projection().unwrap();
        assert_eq!(map.projection_builds(), 1);

        map.set_size(1000.0, 500.0);
        let projection = map.projection().unwrap();
        assert_eq!(projection.get_translate(), [500.0, 250.0]);
        assert_eq!(map.projection_builds(), 2);
    }

    #[test]
    fn test_unknown_projection_fails_every_read() {
        let mut map = MapState::default();
        map.set_projection("geoNowhere");
        assert_eq!(map.projection().unwrap_err().kind, ErrorKind::Projection);
        assert!(map.path().is_err());
    }

    #[test]
    fn test_project_marker() {
        let map = MapState::default();
        let center = map.project(Coordinates::from_lon_lat(0.0, 0.0)).unwrap().unwrap();
        assert!((center[0] - 400.0).abs() < 1e-9);
        assert!((center[1] - 300.0).abs() < 1e-9);

        let mut globe = MapState::default();
        globe.set_projection("geoOrthographic");
        assert!(globe.project(Coordinates::from_lon_lat(180.0, 0.0)).unwrap().is_none());
    }
}
