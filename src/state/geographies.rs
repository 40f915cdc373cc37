//! Geography resolution for one map layer.
//!
//! Ties a [`GeographySource`] to the loader, extracts features and mesh
//! once per data change, and prepares them for whatever path generator the
//! map context currently has.

use super::map::MapState;
use super::memo::Memo;
use crate::data::{
    get_features, get_mesh, prepare_features, prepare_mesh, GeographyData, GeographyLoader,
    GeographySource, LoadState, ParseGeographies, PreparedFeature, PreparedMesh,
};
use crate::error::{MapError, MapResult};
use crate::topology::Mesh;
use geojson::Feature;
use std::rc::Rc;
use std::sync::Arc;

pub type GeographyErrorCallback = Box<dyn FnMut(&MapError)>;
pub type Notify = Arc<dyn Fn() + Send + Sync>;

/// Prepared output for one (data, path) pair.
#[derive(Debug, Clone, Default)]
pub struct PreparedGeographies {
    pub features: Vec<PreparedFeature>,
    pub mesh: PreparedMesh,
}

/// Where the layer's data stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeographyStatus {
    Loading,
    Ready,
    Failed,
}

pub struct Geographies {
    source: GeographySource,
    parse: Option<ParseGeographies>,
    loader: GeographyLoader,
    notify: Option<Notify>,
    on_error: Option<GeographyErrorCallback>,
    /// Bumped when the resolved data or the parse hook changes.
    revision: u64,
    features: Vec<Feature>,
    mesh: Option<Mesh>,
    failed: bool,
    /// Keyed by data revision, map id and map revision.
    prepared: Memo<(u64, u64, u64), Rc<PreparedGeographies>>,
}

impl Geographies {
    pub fn new(source: GeographySource, loader: GeographyLoader) -> Self {
        let mut layer = Self {
            source: GeographySource::Features(Vec::new()),
            parse: None,
            loader,
            notify: None,
            on_error: None,
            revision: 0,
            features: Vec::new(),
            mesh: None,
            failed: false,
            prepared: Memo::new(),
        };
        layer.set_source(source);
        layer
    }

    /// Post-processes extracted features.
    pub fn with_parse(mut self, parse: ParseGeographies) -> Self {
        self.parse = Some(parse);
        self.resolve_current();
        self
    }

    /// Called from the fetch thread when a result is ready to poll.
    pub fn with_notify(mut self, notify: Notify) -> Self {
        self.notify = Some(notify);
        self
    }

    pub fn on_geography_error(&mut self, f: impl FnMut(&MapError) + 'static) {
        self.on_error = Some(Box::new(f));
    }

    pub fn source(&self) -> &GeographySource {
        &self.source
    }

    /// Switches to a new source. A URL is only fetched when it differs from
    /// the one already requested.
    pub fn set_source(&mut self, source: GeographySource) {
        let Some(url) = source.url().map(str::to_string) else {
            self.loader.reset();
            let data = source.data();
            self.source = source;
            self.set_data(data.as_ref());
            return;
        };
        let started = match &self.notify {
            Some(notify) => {
                let notify = Arc::clone(notify);
                self.loader.load_with_notify(&url, move || notify())
            }
            None => self.loader.load(&url),
        };
        self.source = source;
        if started {
            self.set_data(None);
        }
    }

    /// Picks up finished fetches. Returns `true` when the data changed.
    pub fn update(&mut self) -> bool {
        if !self.loader.poll() {
            return false;
        }
        match self.loader.state().clone() {
            LoadState::Resolved(data) => self.set_data(Some(data.as_ref())),
            LoadState::Failed(err) => {
                log::error!("Geography failed to load: {}", err);
                self.set_data(None);
                self.failed = true;
                if let Some(cb) = self.on_error.as_mut() {
                    cb(&err);
                }
            }
            LoadState::Idle | LoadState::Pending => {}
        }
        true
    }

    pub fn status(&self) -> GeographyStatus {
        if self.failed {
            GeographyStatus::Failed
        } else if self.loader.state().is_pending() {
            GeographyStatus::Loading
        } else {
            GeographyStatus::Ready
        }
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn mesh(&self) -> Option<&Mesh> {
        self.mesh.as_ref()
    }

    fn resolve_current(&mut self) {
        let data = match &self.source {
            GeographySource::Url(_) => self.loader.state().data().map(|d| d.as_ref().clone()),
            other => other.data(),
        };
        self.set_data(data.as_ref());
    }

    fn set_data(&mut self, data: Option<&GeographyData>) {
        self.revision += 1;
        self.failed = false;
        self.mesh = None;
        self.features = Vec::new();
        let Some(data) = data else {
            return;
        };
        match get_features(data, self.parse) {
            Ok(features) => {
                self.features = features;
                self.mesh = get_mesh(data);
            }
            Err(err) => {
                log::error!("Failed to extract geography features: {}", err);
                self.failed = true;
                if let Some(cb) = self.on_error.as_mut() {
                    cb(&err);
                }
            }
        }
    }

    /// Features and mesh prepared through the map's path generator,
    /// recomputed only when the data or the path changed.
    pub fn prepare(&mut self, map: &MapState) -> MapResult<Rc<PreparedGeographies>> {
        let key = (self.revision, map.id(), map.revision());
        if let Some(prepared) = self.prepared.get(key) {
            return Ok(Rc::clone(prepared));
        }
        let path = map.path()?;
        let features = &self.features;
        let mesh = self.mesh.as_ref();
        Ok(self.prepared.get_or_compute(key, || {
            Rc::new(PreparedGeographies {
                features: prepare_features(features, &path),
                mesh: prepare_mesh(
                    mesh.and_then(|m| m.outline.as_ref()),
                    mesh.and_then(|m| m.borders.as_ref()),
                    &path,
                ),
            })
        }))
    }
}
