#![warn(clippy::all)]

//! mapcanvas viewer.
//!
//! Draws a world map from TopoJSON or GeoJSON through any registered
//! projection, with wheel, drag, double-click and pinch zooming. Settings
//! come from `mapcanvas.json` or the file named by `MAPCANVAS_SETTINGS`.

mod ui;

use eframe::egui;
use mapcanvas::data::{self, GeographyLoader, GeographySource};
use mapcanvas::geo::{Coordinates, GeographyEventData, Graticule};
use mapcanvas::state::{Geographies, GeographyStatus, MapState, ViewerSettings};
use mapcanvas::zoom::{InteractionState, Position, ZoomPan, WHEEL_DELAY};
use mapcanvas::{MapError, MapResult};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

fn main() -> eframe::Result<()> {
    env_logger::init();

    let settings = ViewerSettings::load();
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([
            settings.width as f32,
            settings.height as f32 + ui::TOP_BAR_HEIGHT,
        ]),
        ..Default::default()
    };

    eframe::run_native(
        "mapcanvas",
        native_options,
        Box::new(|cc| Ok(Box::new(MapApp::new(cc, settings)))),
    )
}

/// Main application state and logic.
pub struct MapApp {
    settings: ViewerSettings,

    /// Size, projection and the derived path generator.
    map: MapState,

    /// The geography layer, `None` when no source is configured.
    geographies: Option<Geographies>,

    /// Pan/zoom engine, built once the projection resolves.
    zoom: Option<ZoomPan>,

    /// Camera requested from the top bar. Reconciled into the engine every
    /// frame; only changes move the map.
    center: Coordinates,
    zoom_level: f64,

    graticule: Graticule,

    /// Sphere and graticule paths for the current map revision.
    backdrop: ui::Backdrop,

    pinch: ui::PinchTracker,

    /// Geography under the pointer.
    hovered: Option<GeographyEventData>,

    /// Where the last gesture left the camera.
    last_move: Rc<RefCell<Option<Position>>>,

    /// Latest geography load failure, filled in by the layer's error callback.
    load_error: Rc<RefCell<Option<MapError>>>,

    status_message: String,

    /// Map revision the zoom engine was last synced to.
    view_revision: Option<u64>,
}

impl MapApp {
    pub fn new(cc: &eframe::CreationContext<'_>, settings: ViewerSettings) -> Self {
        let map = MapState::new(
            settings.width,
            settings.height,
            settings.projection.as_str().into(),
            settings.projection_config.clone(),
        );

        let load_error = Rc::new(RefCell::new(None));
        let (geographies, status_message) =
            match open_geographies(&settings, &cc.egui_ctx, Rc::clone(&load_error)) {
                Ok(Some(layer)) => (Some(layer), "Loading geography...".to_string()),
                Ok(None) => (None, "No geography configured".to_string()),
                Err(e) => {
                    log::error!("Failed to open geography: {}", e);
                    (None, format!("Geography error: {}", e.message))
                }
            };

        let mut app = Self {
            center: settings.zoom_pan.center,
            zoom_level: settings.zoom_pan.zoom,
            graticule: Graticule::new(settings.graticule_step),
            settings,
            map,
            geographies,
            zoom: None,
            backdrop: ui::Backdrop::default(),
            pinch: ui::PinchTracker::default(),
            hovered: None,
            last_move: Rc::new(RefCell::new(None)),
            load_error,
            status_message,
            view_revision: None,
        };
        app.sync_view();
        app
    }

    /// Switches the projection by registered name.
    pub fn set_projection(&mut self, name: &str) {
        log::info!("Switching projection to {}", name);
        self.settings.projection = name.to_string();
        self.map.set_projection(name);
        self.sync_view();
    }

    /// Follows the canvas size.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.map.set_size(width, height);
        self.sync_view();
    }

    /// Pushes size and projection changes into the zoom engine, building it
    /// on first use.
    fn sync_view(&mut self) {
        let revision = self.map.revision();
        if self.view_revision == Some(revision) {
            return;
        }
        self.view_revision = Some(revision);

        let projection = match self.map.projection() {
            Ok(projection) => projection,
            Err(e) => {
                log::error!("Projection unavailable: {}", e);
                self.status_message = format!("Projection error: {}", e.message);
                self.zoom = None;
                return;
            }
        };

        match self.zoom.as_mut() {
            Some(zoom) => zoom.set_view(self.map.width(), self.map.height(), projection),
            None => match build_zoom(&self.map, &self.settings, Rc::clone(&self.last_move)) {
                Ok(zoom) => self.zoom = Some(zoom),
                Err(e) => log::error!("Failed to build zoom engine: {}", e),
            },
        }
    }

    /// Applies the requested camera; a no-op unless it changed.
    fn apply_camera(&mut self) {
        if let Some(zoom) = self.zoom.as_mut() {
            if zoom.set_center_zoom(self.center, self.zoom_level) {
                log::debug!("Camera moved to {} at zoom {}", self.center, self.zoom_level);
            }
        }
    }

    fn poll_geographies(&mut self) {
        let Some(layer) = self.geographies.as_mut() else {
            return;
        };
        if !layer.update() {
            return;
        }
        self.status_message = match layer.status() {
            GeographyStatus::Ready => format!("{} geographies", layer.features().len()),
            GeographyStatus::Loading => "Loading geography...".to_string(),
            GeographyStatus::Failed => match self.load_error.borrow().as_ref() {
                Some(e) => format!("Geography error: {}", e.message),
                None => "Geography failed to load".to_string(),
            },
        };
    }

    fn is_busy(&self) -> bool {
        let loading = self
            .geographies
            .as_ref()
            .is_some_and(|g| g.status() == GeographyStatus::Loading);
        let moving = self
            .zoom
            .as_ref()
            .is_some_and(|z| z.state() != InteractionState::Idle);
        loading || moving
    }
}

/// Opens the configured geography source. A URL is fetched in the
/// background and wakes the UI when it lands.
fn open_geographies(
    settings: &ViewerSettings,
    ctx: &egui::Context,
    load_error: Rc<RefCell<Option<MapError>>>,
) -> MapResult<Option<Geographies>> {
    let source = if let Some(url) = &settings.geography_url {
        GeographySource::Url(url.clone())
    } else if let Some(path) = &settings.geography_file {
        GeographySource::from(data::load_file(path)?)
    } else {
        return Ok(None);
    };

    let repaint = ctx.clone();
    let mut layer = Geographies::new(GeographySource::Features(Vec::new()), GeographyLoader::http()?)
        .with_notify(Arc::new(move || repaint.request_repaint()));
    layer.on_geography_error(move |e| {
        load_error.replace(Some(e.clone()));
    });
    layer.set_source(source);
    Ok(Some(layer))
}

fn build_zoom(
    map: &MapState,
    settings: &ViewerSettings,
    last_move: Rc<RefCell<Option<Position>>>,
) -> MapResult<ZoomPan> {
    let mut zoom = ZoomPan::from_map(map, settings.zoom_pan)?;
    zoom.set_filter(ui::viewer_filter);
    zoom.on_move_start(|position, _| {
        log::trace!("Move started at {}", position.coordinates);
    });
    zoom.on_move_end(move |position, event| {
        log::debug!(
            "Move ended at {} zoom {:.2} ({:?})",
            position.coordinates,
            position.zoom,
            event
        );
        last_move.replace(Some(*position));
    });
    Ok(zoom)
}

impl eframe::App for MapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_geographies();
        self.apply_camera();

        ui::render_top_bar(ctx, self);
        ui::render_canvas(ctx, self);

        // Keep frames coming while a fetch is pending or a wheel gesture
        // waits for its idle timeout.
        if self.is_busy() {
            ctx.request_repaint_after(WHEEL_DELAY);
        }
    }
}
