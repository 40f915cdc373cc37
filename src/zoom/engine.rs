//! Zoom/pan engine: reconciles gesture input with declarative
//! center/zoom control and notifies observers.
//!
//! Programmatic moves run through the same behavior as gestures. The engine
//! marks itself [`InteractionState::ProgrammaticMove`] before asking the
//! behavior to jump, so the resulting start/zoom/end events are recognised
//! and kept away from the move callbacks.

use super::behavior::{ZoomBehavior, ZoomEvent, ZoomEventKind};
use super::events::{default_filter, EventFilter, GestureEvent};
use super::transform::Transform;
use crate::error::MapResult;
use crate::geo::convert::get_coords;
use crate::geo::{Coordinates, Projection, ScaleExtent, TranslateExtent};
use crate::state::MapState;
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use web_time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    GestureActive,
    /// Set while the engine itself moves the camera.
    ProgrammaticMove,
}

/// Geographic position at the viewport center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub coordinates: Coordinates,
    pub zoom: f64,
}

pub type MoveCallback = Box<dyn FnMut(&Position, Option<&GestureEvent>)>;
pub type ZoomCallback = Box<dyn FnMut(&Transform, Option<&GestureEvent>)>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub enable_zoom: bool,
}

impl ZoomConfig {
    pub fn new(min_zoom: f64, max_zoom: f64) -> Self {
        Self {
            min_zoom,
            max_zoom,
            enable_zoom: true,
        }
    }

    pub fn scale_extent(&self) -> ScaleExtent {
        ScaleExtent::new(self.min_zoom, self.max_zoom)
    }
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self::new(1.0, 8.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanConfig {
    /// Pixel rectangle `[top_left, bottom_right]` the view must stay in;
    /// `None` pans freely.
    pub bounds: Option<[[f64; 2]; 2]>,
    pub enable_pan: bool,
}

impl PanConfig {
    pub fn new(bounds: [[f64; 2]; 2]) -> Self {
        Self {
            bounds: Some(bounds),
            enable_pan: true,
        }
    }

    pub fn translate_extent(&self) -> TranslateExtent {
        match self.bounds {
            Some([top_left, bottom_right]) => TranslateExtent::new(top_left, bottom_right),
            None => TranslateExtent::unbounded(),
        }
    }
}

impl Default for PanConfig {
    fn default() -> Self {
        Self {
            bounds: None,
            enable_pan: true,
        }
    }
}

/// Initial camera and limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomPanConfig {
    pub center: Coordinates,
    pub zoom: f64,
    pub zoom_config: ZoomConfig,
    pub pan_config: PanConfig,
}

impl Default for ZoomPanConfig {
    fn default() -> Self {
        Self {
            center: Coordinates::from_lon_lat(0.0, 0.0),
            zoom: 1.0,
            zoom_config: ZoomConfig::default(),
            pan_config: PanConfig::default(),
        }
    }
}

pub struct ZoomPan {
    width: f64,
    height: f64,
    projection: Projection,
    zoom_config: ZoomConfig,
    pan_config: PanConfig,
    filter: EventFilter,
    behavior: ZoomBehavior,
    next_binding: u64,
    state: InteractionState,
    transform: Transform,
    last_center_zoom: (f64, f64, f64),
    on_move_start: Option<MoveCallback>,
    on_move: Option<MoveCallback>,
    on_move_end: Option<MoveCallback>,
    on_zoom: Option<ZoomCallback>,
}

impl ZoomPan {
    pub fn new(width: f64, height: f64, projection: Projection, config: ZoomPanConfig) -> Self {
        let filter: EventFilter = Rc::new(default_filter);
        let behavior = ZoomBehavior::new(
            0,
            width,
            height,
            config.zoom_config.scale_extent(),
            config.pan_config.translate_extent(),
            Rc::clone(&filter),
        )
        .with_enabled(config.zoom_config.enable_zoom, config.pan_config.enable_pan);
        let mut engine = Self {
            width,
            height,
            projection,
            zoom_config: config.zoom_config,
            pan_config: config.pan_config,
            filter,
            behavior,
            next_binding: 1,
            state: InteractionState::Idle,
            transform: Transform::IDENTITY,
            last_center_zoom: (0.0, 0.0, 1.0),
            on_move_start: None,
            on_move: None,
            on_move_end: None,
            on_zoom: None,
        };
        engine.set_center_zoom(config.center, config.zoom);
        engine
    }

    /// Engine bound to the size and projection of a map context.
    pub fn from_map(map: &MapState, config: ZoomPanConfig) -> MapResult<Self> {
        Ok(Self::new(map.width(), map.height(), map.projection()?, config))
    }

    pub fn on_move_start(&mut self, f: impl FnMut(&Position, Option<&GestureEvent>) + 'static) {
        self.on_move_start = Some(Box::new(f));
    }

    pub fn on_move(&mut self, f: impl FnMut(&Position, Option<&GestureEvent>) + 'static) {
        self.on_move = Some(Box::new(f));
    }

    pub fn on_move_end(&mut self, f: impl FnMut(&Position, Option<&GestureEvent>) + 'static) {
        self.on_move_end = Some(Box::new(f));
    }

    pub fn on_zoom(&mut self, f: impl FnMut(&Transform, Option<&GestureEvent>) + 'static) {
        self.on_zoom = Some(Box::new(f));
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    /// SVG `transform` attribute for the zoomed group.
    pub fn transform_string(&self) -> String {
        self.transform.to_svg_transform()
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn binding_id(&self) -> u64 {
        self.behavior.id()
    }

    pub fn zoom_config(&self) -> &ZoomConfig {
        &self.zoom_config
    }

    pub fn pan_config(&self) -> &PanConfig {
        &self.pan_config
    }

    /// Position at the viewport center for the current transform.
    pub fn position(&self) -> Option<Position> {
        self.position_for(&self.transform)
    }

    fn position_for(&self, t: &Transform) -> Option<Position> {
        let center = get_coords(self.width, self.height, t);
        let coordinates = self.projection.invert(center)?;
        Some(Position {
            coordinates,
            zoom: t.k,
        })
    }

    /// Updates the viewport and projection. A size change rebinds.
    pub fn set_view(&mut self, width: f64, height: f64, projection: Projection) {
        self.projection = projection;
        if width != self.width || height != self.height {
            self.width = width;
            self.height = height;
            self.rebind();
        }
    }

    pub fn set_zoom_config(&mut self, config: ZoomConfig) {
        if config != self.zoom_config {
            self.zoom_config = config;
            self.rebind();
        }
    }

    pub fn set_pan_config(&mut self, config: PanConfig) {
        if config != self.pan_config {
            self.pan_config = config;
            self.rebind();
        }
    }

    /// Replaces the gesture filter and rebinds.
    pub fn set_filter(&mut self, filter: impl Fn(&GestureEvent) -> bool + 'static) {
        self.filter = Rc::new(filter);
        self.rebind();
    }

    /// Detaches the current behavior and attaches a fresh one that keeps the
    /// transform. In-flight gestures are dropped.
    fn rebind(&mut self) {
        let id = self.next_binding;
        self.next_binding += 1;
        log::debug!(
            "Rebinding zoom behavior {} -> {} ({}x{})",
            self.behavior.id(),
            id,
            self.width,
            self.height
        );
        let transform = self.behavior.transform();
        self.behavior = ZoomBehavior::new(
            id,
            self.width,
            self.height,
            self.zoom_config.scale_extent(),
            self.pan_config.translate_extent(),
            Rc::clone(&self.filter),
        )
        .with_enabled(self.zoom_config.enable_zoom, self.pan_config.enable_pan)
        .with_transform(transform);
        self.transform = self.behavior.transform();
        if self.state == InteractionState::GestureActive {
            self.state = InteractionState::Idle;
        }
    }

    /// Feeds one input event from the host UI.
    pub fn handle_event(&mut self, event: &GestureEvent, now: Instant) {
        let events = self.behavior.handle(event, now);
        self.dispatch(events);
    }

    /// Ends an idle wheel gesture; call once per frame.
    pub fn tick(&mut self, now: Instant) {
        let events = self.behavior.tick(now);
        self.dispatch(events);
    }

    pub fn end_wheel(&mut self) {
        let events = self.behavior.end_wheel();
        self.dispatch(events);
    }

    /// Moves the camera so `center` sits in the middle of the viewport at
    /// `zoom`. No move callbacks fire. Returns `false` when the values
    /// match the last applied call or the center cannot be projected. A
    /// rejected center is not remembered, so it applies once it becomes
    /// visible.
    pub fn set_center_zoom(&mut self, center: Coordinates, zoom: f64) -> bool {
        let key = (center.lon(), center.lat(), zoom);
        if key == self.last_center_zoom {
            return false;
        }

        let Some(p) = self.projection.project(center) else {
            log::warn!("Cannot center on {}: not visible in projection", center);
            return false;
        };
        self.last_center_zoom = key;
        let target = Transform::new(
            self.width / 2.0 - p[0] * zoom,
            self.height / 2.0 - p[1] * zoom,
            zoom,
        );

        let interrupted = self.behavior.interrupt();
        self.dispatch(interrupted);

        self.state = InteractionState::ProgrammaticMove;
        let events = self.behavior.set_transform(target);
        self.dispatch(events);
        self.transform = self.behavior.transform();
        true
    }

    fn dispatch(&mut self, events: Vec<ZoomEvent>) {
        for event in events {
            let bypass = self.state == InteractionState::ProgrammaticMove;
            let source = event.source.as_ref();
            match event.kind {
                ZoomEventKind::Start => {
                    if bypass {
                        continue;
                    }
                    self.state = InteractionState::GestureActive;
                    if let Some(position) = self.position_for(&event.transform) {
                        if let Some(cb) = self.on_move_start.as_mut() {
                            cb(&position, source);
                        }
                    }
                }
                ZoomEventKind::Zoom => {
                    if bypass {
                        continue;
                    }
                    self.transform = event.transform;
                    if let Some(cb) = self.on_zoom.as_mut() {
                        cb(&event.transform, source);
                    }
                    if let Some(position) = self.position_for(&event.transform) {
                        if let Some(cb) = self.on_move.as_mut() {
                            cb(&position, source);
                        }
                    }
                }
                ZoomEventKind::End => {
                    self.state = InteractionState::Idle;
                    if bypass {
                        continue;
                    }
                    if let Some(position) = self.position_for(&event.transform) {
                        if let Some(cb) = self.on_move_end.as_mut() {
                            cb(&position, source);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{named_projection, RotationAngles};
    use crate::zoom::events::{DeltaMode, Modifiers, MouseButton};
    use std::cell::RefCell;

    #[derive(Default)]
    struct Calls {
        start: usize,
        moves: usize,
        end: usize,
        zooms: usize,
    }

    fn projection(name: &str) -> Projection {
        named_projection(name).unwrap().translate([400.0, 300.0])
    }

    fn engine_with(name: &str, config: ZoomPanConfig) -> (ZoomPan, Rc<RefCell<Calls>>) {
        let mut engine = ZoomPan::new(800.0, 600.0, projection(name), config);
        let calls = Rc::new(RefCell::new(Calls::default()));
        let c = Rc::clone(&calls);
        engine.on_move_start(move |_, _| c.borrow_mut().start += 1);
        let c = Rc::clone(&calls);
        engine.on_move(move |_, _| c.borrow_mut().moves += 1);
        let c = Rc::clone(&calls);
        engine.on_move_end(move |_, _| c.borrow_mut().end += 1);
        let c = Rc::clone(&calls);
        engine.on_zoom(move |_, _| c.borrow_mut().zooms += 1);
        (engine, calls)
    }

    fn down(position: [f64; 2]) -> GestureEvent {
        GestureEvent::PointerDown {
            position,
            button: MouseButton::Primary,
            modifiers: Modifiers::default(),
        }
    }

    fn wheel(delta_y: f64) -> GestureEvent {
        GestureEvent::Wheel {
            position: [200.0, 150.0],
            delta_y,
            delta_mode: DeltaMode::Pixel,
            modifiers: Modifiers::default(),
        }
    }

    #[test]
    fn test_set_center_zoom_fires_no_move_callbacks() {
        let (mut engine, calls) = engine_with("geoEqualEarth", ZoomPanConfig::default());
        assert!(engine.set_center_zoom(Coordinates::from_lon_lat(10.0, 10.0), 2.0));

        let calls = calls.borrow();
        assert_eq!(calls.start + calls.moves + calls.end, 0);
        assert_eq!(calls.zooms, 0);
        assert_eq!(engine.state(), InteractionState::Idle);

        let p = projection("geoEqualEarth")
            .project(Coordinates::from_lon_lat(10.0, 10.0))
            .unwrap();
        let t = engine.transform();
        assert!((t.x - (400.0 - p[0] * 2.0)).abs() < 1e-9);
        assert!((t.y - (300.0 - p[1] * 2.0)).abs() < 1e-9);
        assert_eq!(t.k, 2.0);

        let position = engine.position().unwrap();
        assert!((position.coordinates.lon() - 10.0).abs() < 1e-6);
        assert!((position.coordinates.lat() - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_unchanged_center_zoom_is_a_no_op() {
        let (mut engine, _) = engine_with("geoEqualEarth", ZoomPanConfig::default());
        assert!(!engine.set_center_zoom(Coordinates::from_lon_lat(0.0, 0.0), 1.0));
        assert!(engine.set_center_zoom(Coordinates::from_lon_lat(5.0, 0.0), 1.0));
        assert!(!engine.set_center_zoom(Coordinates::from_lon_lat(5.0, 0.0), 1.0));
    }

    #[test]
    fn test_hidden_center_applies_once_visible() {
        let (mut engine, _) = engine_with("geoOrthographic", ZoomPanConfig::default());
        let far_side = Coordinates::from_lon_lat(180.0, 0.0);
        assert!(!engine.set_center_zoom(far_side, 2.0));
        assert_eq!(engine.transform().k, 1.0);

        let turned = projection("geoOrthographic").rotate(RotationAngles::new(180.0, 0.0, 0.0));
        engine.set_view(800.0, 600.0, turned);
        assert!(engine.set_center_zoom(far_side, 2.0));
        let t = engine.transform();
        assert_eq!(t.k, 2.0);
        assert!((t.x - (400.0 - 400.0 * 2.0)).abs() < 1e-6);
        assert!((t.y - (300.0 - 300.0 * 2.0)).abs() < 1e-6);
        assert!(!engine.set_center_zoom(far_side, 2.0));
    }

    #[test]
    fn test_gesture_zoom_stays_in_extent() {
        let (mut engine, _) = engine_with("geoEqualEarth", ZoomPanConfig::default());
        let now = Instant::now();
        for _ in 0..20 {
            engine.handle_event(&wheel(-500.0), now);
            assert!(engine.transform().k <= 8.0);
        }
        assert_eq!(engine.transform().k, 8.0);
        for _ in 0..20 {
            engine.handle_event(&wheel(500.0), now);
            assert!(engine.transform().k >= 1.0);
        }
        assert_eq!(engine.transform().k, 1.0);
    }

    #[test]
    fn test_pan_stays_in_translate_extent() {
        let config = ZoomPanConfig {
            pan_config: PanConfig::new([[0.0, 0.0], [800.0, 600.0]]),
            ..ZoomPanConfig::default()
        };
        let (mut engine, _) = engine_with("geoEqualEarth", config);
        let now = Instant::now();
        engine.handle_event(&wheel(-500.0), now);
        engine.end_wheel();
        engine.handle_event(&down([400.0, 300.0]), now);
        for step in 1..10 {
            let offset = step as f64 * 300.0;
            engine.handle_event(
                &GestureEvent::PointerMove {
                    position: [400.0 + offset, 300.0 - offset],
                },
                now,
            );
            let t = engine.transform();
            assert!(t.invert_x(0.0) >= -1e-9);
            assert!(t.invert_x(800.0) <= 800.0 + 1e-9);
            assert!(t.invert_y(0.0) >= -1e-9);
            assert!(t.invert_y(600.0) <= 600.0 + 1e-9);
        }
    }

    #[test]
    fn test_drag_notifies_observers() {
        let (mut engine, calls) = engine_with("geoEqualEarth", ZoomPanConfig::default());
        let now = Instant::now();
        engine.handle_event(&down([400.0, 300.0]), now);
        assert_eq!(engine.state(), InteractionState::GestureActive);
        engine.handle_event(&GestureEvent::PointerMove { position: [420.0, 300.0] }, now);
        engine.handle_event(&GestureEvent::PointerMove { position: [440.0, 300.0] }, now);
        engine.handle_event(&GestureEvent::PointerUp { position: [440.0, 300.0] }, now);
        assert_eq!(engine.state(), InteractionState::Idle);

        let calls = calls.borrow();
        assert_eq!(calls.start, 1);
        assert_eq!(calls.moves, 2);
        assert_eq!(calls.zooms, 2);
        assert_eq!(calls.end, 1);
        assert_eq!(engine.transform(), Transform::new(40.0, 0.0, 1.0));
    }

    #[test]
    fn test_callbacks_skipped_when_center_is_off_globe() {
        let (mut engine, calls) = engine_with("geoOrthographic", ZoomPanConfig::default());
        let now = Instant::now();
        engine.handle_event(&down([400.0, 300.0]), now);
        engine.handle_event(&GestureEvent::PointerMove { position: [-1600.0, 300.0] }, now);

        let calls = calls.borrow();
        assert_eq!(calls.start, 1);
        assert_eq!(calls.moves, 0);
        assert_eq!(calls.zooms, 1);
        assert!(engine.position().is_none());
    }

    #[test]
    fn test_extent_change_rebinds_and_drops_gesture() {
        let (mut engine, calls) = engine_with("geoEqualEarth", ZoomPanConfig::default());
        let now = Instant::now();
        engine.handle_event(&wheel(-500.0), now);
        let before = engine.transform();
        let id = engine.binding_id();

        engine.handle_event(&down([400.0, 300.0]), now);
        engine.set_zoom_config(ZoomConfig::new(1.0, 4.0));
        assert_ne!(engine.binding_id(), id);
        assert_eq!(engine.state(), InteractionState::Idle);
        assert_eq!(engine.transform(), before);

        let moves = calls.borrow().moves;
        engine.handle_event(&GestureEvent::PointerMove { position: [500.0, 300.0] }, now);
        assert_eq!(calls.borrow().moves, moves);
        assert_eq!(engine.transform(), before);

        // Same config again keeps the binding.
        let id = engine.binding_id();
        engine.set_zoom_config(ZoomConfig::new(1.0, 4.0));
        assert_eq!(engine.binding_id(), id);
    }

    #[test]
    fn test_resize_rebinds() {
        let (mut engine, _) = engine_with("geoEqualEarth", ZoomPanConfig::default());
        let id = engine.binding_id();
        engine.set_view(800.0, 600.0, projection("geoEqualEarth"));
        assert_eq!(engine.binding_id(), id);
        engine.set_view(1024.0, 768.0, projection("geoEqualEarth"));
        assert_ne!(engine.binding_id(), id);
    }

    #[test]
    fn test_ctrl_wheel_is_filtered() {
        let (mut engine, calls) = engine_with("geoEqualEarth", ZoomPanConfig::default());
        let ctrl_wheel = GestureEvent::Wheel {
            position: [400.0, 300.0],
            delta_y: -500.0,
            delta_mode: DeltaMode::Pixel,
            modifiers: Modifiers {
                ctrl: true,
                ..Modifiers::default()
            },
        };
        engine.handle_event(&ctrl_wheel, Instant::now());
        assert_eq!(engine.transform(), Transform::IDENTITY);
        assert_eq!(calls.borrow().zooms, 0);
    }

    #[test]
    fn test_initial_center_zoom_applies() {
        let config = ZoomPanConfig {
            zoom: 4.0,
            ..ZoomPanConfig::default()
        };
        let engine = ZoomPan::new(800.0, 600.0, projection("geoEqualEarth"), config);
        assert_eq!(engine.transform(), Transform::new(-1200.0, -900.0, 4.0));
        assert_eq!(engine.transform_string(), "translate(-1200 -900) scale(4)");
    }
}
