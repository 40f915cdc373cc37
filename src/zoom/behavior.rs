//! Gesture handling that turns raw input into zoom events.
//!
//! One `ZoomBehavior` is one binding: it owns the transform, the viewport
//! and extents it was bound with, and whatever gesture is in flight.
//! Rebinding means dropping the behavior and building a new one.

use super::events::{EventFilter, GestureEvent};
use super::transform::{constrain, Transform};
use crate::geo::{ScaleExtent, TranslateExtent};
use std::time::Duration;
use web_time::Instant;

/// Idle time after the last wheel event before the wheel gesture ends.
pub const WHEEL_DELAY: Duration = Duration::from_millis(150);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomEventKind {
    Start,
    Zoom,
    End,
}

/// Emitted by the behavior as a gesture progresses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomEvent {
    pub kind: ZoomEventKind,
    pub transform: Transform,
    /// Input that caused the event; `None` for programmatic changes.
    pub source: Option<GestureEvent>,
}

#[derive(Debug, Clone, Copy)]
enum Gesture {
    Wheel { last: Instant },
    /// `grab` is the map point under the pointer at press time.
    Drag { grab: [f64; 2] },
    Pinch {
        start: Transform,
        center: [f64; 2],
        grab: [f64; 2],
    },
}

pub struct ZoomBehavior {
    id: u64,
    transform: Transform,
    viewport: [[f64; 2]; 2],
    scale_extent: ScaleExtent,
    translate_extent: TranslateExtent,
    filter: EventFilter,
    enable_zoom: bool,
    enable_pan: bool,
    gesture: Option<Gesture>,
}

impl std::fmt::Debug for ZoomBehavior {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZoomBehavior")
            .field("id", &self.id)
            .field("transform", &self.transform)
            .field("viewport", &self.viewport)
            .field("scale_extent", &self.scale_extent)
            .field("translate_extent", &self.translate_extent)
            .field("gesture", &self.gesture)
            .finish()
    }
}

impl ZoomBehavior {
    pub fn new(
        id: u64,
        width: f64,
        height: f64,
        scale_extent: ScaleExtent,
        translate_extent: TranslateExtent,
        filter: EventFilter,
    ) -> Self {
        Self {
            id,
            transform: Transform::IDENTITY,
            viewport: [[0.0, 0.0], [width, height]],
            scale_extent,
            translate_extent,
            filter,
            enable_zoom: true,
            enable_pan: true,
            gesture: None,
        }
    }

    /// Starts the binding from an existing transform (constrained).
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = self.constrain(transform);
        self
    }

    pub fn with_enabled(mut self, zoom: bool, pan: bool) -> Self {
        self.enable_zoom = zoom;
        self.enable_pan = pan;
        self
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn is_active(&self) -> bool {
        self.gesture.is_some()
    }

    fn constrain(&self, t: Transform) -> Transform {
        constrain(t, self.viewport, &self.scale_extent, &self.translate_extent)
    }

    fn emit(&self, kind: ZoomEventKind, source: Option<GestureEvent>) -> ZoomEvent {
        ZoomEvent {
            kind,
            transform: self.transform,
            source,
        }
    }

    /// Ends whatever gesture is in flight, reporting the end.
    pub fn interrupt(&mut self) -> Vec<ZoomEvent> {
        match self.gesture.take() {
            Some(_) => vec![self.emit(ZoomEventKind::End, None)],
            None => Vec::new(),
        }
    }

    /// Feeds one input event. Returns the zoom events it produced, in
    /// order.
    pub fn handle(&mut self, event: &GestureEvent, now: Instant) -> Vec<ZoomEvent> {
        if event.starts_gesture() && !(self.filter)(event) {
            return Vec::new();
        }
        let source = Some(*event);
        let mut out = Vec::new();

        match *event {
            GestureEvent::Wheel { position, .. } => {
                if !self.enable_zoom {
                    return out;
                }
                let scale = event.wheel_scale().unwrap_or(1.0);
                let t = self.transform;
                let k = self.scale_extent.clamp(t.k * scale);
                let wheeling = matches!(self.gesture, Some(Gesture::Wheel { .. }));
                if !wheeling {
                    if k == t.k {
                        return out;
                    }
                    out.extend(self.interrupt());
                    out.push(self.emit(ZoomEventKind::Start, source));
                }
                self.gesture = Some(Gesture::Wheel { last: now });
                let grab = t.invert(position);
                self.transform = self.constrain(
                    t.with_scale(k, &self.scale_extent).anchor(position, grab),
                );
                out.push(self.emit(ZoomEventKind::Zoom, source));
            }
            GestureEvent::PointerDown { position, .. } => {
                if !self.enable_pan {
                    return out;
                }
                out.extend(self.interrupt());
                self.gesture = Some(Gesture::Drag {
                    grab: self.transform.invert(position),
                });
                out.push(self.emit(ZoomEventKind::Start, source));
            }
            GestureEvent::PointerMove { position } => {
                if let Some(Gesture::Drag { grab }) = self.gesture {
                    self.transform = self.constrain(self.transform.anchor(position, grab));
                    out.push(self.emit(ZoomEventKind::Zoom, source));
                }
            }
            GestureEvent::PointerUp { .. } => {
                if let Some(Gesture::Drag { .. }) = self.gesture {
                    self.gesture = None;
                    out.push(self.emit(ZoomEventKind::End, source));
                }
            }
            GestureEvent::DoubleClick {
                position,
                modifiers,
            } => {
                if !self.enable_zoom {
                    return out;
                }
                out.extend(self.interrupt());
                let t = self.transform;
                let k = t.k * if modifiers.shift { 0.5 } else { 2.0 };
                let grab = t.invert(position);
                out.push(self.emit(ZoomEventKind::Start, source));
                self.transform = self.constrain(
                    t.with_scale(k, &self.scale_extent).anchor(position, grab),
                );
                out.push(self.emit(ZoomEventKind::Zoom, source));
                out.push(self.emit(ZoomEventKind::End, source));
            }
            GestureEvent::PinchStart { center } => {
                if !self.enable_zoom && !self.enable_pan {
                    return out;
                }
                out.extend(self.interrupt());
                self.gesture = Some(Gesture::Pinch {
                    start: self.transform,
                    center,
                    grab: self.transform.invert(center),
                });
                out.push(self.emit(ZoomEventKind::Start, source));
            }
            GestureEvent::PinchMove { center, scale } => {
                if let Some(Gesture::Pinch {
                    start,
                    center: start_center,
                    grab,
                }) = self.gesture
                {
                    let k = if self.enable_zoom {
                        start.k * scale
                    } else {
                        start.k
                    };
                    let anchor = if self.enable_pan { center } else { start_center };
                    self.transform = self.constrain(
                        start.with_scale(k, &self.scale_extent).anchor(anchor, grab),
                    );
                    out.push(self.emit(ZoomEventKind::Zoom, source));
                }
            }
            GestureEvent::PinchEnd => {
                if let Some(Gesture::Pinch { .. }) = self.gesture {
                    self.gesture = None;
                    out.push(self.emit(ZoomEventKind::End, source));
                }
            }
        }
        out
    }

    /// Ends a wheel gesture that has been idle for [`WHEEL_DELAY`].
    pub fn tick(&mut self, now: Instant) -> Vec<ZoomEvent> {
        match self.gesture {
            Some(Gesture::Wheel { last })
                if now.saturating_duration_since(last) >= WHEEL_DELAY =>
            {
                self.end_wheel()
            }
            _ => Vec::new(),
        }
    }

    /// Ends a wheel gesture immediately.
    pub fn end_wheel(&mut self) -> Vec<ZoomEvent> {
        match self.gesture {
            Some(Gesture::Wheel { .. }) => {
                self.gesture = None;
                vec![self.emit(ZoomEventKind::End, None)]
            }
            _ => Vec::new(),
        }
    }

    /// Jumps to `transform` (constrained) as a start/zoom/end sequence.
    /// Any in-flight gesture is dropped without an end event; call
    /// [`interrupt`](Self::interrupt) first to observe it.
    pub fn set_transform(&mut self, transform: Transform) -> Vec<ZoomEvent> {
        self.gesture = None;
        let start = self.emit(ZoomEventKind::Start, None);
        self.transform = self.constrain(transform);
        vec![
            start,
            self.emit(ZoomEventKind::Zoom, None),
            self.emit(ZoomEventKind::End, None),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zoom::events::{default_filter, DeltaMode, Modifiers, MouseButton};
    use std::rc::Rc;

    fn behavior() -> ZoomBehavior {
        ZoomBehavior::new(
            1,
            800.0,
            600.0,
            ScaleExtent::new(1.0, 8.0),
            TranslateExtent::unbounded(),
            Rc::new(default_filter),
        )
    }

    fn wheel(delta_y: f64) -> GestureEvent {
        GestureEvent::Wheel {
            position: [400.0, 300.0],
            delta_y,
            delta_mode: DeltaMode::Pixel,
            modifiers: Modifiers::default(),
        }
    }

    fn kinds(events: &[ZoomEvent]) -> Vec<ZoomEventKind> {
        events.iter().map(|e| e.kind).collect()
    }

    #[test]
    fn test_wheel_zooms_about_pointer_and_ends_after_delay() {
        let mut b = behavior();
        let t0 = Instant::now();
        let events = b.handle(&wheel(-500.0), t0);
        assert_eq!(kinds(&events), vec![ZoomEventKind::Start, ZoomEventKind::Zoom]);
        let t = b.transform();
        assert!((t.k - 2.0).abs() < 1e-9);
        // The pointer position stays fixed on the same map point.
        assert!((t.apply([400.0, 300.0])[0] - 400.0).abs() < 1e-9);

        assert!(b.tick(t0 + Duration::from_millis(50)).is_empty());
        let events = b.tick(t0 + Duration::from_millis(200));
        assert_eq!(kinds(&events), vec![ZoomEventKind::End]);
        assert!(!b.is_active());
    }

    #[test]
    fn test_wheel_at_scale_limit_is_ignored() {
        let mut b = behavior();
        assert!(b.handle(&wheel(500.0), Instant::now()).is_empty());
        assert!(!b.is_active());
    }

    #[test]
    fn test_drag_keeps_grabbed_point_under_pointer() {
        let mut b = behavior();
        let now = Instant::now();
        let down = GestureEvent::PointerDown {
            position: [100.0, 100.0],
            button: MouseButton::Primary,
            modifiers: Modifiers::default(),
        };
        assert_eq!(kinds(&b.handle(&down, now)), vec![ZoomEventKind::Start]);
        b.handle(&GestureEvent::PointerMove { position: [150.0, 80.0] }, now);
        assert_eq!(b.transform(), Transform::new(50.0, -20.0, 1.0));
        let events = b.handle(&GestureEvent::PointerUp { position: [150.0, 80.0] }, now);
        assert_eq!(kinds(&events), vec![ZoomEventKind::End]);
    }

    #[test]
    fn test_filtered_events_do_nothing() {
        let mut b = behavior();
        let down = GestureEvent::PointerDown {
            position: [0.0, 0.0],
            button: MouseButton::Secondary,
            modifiers: Modifiers::default(),
        };
        assert!(b.handle(&down, Instant::now()).is_empty());
        assert!(b
            .handle(&GestureEvent::PointerMove { position: [50.0, 50.0] }, Instant::now())
            .is_empty());
        assert_eq!(b.transform(), Transform::IDENTITY);
    }

    #[test]
    fn test_pinch_scales_from_start_transform() {
        let mut b = behavior();
        let now = Instant::now();
        b.handle(&GestureEvent::PinchStart { center: [400.0, 300.0] }, now);
        b.handle(
            &GestureEvent::PinchMove {
                center: [400.0, 300.0],
                scale: 3.0,
            },
            now,
        );
        assert!((b.transform().k - 3.0).abs() < 1e-9);
        b.handle(
            &GestureEvent::PinchMove {
                center: [400.0, 300.0],
                scale: 20.0,
            },
            now,
        );
        assert_eq!(b.transform().k, 8.0);
        assert_eq!(
            kinds(&b.handle(&GestureEvent::PinchEnd, now)),
            vec![ZoomEventKind::End]
        );
    }

    #[test]
    fn test_double_click_zooms_in_one_step() {
        let mut b = behavior();
        let events = b.handle(
            &GestureEvent::DoubleClick {
                position: [0.0, 0.0],
                modifiers: Modifiers::default(),
            },
            Instant::now(),
        );
        assert_eq!(
            kinds(&events),
            vec![ZoomEventKind::Start, ZoomEventKind::Zoom, ZoomEventKind::End]
        );
        assert_eq!(b.transform(), Transform::new(0.0, 0.0, 2.0));
    }

    #[test]
    fn test_disabled_pan_ignores_drags() {
        let mut b = behavior().with_enabled(true, false);
        let down = GestureEvent::PointerDown {
            position: [0.0, 0.0],
            button: MouseButton::Primary,
            modifiers: Modifiers::default(),
        };
        assert!(b.handle(&down, Instant::now()).is_empty());
    }

    #[test]
    fn test_set_transform_is_constrained() {
        let mut b = behavior();
        let events = b.set_transform(Transform::new(10.0, 20.0, 50.0));
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| e.source.is_none()));
        assert_eq!(b.transform(), Transform::new(10.0, 20.0, 8.0));
    }
}
