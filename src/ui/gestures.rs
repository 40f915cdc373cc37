//! Translates egui pointer, scroll and touch input into gesture events for
//! the zoom engine.

use eframe::egui::{self, PointerButton, Pos2, Rect, Vec2};
use mapcanvas::zoom::{default_filter, DeltaMode, GestureEvent, Modifiers, MouseButton};

/// Accumulated scale of a touch pinch in progress.
#[derive(Debug, Default)]
pub struct PinchTracker {
    scale: Option<f64>,
}

fn to_modifiers(m: egui::Modifiers) -> Modifiers {
    Modifiers {
        ctrl: m.ctrl,
        shift: m.shift,
        alt: m.alt,
    }
}

fn local(rect: Rect, pos: Pos2) -> [f64; 2] {
    [(pos.x - rect.min.x) as f64, (pos.y - rect.min.y) as f64]
}

/// Wheel delta (pixel mode) producing the same scale change as `zoom`.
fn zoom_to_wheel_delta(zoom: f32) -> f64 {
    -(zoom as f64).log2() / 0.002
}

/// Gesture filter for the viewer. egui reports ctrl+scroll and trackpad
/// pinch as zoom input, so wheel events pass whatever the modifiers; the
/// rest go through [`default_filter`].
pub fn viewer_filter(event: &GestureEvent) -> bool {
    matches!(event, GestureEvent::Wheel { .. }) || default_filter(event)
}

/// Collects this frame's gestures on the canvas, in viewport coordinates.
pub fn collect_gestures(
    response: &egui::Response,
    rect: Rect,
    pinch: &mut PinchTracker,
) -> Vec<GestureEvent> {
    let mut events = Vec::new();
    let (modifiers, scroll, zoom_delta, multi_touch) = response.ctx.input(|i| {
        (
            i.modifiers,
            i.raw_scroll_delta,
            i.zoom_delta(),
            i.multi_touch(),
        )
    });
    let modifiers = to_modifiers(modifiers);

    // Touch pinch owns the pointer while it lasts.
    match (multi_touch, pinch.scale) {
        (Some(touch), scale) => {
            let center = local(rect, touch.center_pos);
            let scale = match scale {
                Some(scale) => scale,
                None => {
                    events.push(GestureEvent::PinchStart {
                        center: local(rect, touch.start_pos),
                    });
                    1.0
                }
            } * touch.zoom_delta as f64;
            pinch.scale = Some(scale);
            events.push(GestureEvent::PinchMove { center, scale });
            return events;
        }
        (None, Some(_)) => {
            pinch.scale = None;
            events.push(GestureEvent::PinchEnd);
        }
        (None, None) => {}
    }

    if response.drag_started() {
        if let Some(pos) = response.interact_pointer_pos() {
            let button = if response.drag_started_by(PointerButton::Secondary) {
                MouseButton::Secondary
            } else if response.drag_started_by(PointerButton::Middle) {
                MouseButton::Middle
            } else {
                MouseButton::Primary
            };
            events.push(GestureEvent::PointerDown {
                position: local(rect, pos),
                button,
                modifiers,
            });
        }
    }

    if response.dragged() && response.drag_delta() != Vec2::ZERO {
        if let Some(pos) = response.interact_pointer_pos() {
            events.push(GestureEvent::PointerMove {
                position: local(rect, pos),
            });
        }
    }

    if response.drag_stopped() {
        let pos = response
            .interact_pointer_pos()
            .or_else(|| response.hover_pos())
            .unwrap_or_else(|| rect.center());
        events.push(GestureEvent::PointerUp {
            position: local(rect, pos),
        });
    }

    if response.double_clicked() {
        if let Some(pos) = response.interact_pointer_pos() {
            events.push(GestureEvent::DoubleClick {
                position: local(rect, pos),
                modifiers,
            });
        }
    }

    if let Some(pos) = response.hover_pos() {
        // egui folds ctrl+scroll and trackpad pinch into zoom_delta.
        if zoom_delta != 1.0 {
            events.push(GestureEvent::Wheel {
                position: local(rect, pos),
                delta_y: zoom_to_wheel_delta(zoom_delta),
                delta_mode: DeltaMode::Pixel,
                modifiers,
            });
        } else if scroll.y != 0.0 {
            events.push(GestureEvent::Wheel {
                position: local(rect, pos),
                delta_y: -scroll.y as f64,
                delta_mode: DeltaMode::Pixel,
                modifiers,
            });
        }
    }

    events
}
