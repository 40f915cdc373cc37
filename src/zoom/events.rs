//! Gesture input as delivered by the host UI.

use serde::{Deserialize, Serialize};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MouseButton {
    Primary,
    Middle,
    Secondary,
}

/// Units of a wheel delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DeltaMode {
    #[default]
    Pixel,
    Line,
    Page,
}

impl DeltaMode {
    /// Multiplier turning a wheel delta into a zoom exponent.
    fn factor(self) -> f64 {
        match self {
            DeltaMode::Pixel => 0.002,
            DeltaMode::Line => 0.05,
            DeltaMode::Page => 1.0,
        }
    }
}

/// One input event. Positions are viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GestureEvent {
    Wheel {
        position: [f64; 2],
        delta_y: f64,
        delta_mode: DeltaMode,
        modifiers: Modifiers,
    },
    PointerDown {
        position: [f64; 2],
        button: MouseButton,
        modifiers: Modifiers,
    },
    PointerMove {
        position: [f64; 2],
    },
    PointerUp {
        position: [f64; 2],
    },
    DoubleClick {
        position: [f64; 2],
        modifiers: Modifiers,
    },
    PinchStart {
        center: [f64; 2],
    },
    /// `scale` is cumulative since the pinch started.
    PinchMove {
        center: [f64; 2],
        scale: f64,
    },
    PinchEnd,
}

impl GestureEvent {
    pub fn modifiers(&self) -> Modifiers {
        match self {
            GestureEvent::Wheel { modifiers, .. }
            | GestureEvent::PointerDown { modifiers, .. }
            | GestureEvent::DoubleClick { modifiers, .. } => *modifiers,
            _ => Modifiers::default(),
        }
    }

    pub fn button(&self) -> Option<MouseButton> {
        match self {
            GestureEvent::PointerDown { button, .. } => Some(*button),
            _ => None,
        }
    }

    /// Zoom multiplier for a wheel event (`2^(-delta * factor)`).
    pub fn wheel_scale(&self) -> Option<f64> {
        match self {
            GestureEvent::Wheel {
                delta_y,
                delta_mode,
                ..
            } => Some(2f64.powf(-delta_y * delta_mode.factor())),
            _ => None,
        }
    }

    /// Whether this event may begin a gesture. Continuations (moves, ups,
    /// pinch end) are never filtered.
    pub fn starts_gesture(&self) -> bool {
        matches!(
            self,
            GestureEvent::Wheel { .. }
                | GestureEvent::PointerDown { .. }
                | GestureEvent::DoubleClick { .. }
                | GestureEvent::PinchStart { .. }
        )
    }
}

/// Decides whether a gesture-starting event is handled.
pub type EventFilter = Rc<dyn Fn(&GestureEvent) -> bool>;

/// Rejects ctrl-modified events and any mouse button but the primary one.
pub fn default_filter(event: &GestureEvent) -> bool {
    !event.modifiers().ctrl && matches!(event.button(), None | Some(MouseButton::Primary))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        let down = |button, ctrl| GestureEvent::PointerDown {
            position: [0.0, 0.0],
            button,
            modifiers: Modifiers {
                ctrl,
                ..Modifiers::default()
            },
        };
        assert!(default_filter(&down(MouseButton::Primary, false)));
        assert!(!default_filter(&down(MouseButton::Secondary, false)));
        assert!(!default_filter(&down(MouseButton::Primary, true)));
        assert!(default_filter(&GestureEvent::PinchStart { center: [0.0, 0.0] }));
    }

    #[test]
    fn test_wheel_scale() {
        let wheel = GestureEvent::Wheel {
            position: [0.0, 0.0],
            delta_y: -500.0,
            delta_mode: DeltaMode::Pixel,
            modifiers: Modifiers::default(),
        };
        assert!((wheel.wheel_scale().unwrap() - 2.0).abs() < 1e-12);
        assert!(GestureEvent::PinchEnd.wheel_scale().is_none());
    }
}
