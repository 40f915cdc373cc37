//! Zoom and pan: the camera transform, gesture handling, and the engine
//! that ties gestures to declarative center/zoom control.

mod behavior;
mod engine;
pub mod events;
mod transform;

pub use behavior::{ZoomBehavior, ZoomEvent, ZoomEventKind, WHEEL_DELAY};
pub use engine::{
    InteractionState, MoveCallback, PanConfig, Position, ZoomCallback, ZoomConfig, ZoomPan,
    ZoomPanConfig,
};
pub use events::{default_filter, DeltaMode, EventFilter, GestureEvent, Modifiers, MouseButton};
pub use transform::{constrain, Transform};
