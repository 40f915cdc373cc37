//! UI modules for the mapcanvas viewer.
//!
//! The UI is split into two panels:
//! - Top bar: title, projection picker, camera controls and status
//! - Central canvas: the map, with pan and zoom

mod canvas;
mod colors;
mod gestures;
mod painter;
mod top_bar;

pub use canvas::{render_canvas, Backdrop};
pub use gestures::{viewer_filter, PinchTracker};
pub use top_bar::{render_top_bar, TOP_BAR_HEIGHT};
