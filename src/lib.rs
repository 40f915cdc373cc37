//! mapcanvas: projection, topology-to-path preparation and pan/zoom
//! interaction for vector world maps.
//!
//! The library is UI-agnostic. Geometry comes out as SVG path strings and
//! as projected rings that any painter can draw; the `mapcanvas` binary
//! draws them with egui.

#![warn(clippy::all)]

pub mod data;
pub mod error;
pub mod geo;
pub mod state;
pub mod topology;
pub mod validation;
pub mod zoom;

pub use error::{ErrorKind, MapError, MapResult};
