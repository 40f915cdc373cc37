//! Centralized color constants for the viewer.

use eframe::egui::Color32;

/// General UI colors for labels and values.
pub mod ui {
    use super::Color32;

    /// Muted gray for labels.
    pub const LABEL: Color32 = Color32::from_rgb(120, 120, 130);
    /// Slightly brighter for values.
    pub const VALUE: Color32 = Color32::from_rgb(200, 200, 220);
    /// Error text.
    pub const ERROR: Color32 = Color32::from_rgb(255, 110, 110);
}

/// Colors for the map itself, back to front.
pub mod map {
    use super::Color32;

    pub const BACKGROUND: Color32 = Color32::from_rgb(20, 20, 35);
    /// Fill inside the sphere outline.
    pub const OCEAN: Color32 = Color32::from_rgb(28, 42, 66);
    pub const SPHERE_STROKE: Color32 = Color32::from_rgb(90, 110, 150);
    pub const GRATICULE: Color32 = Color32::from_rgba_premultiplied(60, 70, 90, 140);
    pub const LAND: Color32 = Color32::from_rgb(150, 160, 150);
    pub const BORDERS: Color32 = Color32::from_rgb(110, 120, 110);
    pub const OUTLINE: Color32 = Color32::from_rgb(180, 190, 180);
    /// Geography under the pointer.
    pub const HOVER: Color32 = Color32::from_rgb(255, 200, 80);
    pub const POINT: Color32 = Color32::from_rgb(255, 120, 80);
}
