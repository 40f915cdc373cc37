//! Top bar UI: title, projection and camera controls, and status.

use super::colors;
use crate::MapApp;
use eframe::egui::{self, RichText};
use mapcanvas::geo::{Coordinates, PROJECTION_NAMES};

pub const TOP_BAR_HEIGHT: f32 = 36.0;

pub fn render_top_bar(ctx: &egui::Context, app: &mut MapApp) {
    egui::TopBottomPanel::top("top_bar")
        .exact_height(TOP_BAR_HEIGHT)
        .show(ctx, |ui| {
            ui.horizontal_centered(|ui| {
                ui.label(
                    RichText::new("mapcanvas")
                        .strong()
                        .size(16.0)
                        .color(egui::Color32::WHITE),
                );

                ui.separator();

                let mut selected = app.settings.projection.clone();
                egui::ComboBox::from_id_salt("projection")
                    .selected_text(&selected)
                    .show_ui(ui, |ui| {
                        for name in PROJECTION_NAMES {
                            ui.selectable_value(&mut selected, name.to_string(), *name);
                        }
                    });
                if selected != app.settings.projection {
                    app.set_projection(&selected);
                }

                ui.separator();

                // Requested camera; dragging these moves the map.
                let mut lon = app.center.lon();
                let mut lat = app.center.lat();
                ui.label(RichText::new("Center").size(12.0).color(colors::ui::LABEL));
                let lon_changed = ui
                    .add(egui::DragValue::new(&mut lon).range(-180.0..=180.0).speed(0.5))
                    .changed();
                let lat_changed = ui
                    .add(egui::DragValue::new(&mut lat).range(-90.0..=90.0).speed(0.5))
                    .changed();
                if lon_changed || lat_changed {
                    app.center = Coordinates::from_lon_lat(lon, lat);
                }

                let zoom_config = app.settings.zoom_pan.zoom_config;
                ui.label(RichText::new("Zoom").size(12.0).color(colors::ui::LABEL));
                ui.add(
                    egui::DragValue::new(&mut app.zoom_level)
                        .range(zoom_config.min_zoom..=zoom_config.max_zoom)
                        .speed(0.05),
                );

                ui.separator();

                ui.checkbox(&mut app.settings.show_sphere, "Sphere");
                ui.checkbox(&mut app.settings.show_graticule, "Graticule");
                ui.checkbox(&mut app.settings.show_borders, "Borders");

                ui.separator();

                ui.label(
                    RichText::new(&app.status_message)
                        .size(13.0)
                        .color(colors::ui::VALUE),
                );
            });
        });
}
