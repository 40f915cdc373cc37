//! Central canvas UI: the map itself.

use super::colors;
use super::gestures::collect_gestures;
use super::painter::{hit_test, paint_path, PathStyle, ScreenTransform};
use crate::MapApp;
use eframe::egui::{self, Align2, Color32, FontId, Painter, Rect, RichText, Sense, Vec2};
use mapcanvas::geo::convert::calculate_distance;
use mapcanvas::geo::path::DEFAULT_POINT_RADIUS;
use mapcanvas::geo::{
    line_geometry, Coordinates, GeoObject, GeographyEventData, Graticule, ProjectedPath,
};
use mapcanvas::state::{Geographies, GeographyStatus, Memo, Scope};
use mapcanvas::MapResult;
use std::rc::Rc;
use web_time::Instant;

/// Sphere and graticule through the current path generator.
#[derive(Debug, Default)]
pub struct Backdrop {
    sphere: Memo<u64, Rc<ProjectedPath>>,
    graticule: Memo<u64, Rc<ProjectedPath>>,
}

impl Backdrop {
    fn sphere(&mut self, scope: &Scope) -> MapResult<Rc<ProjectedPath>> {
        let map = scope.map_context()?;
        let path = map.path()?;
        Ok(self.sphere.get_or_compute(map.revision(), || {
            Rc::new(path.project(GeoObject::Sphere))
        }))
    }

    fn graticule(&mut self, scope: &Scope, graticule: &Graticule) -> MapResult<Rc<ProjectedPath>> {
        let map = scope.map_context()?;
        let path = map.path()?;
        Ok(self.graticule.get_or_compute(map.revision(), || {
            Rc::new(path.project(GeoObject::Geometry(&graticule.geometry())))
        }))
    }
}

pub fn render_canvas(ctx: &egui::Context, app: &mut MapApp) {
    egui::CentralPanel::default()
        .frame(egui::Frame::new().fill(colors::map::BACKGROUND))
        .show(ctx, |ui| {
            let available_size = ui.available_size();

            // Allocate the full available space for the canvas
            let (response, painter) = ui.allocate_painter(available_size, Sense::click_and_drag());
            let rect = response.rect;

            app.resize(rect.width() as f64, rect.height() as f64);

            handle_canvas_interaction(&response, rect, app);

            // Without an engine the projection failed; only the fallback shows.
            let Some(zoom) = app.zoom.as_ref() else {
                draw_fallback(&painter, rect, app);
                return;
            };
            let transform = zoom.transform();
            let camera = zoom.position().map(|p| p.coordinates);
            let scope = Scope::root().with_map(&app.map).with_transform(transform);
            let view = ScreenTransform::new(rect.min, scope.transform());

            let backdrop = BackdropLayer {
                backdrop: &mut app.backdrop,
                graticule: &app.graticule,
                show_sphere: app.settings.show_sphere,
                show_graticule: app.settings.show_graticule,
            };
            if let Err(e) = draw_backdrop(&painter, &view, &scope, backdrop) {
                log::warn!("Cannot draw backdrop: {}", e);
            }
            let layer = MapLayer {
                geographies: app.geographies.as_mut(),
                show_borders: app.settings.show_borders,
                camera,
            };
            app.hovered = match draw_geographies(&painter, &view, &scope, response.hover_pos(), layer) {
                Ok(hovered) => hovered,
                Err(e) => {
                    log::warn!("Cannot draw geographies: {}", e);
                    None
                }
            };
            draw_overlay_info(ui, rect, app);
            draw_fallback(&painter, rect, app);
        });
}

fn handle_canvas_interaction(response: &egui::Response, rect: Rect, app: &mut MapApp) {
    let events = collect_gestures(response, rect, &mut app.pinch);
    let Some(zoom) = app.zoom.as_mut() else {
        return;
    };
    let now = Instant::now();
    for event in &events {
        zoom.handle_event(event, now);
    }
    zoom.tick(now);
}

struct BackdropLayer<'a> {
    backdrop: &'a mut Backdrop,
    graticule: &'a Graticule,
    show_sphere: bool,
    show_graticule: bool,
}

fn draw_backdrop(
    painter: &Painter,
    view: &ScreenTransform,
    scope: &Scope,
    layer: BackdropLayer,
) -> MapResult<()> {
    if layer.show_sphere {
        let sphere = layer.backdrop.sphere(scope)?;
        let style =
            PathStyle::stroke(1.0, colors::map::SPHERE_STROKE).with_fill(colors::map::OCEAN);
        paint_path(painter, &sphere, view, style);
    }

    if layer.show_graticule {
        let lines = layer.backdrop.graticule(scope, layer.graticule)?;
        paint_path(painter, &lines, view, PathStyle::stroke(0.5, colors::map::GRATICULE));
    }
    Ok(())
}

/// Feature outlines, with point geographies marked in their own color.
fn land_style() -> PathStyle {
    let mut style = PathStyle::stroke(1.0, colors::map::LAND);
    style.point_color = colors::map::POINT;
    style
}

/// What the geography pass needs from the app besides the scope.
struct MapLayer<'a> {
    geographies: Option<&'a mut Geographies>,
    show_borders: bool,
    /// Camera center, the start of the line to a hovered geography.
    camera: Option<Coordinates>,
}

/// Paints the layer and returns the geography under the pointer.
fn draw_geographies(
    painter: &Painter,
    view: &ScreenTransform,
    scope: &Scope,
    hover: Option<egui::Pos2>,
    layer: MapLayer,
) -> MapResult<Option<GeographyEventData>> {
    let Some(geographies) = layer.geographies else {
        return Ok(None);
    };
    let map = scope.map_context()?;
    let prepared = geographies.prepare(map)?;

    let land = land_style();
    for feature in &prepared.features {
        paint_path(painter, &feature.projected, view, land);
    }

    if layer.show_borders {
        if let Some(borders) = &prepared.mesh.borders_projected {
            paint_path(painter, borders, view, PathStyle::stroke(0.75, colors::map::BORDERS));
        }
        if let Some(outline) = &prepared.mesh.outline_projected {
            paint_path(painter, outline, view, PathStyle::stroke(1.5, colors::map::OUTLINE));
        }
    }

    let hit = hover.and_then(|pos| {
        hit_test(&prepared.features, view.to_map(pos), DEFAULT_POINT_RADIUS)
    });
    let Some(feature) = hit.map(|i| &prepared.features[i]) else {
        return Ok(None);
    };
    let mut style = PathStyle::stroke(2.0, colors::map::HOVER);
    style.point_color = colors::map::HOVER;
    paint_path(painter, &feature.projected, view, style);
    let hovered = GeographyEventData::for_feature(&feature.feature);

    if let (Some(from), Some(to)) = (layer.camera, hovered.centroid) {
        let line = line_geometry(from, to, None);
        let projected = map.path()?.project(GeoObject::Geometry(&line));
        paint_path(painter, &projected, view, PathStyle::stroke(1.0, colors::map::HOVER));
    }
    Ok(Some(hovered))
}

fn overlay_label(ui: &mut egui::Ui, text: String, color: Color32) {
    ui.label(RichText::new(text).monospace().size(12.0).color(color));
}

fn draw_overlay_info(ui: &mut egui::Ui, rect: Rect, app: &MapApp) {
    let overlay_pos = rect.left_top() + Vec2::new(10.0, 10.0);
    let overlay_rect = Rect::from_min_size(overlay_pos, Vec2::new(260.0, 130.0));

    ui.scope_builder(egui::UiBuilder::new().max_rect(overlay_rect), |ui| {
        ui.vertical(|ui| {
            overlay_label(
                ui,
                format!("Projection: {}", app.settings.projection),
                colors::ui::VALUE,
            );
            if let Some(position) = app.zoom.as_ref().and_then(|z| z.position()) {
                overlay_label(
                    ui,
                    format!(
                        "Center: {:.2}, {:.2}",
                        position.coordinates.lon(),
                        position.coordinates.lat()
                    ),
                    colors::ui::VALUE,
                );
                overlay_label(ui, format!("Zoom: {:.2}", position.zoom), colors::ui::VALUE);
            }
            if let Some(moved) = app.last_move.borrow().as_ref() {
                overlay_label(
                    ui,
                    format!("Last move: {}", moved.coordinates),
                    colors::ui::LABEL,
                );
            }
            if let Some(hovered) = &app.hovered {
                let name = hovered
                    .geography
                    .property("name")
                    .and_then(|v| v.as_str())
                    .unwrap_or("(unnamed)");
                overlay_label(ui, format!("Geography: {}", name), colors::map::HOVER);
                if let Some(centroid) = hovered.centroid {
                    overlay_label(ui, format!("Centroid: {}", centroid), colors::ui::LABEL);
                    if let Some(position) = app.zoom.as_ref().and_then(|z| z.position()) {
                        let km = calculate_distance(position.coordinates, centroid);
                        overlay_label(ui, format!("Distance: {:.0} km", km), colors::ui::LABEL);
                    }
                }
            }
        });
    });
}

/// Centered text when there is nothing to draw yet.
fn draw_fallback(painter: &Painter, rect: Rect, app: &MapApp) {
    let (text, color) = if app.zoom.is_none() {
        (app.status_message.as_str(), colors::ui::ERROR)
    } else {
        match app.geographies.as_ref().map(|g| g.status()) {
            Some(GeographyStatus::Loading) => ("Loading geography...", colors::ui::VALUE),
            Some(GeographyStatus::Failed) => (app.status_message.as_str(), colors::ui::ERROR),
            _ => return,
        }
    };
    painter.text(
        rect.center(),
        Align2::CENTER_CENTER,
        text,
        FontId::proportional(16.0),
        color,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapcanvas::state::MapState;
    use mapcanvas::zoom::Transform;
    use mapcanvas::ErrorKind;

    #[test]
    fn test_backdrop_needs_a_map_in_scope() {
        let mut backdrop = Backdrop::default();
        let err = backdrop.sphere(&Scope::root()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Context);

        let map = MapState::default();
        let scope = Scope::root().with_map(&map).with_transform(Transform::IDENTITY);
        let sphere = backdrop.sphere(&scope).unwrap();
        assert!(!sphere.rings.is_empty());
        assert!(Rc::ptr_eq(&sphere, &backdrop.sphere(&scope).unwrap()));
    }

    #[test]
    fn test_land_points_use_point_color() {
        let style = land_style();
        assert_eq!(style.point_color, colors::map::POINT);
        assert_eq!(style.stroke.color, colors::map::LAND);
    }
}
