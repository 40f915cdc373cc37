//! Feature preparation: features and mesh lines run through a path
//! generator, keeping only what renders.

use crate::geo::{GeoObject, PathGenerator, ProjectedPath};
use geojson::{Feature, Geometry};

/// A feature with its SVG path data and screen-space geometry.
#[derive(Debug, Clone)]
pub struct PreparedFeature {
    pub feature: Feature,
    /// Never empty.
    pub svg_path: String,
    pub projected: ProjectedPath,
}

/// Path data for the mesh lines that rendered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreparedMesh {
    pub outline: Option<String>,
    pub borders: Option<String>,
    pub outline_projected: Option<ProjectedPath>,
    pub borders_projected: Option<ProjectedPath>,
}

/// Prepares features with an arbitrary path function. Features whose path
/// is missing or empty are dropped.
pub fn prepare_features_with<F>(features: &[Feature], mut path: F) -> Vec<PreparedFeature>
where
    F: FnMut(&Feature) -> Option<(String, ProjectedPath)>,
{
    features
        .iter()
        .filter_map(|feature| {
            let (svg_path, projected) = path(feature)?;
            if svg_path.is_empty() {
                return None;
            }
            Some(PreparedFeature {
                feature: feature.clone(),
                svg_path,
                projected,
            })
        })
        .collect()
}

fn render(path: &PathGenerator, object: GeoObject<'_>) -> Option<(String, ProjectedPath)> {
    let projected = path.project(object);
    if projected.is_empty() {
        return None;
    }
    let svg = path.svg_of(&projected);
    Some((svg, projected))
}

/// Prepares features through the path generator.
pub fn prepare_features(features: &[Feature], path: &PathGenerator) -> Vec<PreparedFeature> {
    prepare_features_with(features, |feature| render(path, GeoObject::Feature(feature)))
}

/// Prepares the outline and border lines; absent or invisible ones stay
/// `None`.
pub fn prepare_mesh(
    outline: Option<&Geometry>,
    borders: Option<&Geometry>,
    path: &PathGenerator,
) -> PreparedMesh {
    let outline = outline.and_then(|g| render(path, GeoObject::Geometry(g)));
    let borders = borders.and_then(|g| render(path, GeoObject::Geometry(g)));
    let (outline, outline_projected) = outline.unzip();
    let (borders, borders_projected) = borders.unzip();
    PreparedMesh {
        outline,
        borders,
        outline_projected,
        borders_projected,
    }
}
