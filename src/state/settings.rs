//! Viewer settings.
//!
//! Read from the JSON file named by `MAPCANVAS_SETTINGS`, falling back to
//! `mapcanvas.json` in the working directory and then to defaults.

use crate::geo::{GraticuleStep, ProjectionConfig};
use crate::zoom::ZoomPanConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Everything the viewer needs to draw its first frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    pub width: f64,
    pub height: f64,
    /// Registered projection name.
    pub projection: String,
    pub projection_config: ProjectionConfig,
    /// Remote TopoJSON/GeoJSON document. Takes precedence over `geography_file`.
    pub geography_url: Option<String>,
    pub geography_file: Option<PathBuf>,
    pub zoom_pan: ZoomPanConfig,
    pub show_graticule: bool,
    pub graticule_step: GraticuleStep,
    pub show_sphere: bool,
    pub show_borders: bool,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            projection: "geoEqualEarth".to_string(),
            projection_config: ProjectionConfig::default(),
            geography_url: None,
            geography_file: None,
            zoom_pan: ZoomPanConfig::default(),
            show_graticule: true,
            graticule_step: GraticuleStep::default(),
            show_sphere: true,
            show_borders: true,
        }
    }
}

impl ViewerSettings {
    /// Environment variable naming the settings file.
    pub const ENV_VAR: &'static str = "MAPCANVAS_SETTINGS";
    /// Settings file looked up when the variable is unset.
    pub const DEFAULT_FILE: &'static str = "mapcanvas.json";

    /// Load settings from the configured file.
    pub fn load() -> Self {
        let path = std::env::var_os(Self::ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(Self::DEFAULT_FILE));
        if !path.exists() {
            log::info!("No settings file at {}, using defaults", path.display());
            return Self::default();
        }
        Self::load_from(&path)
    }

    /// Load settings from `path`, logging and falling back to defaults on
    /// any failure.
    pub fn load_from(path: &Path) -> Self {
        let json = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                log::warn!("Failed to read settings {}: {}", path.display(), e);
                return Self::default();
            }
        };

        match Self::parse(&json) {
            Ok(settings) => {
                log::info!("Loaded viewer settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("Failed to parse viewer settings: {}", e);
                Self::default()
            }
        }
    }

    /// Parses settings JSON, running the projection config through the
    /// validation boundary.
    pub fn parse(json: &str) -> crate::error::MapResult<Self> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| crate::error::MapError::configuration(format!("Invalid JSON: {}", e)))?;
        let mut settings: Self = serde_json::from_value(value.clone()).map_err(|e| {
            crate::error::MapError::configuration(format!("Invalid settings: {}", e))
        })?;
        if let Some(config) = value.get("projection_config") {
            settings.projection_config = crate::validation::validate_projection_config(config)?;
        }
        settings.projection = crate::validation::sanitize_str(&settings.projection, false)?;
        if let Some(url) = &settings.geography_url {
            settings.geography_url = Some(crate::validation::validate_url_str(url)?);
        }
        Ok(settings)
    }

    /// Save settings to `path` as pretty JSON.
    pub fn save(&self, path: &Path) {
        let json = match serde_json::to_string_pretty(self) {
            Ok(s) => s,
            Err(e) => {
                log::warn!("Failed to serialize viewer settings: {}", e);
                return;
            }
        };

        if let Err(e) = std::fs::write(path, json) {
            log::warn!("Failed to save viewer settings: {}", e);
        } else {
            log::info!("Saved viewer settings to {}", path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinates;

    #[test]
    fn test_partial_settings_keep_defaults() {
        let settings = ViewerSettings::parse(
            r#"{
                "projection": "geoOrthographic",
                "projection_config": { "rotate": [-10, -20, 0] },
                "zoom_pan": { "zoom": 2, "center": [10, 20] }
            }"#,
        )
        .unwrap();
        assert_eq!(settings.projection, "geoOrthographic");
        assert_eq!(settings.width, 800.0);
        assert_eq!(settings.zoom_pan.zoom, 2.0);
        assert_eq!(settings.zoom_pan.center, Coordinates::from_lon_lat(10.0, 20.0));
        assert_eq!(settings.zoom_pan.zoom_config.max_zoom, 8.0);
        assert!(settings.projection_config.rotate.is_some());
    }

    #[test]
    fn test_invalid_projection_config_is_rejected() {
        let err = ViewerSettings::parse(r#"{ "projection_config": { "scale": -1 } }"#).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Validation);
        assert!(ViewerSettings::parse("not json").is_err());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let settings = ViewerSettings::load_from(Path::new("/nonexistent/mapcanvas.json"));
        assert_eq!(settings, ViewerSettings::default());
    }
}
