//! Input validation at the dynamic boundary.
//!
//! Everything that arrives as loosely typed JSON (settings files, props from
//! a host, projection configs) passes through here before it reaches the
//! typed pipeline. Limits come from one process-wide [`ValidationConfig`].

mod content;
mod security;

pub use content::{
    sanitize_svg, validate_class_name, validate_component_props, validate_event_handler,
    validate_style_object, ALLOWED_STYLE_PROPERTIES,
};
pub use security::{
    validate_security_config, validate_sri_config, SecurityConfig, SriAlgorithm, SriConfig,
};

use crate::error::{MapError, MapResult};
use crate::geo::{Coordinates, Latitude, Longitude, Parallels, ProjectionConfig, RotationAngles};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::RwLock;

/// Process-wide validation limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub strict_mode: bool,
    /// Skips SVG sanitization entirely.
    pub allow_unsafe_content: bool,
    pub max_string_length: usize,
    pub max_array_length: usize,
    pub max_object_depth: usize,
}

impl ValidationConfig {
    pub const DEFAULT: ValidationConfig = ValidationConfig {
        strict_mode: true,
        allow_unsafe_content: false,
        max_string_length: 10_000,
        max_array_length: 1_000,
        max_object_depth: 10,
    };
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

static CONFIG: RwLock<ValidationConfig> = RwLock::new(ValidationConfig::DEFAULT);

/// Current validation limits.
pub fn validation_config() -> ValidationConfig {
    *CONFIG.read().unwrap_or_else(|e| e.into_inner())
}

/// Replaces the validation limits with the defaults as modified by
/// `update`. Earlier calls are not merged.
pub fn configure_validation(update: impl FnOnce(&mut ValidationConfig)) {
    let mut config = ValidationConfig::DEFAULT;
    update(&mut config);
    log::debug!("Validation config set to {:?}", config);
    *CONFIG.write().unwrap_or_else(|e| e.into_inner()) = config;
}

/// JSON type name used in error messages.
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub fn sanitize_string(input: &Value) -> MapResult<String> {
    sanitize_string_with(input, false)
}

pub fn sanitize_string_with(input: &Value, allow_html: bool) -> MapResult<String> {
    match input {
        Value::String(s) => sanitize_str(s, allow_html),
        other => Err(MapError::validation(format!(
            "Expected string, got {}",
            type_name(other)
        ))),
    }
}

/// Strips markup, entities and script-bearing URL schemes (unless
/// `allow_html`), then control characters other than tab, newline and
/// carriage return.
pub fn sanitize_str(input: &str, allow_html: bool) -> MapResult<String> {
    let max = validation_config().max_string_length;
    let length = input.chars().count();
    if length > max {
        return Err(MapError::validation(format!(
            "String too long: {} characters (max: {})",
            length, max
        )));
    }

    let mut sanitized = input.to_string();
    if !allow_html {
        sanitized = strip_delimited(&sanitized, '<', '>', true);
        sanitized = strip_delimited(&sanitized, '&', ';', false);
        for scheme in ["javascript:", "data:", "vbscript:"] {
            sanitized = remove_ignore_case(&sanitized, scheme);
        }
    }
    sanitized.retain(|c| !is_stripped_control(c));
    Ok(sanitized)
}

fn is_stripped_control(c: char) -> bool {
    matches!(c, '\u{00}'..='\u{08}' | '\u{0B}' | '\u{0C}' | '\u{0E}'..='\u{1F}' | '\u{7F}')
}

/// Removes every `open ... close` span. With `allow_empty` false at least
/// one character must sit between the delimiters.
fn strip_delimited(input: &str, open: char, close: char, allow_empty: bool) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find(open) {
        let after = &rest[start + open.len_utf8()..];
        match after.find(close) {
            Some(end) if allow_empty || end > 0 => {
                out.push_str(&rest[..start]);
                rest = &after[end + close.len_utf8()..];
            }
            _ => {
                out.push_str(&rest[..start + open.len_utf8()]);
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Removes every ASCII case-insensitive occurrence of `pattern`.
pub(crate) fn remove_ignore_case(input: &str, pattern: &str) -> String {
    remove_ignore_case_unless(input, pattern, None)
}

/// Like [`remove_ignore_case`], keeping occurrences directly followed by
/// `keep_before`.
pub(crate) fn remove_ignore_case_unless(
    input: &str,
    pattern: &str,
    keep_before: Option<&str>,
) -> String {
    let lower = input.to_ascii_lowercase();
    let pattern = pattern.to_ascii_lowercase();
    let keep_before = keep_before.map(str::to_ascii_lowercase);
    let mut out = String::with_capacity(input.len());
    let mut copied = 0;
    let mut search = 0;
    while let Some(found) = lower[search..].find(&pattern) {
        let start = search + found;
        let end = start + pattern.len();
        let kept = keep_before
            .as_deref()
            .is_some_and(|k| lower[end..].starts_with(k));
        if !kept {
            out.push_str(&input[copied..start]);
            copied = end;
        }
        search = end;
    }
    out.push_str(&input[copied..]);
    out
}

/// Parses and normalizes a URL, rejecting script-capable or local schemes
/// and suspicious hostnames.
pub fn validate_url(input: &Value) -> MapResult<String> {
    let sanitized = sanitize_string(input)?;
    validate_url_str(&sanitized)
}

pub(crate) fn validate_url_str(input: &str) -> MapResult<String> {
    let url = reqwest::Url::parse(input)
        .map_err(|_| MapError::validation(format!("Invalid URL format: {}", input)))?;

    let scheme = url.scheme().to_ascii_lowercase();
    if ["javascript", "data", "vbscript", "file"].contains(&scheme.as_str()) {
        return Err(MapError::security_op(
            format!("Dangerous protocol detected: {}:", scheme),
            "validate_url",
        ));
    }
    if let Some(host) = url.host_str() {
        if host.contains("..") || host.contains('%') {
            return Err(MapError::security_op(
                format!("Invalid hostname: {}", host),
                "validate_url",
            ));
        }
    }
    Ok(url.to_string())
}

/// A finite number within `[min, max]`.
pub fn validate_number(input: &Value, min: f64, max: f64) -> MapResult<f64> {
    let value = match input {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        other => {
            return Err(MapError::validation(format!(
                "Expected number, got {}",
                type_name(other)
            )))
        }
    };
    check_range(value, min, max)
}

fn check_range(value: f64, min: f64, max: f64) -> MapResult<f64> {
    if !value.is_finite() {
        return Err(MapError::validation("Number must be finite"));
    }
    if value < min || value > max {
        return Err(MapError::validation(format!(
            "Number {} is outside allowed range [{}, {}]",
            value, min, max
        )));
    }
    Ok(value)
}

/// Exactly `[lon, lat]` with lon in [-180, 180] and lat in [-90, 90].
pub fn validate_coordinates(input: &Value) -> MapResult<Coordinates> {
    match input.as_array().map(Vec::as_slice) {
        Some([lon, lat]) => Ok(Coordinates::new(
            Longitude(validate_number(lon, -180.0, 180.0)?),
            Latitude(validate_number(lat, -90.0, 90.0)?),
        )),
        _ => Err(MapError::invalid_field(
            "Coordinates must be an array of exactly 2 numbers",
            "coordinates",
            input.clone(),
        )),
    }
}

/// An array no longer than the configured maximum.
pub fn validate_array(input: &Value) -> MapResult<&Vec<Value>> {
    let items = input.as_array().ok_or_else(|| {
        MapError::validation(format!("Expected array, got {}", type_name(input)))
    })?;
    let max = validation_config().max_array_length;
    if items.len() > max {
        return Err(MapError::validation(format!(
            "Array too long: {} items (max: {})",
            items.len(),
            max
        )));
    }
    Ok(items)
}

/// [`validate_array`] plus a per-item validator; item errors report their
/// index.
pub fn validate_array_with<T, F>(input: &Value, mut item: F) -> MapResult<Vec<T>>
where
    F: FnMut(&Value, usize) -> MapResult<T>,
{
    validate_array(input)?
        .iter()
        .enumerate()
        .map(|(index, value)| {
            item(value, index).map_err(|e| {
                MapError::validation(format!(
                    "Invalid array item at index {}: {}",
                    index, e.message
                ))
            })
        })
        .collect()
}

/// An object whose keys are sanitized and whose nesting stays within the
/// configured depth.
pub fn validate_object(input: &Value) -> MapResult<Map<String, Value>> {
    validate_object_at(input, 0)
}

fn validate_object_at(input: &Value, depth: usize) -> MapResult<Map<String, Value>> {
    let object = input.as_object().ok_or_else(|| {
        MapError::validation(format!("Expected object, got {}", type_name(input)))
    })?;
    let max = validation_config().max_object_depth;
    if depth > max {
        return Err(MapError::validation(format!(
            "Object nesting too deep: {} levels (max: {})",
            depth, max
        )));
    }

    let mut validated = Map::new();
    for (key, value) in object {
        let key = sanitize_str(key, false)?;
        let value = match value {
            Value::Object(_) => Value::Object(validate_object_at(value, depth + 1)?),
            other => other.clone(),
        };
        validated.insert(key, value);
    }
    Ok(validated)
}

const ROTATE_LIMIT: f64 = 360.0;
const SCALE_RANGE: (f64, f64) = (0.1, 10_000.0);
const PARALLEL_LIMIT: f64 = 90.0;

/// Builds a [`ProjectionConfig`] from untyped input. `rotate` and
/// `parallels` are only taken when they have exactly 3 and 2 entries.
pub fn validate_projection_config(input: &Value) -> MapResult<ProjectionConfig> {
    let object = validate_object(input)?;
    let mut config = ProjectionConfig::default();

    if let Some(center) = object.get("center") {
        config.center = Some(validate_coordinates(center)?);
    }
    if let Some(rotate) = object.get("rotate").filter(|v| v.is_array()) {
        let angles = validate_array_with(rotate, |v, _| {
            validate_number(v, -ROTATE_LIMIT, ROTATE_LIMIT)
        })?;
        if let [lambda, phi, gamma] = angles[..] {
            config.rotate = Some(RotationAngles::new(lambda, phi, gamma));
        }
    }
    if let Some(scale) = object.get("scale") {
        config.scale = Some(validate_number(scale, SCALE_RANGE.0, SCALE_RANGE.1)?);
    }
    if let Some(parallels) = object.get("parallels").filter(|v| v.is_array()) {
        let values = validate_array_with(parallels, |v, _| {
            validate_number(v, -PARALLEL_LIMIT, PARALLEL_LIMIT)
        })?;
        if let [p1, p2] = values[..] {
            config.parallels = Some(Parallels::new(p1, p2));
        }
    }
    Ok(config)
}

/// Applies the [`validate_projection_config`] limits to an already typed
/// config.
pub fn check_projection_config(config: &ProjectionConfig) -> MapResult<()> {
    if let Some(center) = config.center {
        check_range(center.lon(), -180.0, 180.0)?;
        check_range(center.lat(), -90.0, 90.0)?;
    }
    if let Some(RotationAngles(angles)) = config.rotate {
        for angle in angles {
            check_range(angle, -ROTATE_LIMIT, ROTATE_LIMIT)?;
        }
    }
    if let Some(scale) = config.scale {
        check_range(scale, SCALE_RANGE.0, SCALE_RANGE.1)?;
    }
    if let Some(Parallels(parallels)) = config.parallels {
        for parallel in parallels {
            check_range(parallel, -PARALLEL_LIMIT, PARALLEL_LIMIT)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_sanitize_strips_markup() {
        assert_eq!(
            sanitize_string(&json!("<script>alert(1)</script>")).unwrap(),
            "alert(1)"
        );
        assert_eq!(
            sanitize_string(&json!("a &amp; b JavaScript:x DATA:y")).unwrap(),
            "a  b x y"
        );
        assert_eq!(sanitize_string(&json!("a\u{0}b\tc\n")).unwrap(), "ab\tc\n");
        // Unterminated markers are left alone.
        assert_eq!(sanitize_string(&json!("1 < 2 & 3")).unwrap(), "1 < 2 & 3");
    }

    #[test]
    fn test_sanitize_allows_html_when_asked() {
        assert_eq!(
            sanitize_string_with(&json!("<b>bold</b>"), true).unwrap(),
            "<b>bold</b>"
        );
    }

    #[test]
    fn test_sanitize_rejects_non_strings() {
        let err = sanitize_string(&json!(42)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.message, "Expected string, got number");
    }

    #[test]
    fn test_configured_string_limit() {
        let long = "x".repeat(6_000);
        assert!(sanitize_str(&long, false).is_ok());
        configure_validation(|c| c.max_string_length = 5_000);
        let result = sanitize_str(&long, false);
        configure_validation(|_| {});
        assert_eq!(result.unwrap_err().kind, ErrorKind::Validation);
        assert_eq!(validation_config(), ValidationConfig::default());
    }

    #[test]
    fn test_validate_url() {
        assert_eq!(
            validate_url(&json!("https://example.com/world.json")).unwrap(),
            "https://example.com/world.json"
        );
        let err = validate_url(&json!("file:///etc/passwd")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Security);
        // The scheme is stripped by sanitizing, leaving an unparsable URL.
        let err = validate_url(&json!("javascript:alert(1)")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        let err = validate_url(&json!("not a url")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[test]
    fn test_validate_coordinates() {
        let c = validate_coordinates(&json!([10.5, -20])).unwrap();
        assert_eq!(c, Coordinates::from_lon_lat(10.5, -20.0));
        for bad in [json!([190, 0]), json!([0, 91]), json!([1]), json!("x"), json!([0, "a"])] {
            assert_eq!(
                validate_coordinates(&bad).unwrap_err().kind,
                ErrorKind::Validation,
                "{}",
                bad
            );
        }
    }

    #[test]
    fn test_validate_array_reports_index() {
        let err = validate_array_with(&json!([1, "two"]), |v, _| validate_number(v, 0.0, 10.0))
            .unwrap_err();
        assert!(err.message.starts_with("Invalid array item at index 1"));
    }

    #[test]
    fn test_validate_object_depth() {
        let mut deep = json!(1);
        for _ in 0..12 {
            deep = json!({ "n": deep });
        }
        assert!(validate_object(&deep).is_err());
        let obj = validate_object(&json!({ "<b>key</b>": { "x": 1 } })).unwrap();
        assert!(obj.contains_key("key"));
    }

    #[test]
    fn test_validate_projection_config() {
        let config = validate_projection_config(&json!({
            "center": [10, 20],
            "rotate": [-10, 0, 0],
            "scale": 200,
            "parallels": [20, 50, 60],
        }))
        .unwrap();
        assert_eq!(config.center, Some(Coordinates::from_lon_lat(10.0, 20.0)));
        assert_eq!(config.rotate, Some(RotationAngles::new(-10.0, 0.0, 0.0)));
        assert_eq!(config.scale, Some(200.0));
        // Three parallels are ignored rather than rejected.
        assert_eq!(config.parallels, None);

        assert!(validate_projection_config(&json!({ "scale": 0.01 })).is_err());
        assert!(validate_projection_config(&json!({ "rotate": [400, 0, 0] })).is_err());
        assert!(validate_projection_config(&json!([])).is_err());
    }

    #[test]
    fn test_check_projection_config() {
        assert!(check_projection_config(&ProjectionConfig::default()).is_ok());
        let config = ProjectionConfig {
            scale: Some(f64::INFINITY),
            ..ProjectionConfig::default()
        };
        assert!(check_projection_config(&config).is_err());
    }
}
