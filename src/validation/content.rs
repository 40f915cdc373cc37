//! Sanitizers for presentation content: SVG markup, class names, style
//! objects, event handler references and generic component props.

use super::{
    remove_ignore_case, remove_ignore_case_unless, sanitize_str, sanitize_string, type_name,
    validate_array, validate_object, validation_config,
};
use crate::error::{MapError, MapResult};
use serde_json::{Map, Value};

/// Style keys that survive [`validate_style_object`].
pub const ALLOWED_STYLE_PROPERTIES: &[&str] = &[
    "fill",
    "stroke",
    "strokeWidth",
    "strokeDasharray",
    "strokeLinecap",
    "strokeLinejoin",
    "opacity",
    "fillOpacity",
    "strokeOpacity",
    "transform",
    "cursor",
    "pointerEvents",
    "transition",
    "fontSize",
    "fontFamily",
    "fontWeight",
    "textAnchor",
    "alignmentBaseline",
    "dominantBaseline",
];

const UNSAFE_STYLE_VALUES: &[&str] = &["javascript:", "expression(", "url(", "@import"];

const UNSAFE_HANDLER_PATTERNS: &[&str] = &[
    "eval(",
    "Function(",
    "setTimeout(",
    "setInterval(",
    "document.write",
    "innerHTML",
    "outerHTML",
    "insertAdjacentHTML",
];

/// Removes script-capable elements, inline `on*=` handlers and script URL
/// schemes from SVG markup. A no-op when unsafe content is allowed.
pub fn sanitize_svg(svg: &str) -> String {
    if validation_config().allow_unsafe_content {
        return svg.to_string();
    }
    let mut sanitized = svg.to_string();
    for tag in ["script", "iframe", "object"] {
        sanitized = remove_elements(&sanitized, tag);
    }
    sanitized = remove_open_tags(&sanitized, "embed");
    sanitized = remove_inline_handlers(&sanitized);
    sanitized = remove_ignore_case(&sanitized, "javascript:");
    sanitized = remove_ignore_case_unless(&sanitized, "data:", Some("image/"));
    remove_ignore_case(&sanitized, "vbscript:")
}

/// Drops `<tag ...>...</tag>` spans (case-insensitive, shortest match).
fn remove_elements(input: &str, tag: &str) -> String {
    let lower = input.to_ascii_lowercase();
    let open = format!("<{}", tag);
    let close = format!("</{}>", tag);
    let mut out = String::with_capacity(input.len());
    let mut copied = 0;
    let mut search = 0;
    while let Some(found) = lower[search..].find(&open) {
        let start = search + found;
        let span_end = lower[start..].find('>').and_then(|gt| {
            let body = start + gt + 1;
            lower[body..].find(&close).map(|c| body + c + close.len())
        });
        match span_end {
            Some(end) => {
                out.push_str(&input[copied..start]);
                copied = end;
                search = end;
            }
            None => search = start + open.len(),
        }
    }
    out.push_str(&input[copied..]);
    out
}

/// Drops `<tag ...>` openers (case-insensitive).
fn remove_open_tags(input: &str, tag: &str) -> String {
    let lower = input.to_ascii_lowercase();
    let open = format!("<{}", tag);
    let mut out = String::with_capacity(input.len());
    let mut copied = 0;
    let mut search = 0;
    while let Some(found) = lower[search..].find(&open) {
        let start = search + found;
        match lower[start..].find('>') {
            Some(gt) => {
                out.push_str(&input[copied..start]);
                copied = start + gt + 1;
                search = copied;
            }
            None => search = start + open.len(),
        }
    }
    out.push_str(&input[copied..]);
    out
}

/// Drops `on<word>=` attribute prefixes, whitespace before `=` included.
fn remove_inline_handlers(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = String::with_capacity(input.len());
    let mut copied = 0;
    let mut i = 0;
    while i + 1 < bytes.len() {
        if bytes[i].eq_ignore_ascii_case(&b'o') && bytes[i + 1].eq_ignore_ascii_case(&b'n') {
            let mut j = i + 2;
            while j < bytes.len() && (bytes[j].is_ascii_alphanumeric() || bytes[j] == b'_') {
                j += 1;
            }
            if j > i + 2 {
                let mut k = j;
                while k < bytes.len() && bytes[k].is_ascii_whitespace() {
                    k += 1;
                }
                if k < bytes.len() && bytes[k] == b'=' {
                    out.push_str(&input[copied..i]);
                    copied = k + 1;
                    i = copied;
                    continue;
                }
            }
        }
        i += 1;
    }
    out.push_str(&input[copied..]);
    out
}

/// Keeps letters, digits, `-`, `_` and single spaces.
pub fn validate_class_name(input: &Value) -> MapResult<String> {
    let sanitized = sanitize_string(input)?;
    let cleaned: String = sanitized
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_') || c.is_whitespace())
        .collect();
    Ok(cleaned.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Filters a style object down to allow-listed keys with safe values.
/// `null` yields an empty style.
pub fn validate_style_object(input: &Value) -> MapResult<Map<String, Value>> {
    if input.is_null() {
        return Ok(Map::new());
    }
    let object = validate_object(input)?;
    let mut style = Map::new();
    for (key, value) in object {
        if !ALLOWED_STYLE_PROPERTIES.contains(&key.as_str()) {
            continue;
        }
        match value {
            Value::String(s) => {
                let s = sanitize_str(&s, false)?;
                if UNSAFE_STYLE_VALUES.iter().any(|p| s.contains(p)) {
                    log::debug!("Dropping unsafe style value for {}", key);
                    continue;
                }
                style.insert(key, Value::String(s));
            }
            Value::Number(n) if n.as_f64().is_some_and(f64::is_finite) => {
                style.insert(key, Value::Number(n));
            }
            _ => {}
        }
    }
    Ok(style)
}

/// Handler references are named actions or inline snippets. `null` means
/// no handler.
pub fn validate_event_handler(input: &Value) -> MapResult<Option<String>> {
    let handler = match input {
        Value::Null => return Ok(None),
        Value::String(s) => s,
        other => {
            return Err(MapError::validation(format!(
                "Event handler must be a string, got {}",
                type_name(other)
            )))
        }
    };
    if let Some(pattern) = UNSAFE_HANDLER_PATTERNS.iter().find(|p| handler.contains(*p)) {
        return Err(MapError::security_op(
            format!("Event handler contains potentially dangerous code: {}", pattern),
            "validate_event_handler",
        ));
    }
    Ok(Some(handler.clone()))
}

/// Keeps the allow-listed props, each checked by the validator its key or
/// value type calls for. Nulls are dropped.
pub fn validate_component_props(
    props: &Value,
    allowed: &[&str],
) -> MapResult<Map<String, Value>> {
    let object = validate_object(props)?;
    let mut validated = Map::new();
    for (key, value) in object {
        if !allowed.contains(&key.as_str()) {
            continue;
        }
        let checked = if key == "className" {
            Value::String(validate_class_name(&value)?)
        } else if key == "style" {
            Value::Object(validate_style_object(&value)?)
        } else if key.starts_with("on") && value.is_string() {
            match validate_event_handler(&value)? {
                Some(handler) => Value::String(handler),
                None => continue,
            }
        } else {
            match &value {
                Value::String(s) => Value::String(sanitize_str(s, false)?),
                Value::Number(n) if n.as_f64().is_some_and(f64::is_finite) => value.clone(),
                Value::Bool(_) => value.clone(),
                Value::Array(_) => Value::Array(validate_array(&value)?.clone()),
                Value::Object(_) => Value::Object(validate_object(&value)?),
                _ => continue,
            }
        };
        validated.insert(key, checked);
    }
    Ok(validated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_sanitize_svg() {
        let svg = r#"<svg onload="x()"><SCRIPT type="t">alert(1)</script><path d="M0,0"/><embed src="a"><image href="data:image/png;base64,AA"/><a href="javascript:go()">x</a></svg>"#;
        let clean = sanitize_svg(svg);
        assert!(!clean.to_lowercase().contains("script"));
        assert!(!clean.contains("onload"));
        assert!(!clean.contains("<embed"));
        assert!(clean.contains("data:image/png"));
        assert!(clean.contains(r#"<path d="M0,0"/>"#));
    }

    #[test]
    fn test_inline_handler_needs_equals() {
        assert_eq!(remove_inline_handlers("button one=1 onclick =f"), "button 1 f");
        assert_eq!(remove_inline_handlers("on"), "on");
    }

    #[test]
    fn test_class_name() {
        assert_eq!(
            validate_class_name(&json!("  map<x>  geo$graphy   active ")).unwrap(),
            "map geography active"
        );
        assert!(validate_class_name(&json!(null)).is_err());
    }

    #[test]
    fn test_style_object_filters() {
        let style = validate_style_object(&json!({
            "fill": "#fff",
            "strokeWidth": 0.5,
            "background": "red",
            "stroke": "url(#x)",
        }))
        .unwrap();
        assert_eq!(style.len(), 2);
        assert_eq!(style["fill"], "#fff");
        assert_eq!(style["strokeWidth"], 0.5);
        assert!(validate_style_object(&Value::Null).unwrap().is_empty());
    }

    #[test]
    fn test_event_handler() {
        assert_eq!(validate_event_handler(&Value::Null).unwrap(), None);
        assert_eq!(
            validate_event_handler(&json!("select_country")).unwrap(),
            Some("select_country".to_string())
        );
        let err = validate_event_handler(&json!("eval(code)")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Security);
        let err = validate_event_handler(&json!(3)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[test]
    fn test_component_props() {
        let props = validate_component_props(
            &json!({
                "className": "a b",
                "onClick": "zoom_in",
                "title": "<i>World</i>",
                "width": 800,
                "hidden": false,
                "secret": "x",
                "extra": null,
            }),
            &["className", "onClick", "title", "width", "hidden", "extra"],
        )
        .unwrap();
        assert_eq!(props["className"], "a b");
        assert_eq!(props["onClick"], "zoom_in");
        assert_eq!(props["title"], "World");
        assert_eq!(props["width"], 800);
        assert_eq!(props["hidden"], false);
        assert!(!props.contains_key("secret"));
        assert!(!props.contains_key("extra"));
    }
}
