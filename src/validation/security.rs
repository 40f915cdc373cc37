//! Fetch security settings and subresource integrity descriptors.

use super::{sanitize_string, validate_array_with, validate_number, validate_object};
use crate::error::{MapError, MapResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Overrides for how geography is fetched. Absent fields keep their
/// defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct SecurityConfig {
    pub timeout_ms: Option<u64>,
    pub max_response_size: Option<u64>,
    pub allowed_content_types: Option<Vec<String>>,
    pub allowed_protocols: Option<Vec<String>>,
    pub allow_http_localhost: Option<bool>,
    pub strict_https_only: Option<bool>,
}

const TIMEOUT_RANGE: (f64, f64) = (1_000.0, 60_000.0);
const RESPONSE_SIZE_RANGE: (f64, f64) = (1024.0, 100.0 * 1024.0 * 1024.0);

fn flag(object: &Map<String, Value>, key: &str) -> MapResult<Option<bool>> {
    match object.get(key) {
        None => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(MapError::validation(format!("{} must be a boolean", key))),
    }
}

pub fn validate_security_config(input: &Value) -> MapResult<SecurityConfig> {
    let object = validate_object(input)?;
    let mut config = SecurityConfig::default();

    if let Some(timeout) = object.get("TIMEOUT_MS") {
        config.timeout_ms = Some(validate_number(timeout, TIMEOUT_RANGE.0, TIMEOUT_RANGE.1)? as u64);
    }
    if let Some(size) = object.get("MAX_RESPONSE_SIZE") {
        config.max_response_size = Some(validate_number(
            size,
            RESPONSE_SIZE_RANGE.0,
            RESPONSE_SIZE_RANGE.1,
        )? as u64);
    }
    if let Some(types) = object.get("ALLOWED_CONTENT_TYPES") {
        config.allowed_content_types =
            Some(validate_array_with(types, |item, _| sanitize_string(item))?);
    }
    if let Some(protocols) = object.get("ALLOWED_PROTOCOLS") {
        config.allowed_protocols = Some(validate_array_with(protocols, |item, _| {
            let protocol = sanitize_string(item)?;
            if protocol != "https:" && protocol != "http:" {
                return Err(MapError::validation(format!("Invalid protocol: {}", protocol)));
            }
            Ok(protocol)
        })?);
    }
    config.allow_http_localhost = flag(&object, "ALLOW_HTTP_LOCALHOST")?;
    config.strict_https_only = flag(&object, "STRICT_HTTPS_ONLY")?;
    Ok(config)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SriAlgorithm {
    Sha256,
    Sha384,
    Sha512,
}

impl SriAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            SriAlgorithm::Sha256 => "sha256",
            SriAlgorithm::Sha384 => "sha384",
            SriAlgorithm::Sha512 => "sha512",
        }
    }

    fn parse(name: &str) -> Option<Self> {
        match name {
            "sha256" => Some(SriAlgorithm::Sha256),
            "sha384" => Some(SriAlgorithm::Sha384),
            "sha512" => Some(SriAlgorithm::Sha512),
            _ => None,
        }
    }
}

/// Subresource integrity descriptor for a geography file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SriConfig {
    pub algorithm: SriAlgorithm,
    /// `<algorithm>-<base64 digest>`.
    pub hash: String,
    pub enforce_integrity: bool,
}

pub fn validate_sri_config(input: &Value) -> MapResult<SriConfig> {
    let object = validate_object(input)?;
    let (Some(algorithm), Some(hash), Some(enforce)) = (
        object.get("algorithm"),
        object.get("hash"),
        object.get("enforceIntegrity"),
    ) else {
        return Err(MapError::validation(
            "SRI config must have algorithm, hash, and enforceIntegrity properties",
        ));
    };

    let name = sanitize_string(algorithm)?;
    let algorithm = SriAlgorithm::parse(&name)
        .ok_or_else(|| MapError::validation(format!("Invalid SRI algorithm: {}", name)))?;

    let hash = sanitize_string(hash)?;
    if !hash.starts_with(&format!("{}-", algorithm.as_str())) {
        return Err(MapError::validation(format!(
            "SRI hash must start with {}-",
            algorithm.as_str()
        )));
    }

    let enforce_integrity = enforce
        .as_bool()
        .ok_or_else(|| MapError::validation("enforceIntegrity must be a boolean"))?;

    Ok(SriConfig {
        algorithm,
        hash,
        enforce_integrity,
    })
}
