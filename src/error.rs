//! Error taxonomy shared by every stage of the map pipeline.
//!
//! Construction-time failures (unknown projection, missing map context) are
//! returned to the caller. Per-feature failures never become a `MapError`;
//! they are dropped where they happen.

use serde_json::{Map, Value};
use std::fmt;

/// Broad category of a [`MapError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The geography could not be fetched (transport or HTTP failure).
    GeographyLoad,
    /// The geography payload is not a topology or feature collection.
    GeographyParse,
    /// Unknown projection name.
    Projection,
    /// Input failed a shape, range or type check.
    Validation,
    /// Input carried unsafe content.
    Security,
    /// Inconsistent configuration.
    Configuration,
    /// State accessed outside its owning scope.
    Context,
}

impl ErrorKind {
    /// Stable string code for this kind.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::GeographyLoad => "GEOGRAPHY_LOAD_ERROR",
            ErrorKind::GeographyParse => "GEOGRAPHY_PARSE_ERROR",
            ErrorKind::Projection => "PROJECTION_ERROR",
            ErrorKind::Validation => "VALIDATION_ERROR",
            ErrorKind::Security => "SECURITY_ERROR",
            ErrorKind::Configuration => "CONFIGURATION_ERROR",
            ErrorKind::Context => "CONTEXT_ERROR",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Error raised by the map pipeline.
#[derive(Debug, Clone)]
pub struct MapError {
    pub kind: ErrorKind,
    pub message: String,
    /// Geography (URL) the error relates to, if any.
    pub geography: Option<String>,
    /// Structured payload to aid debugging.
    pub details: Map<String, Value>,
    /// RFC 3339 creation time.
    pub timestamp: String,
}

impl MapError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            geography: None,
            details: Map::new(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Attaches the geography URL this error refers to.
    pub fn with_geography(mut self, geography: impl Into<String>) -> Self {
        self.geography = Some(geography.into());
        self
    }

    /// Adds one entry to the details payload.
    pub fn with_detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }

    /// Fetch failure for `url`, optionally wrapping the underlying cause.
    pub fn geography_fetch(
        kind: ErrorKind,
        message: impl Into<String>,
        url: Option<&str>,
        cause: Option<&dyn std::error::Error>,
    ) -> Self {
        let mut err = Self::new(kind, message);
        if let Some(url) = url {
            err.geography = Some(url.to_string());
        }
        if let Some(cause) = cause {
            err = err.with_detail("original_message", cause.to_string());
        }
        err
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Validation failure naming the offending field and value.
    pub fn invalid_field(message: impl Into<String>, field: &str, value: Value) -> Self {
        Self::validation(message)
            .with_detail("field", field)
            .with_detail("value", value)
    }

    pub fn security(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Security, message)
    }

    /// Security failure naming the operation that was rejected.
    pub fn security_op(message: impl Into<String>, operation: &str) -> Self {
        Self::security(message).with_detail("operation", operation)
    }

    /// Projection failure carrying the projection name that was requested.
    pub fn projection(message: impl Into<String>, name: &str) -> Self {
        Self::new(ErrorKind::Projection, message).with_detail("projection", name)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    pub fn context(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Context, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::GeographyParse, message)
    }
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.geography {
            Some(geography) => write!(f, "{}: {} ({})", self.kind, self.message, geography),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for MapError {}

pub type MapResult<T> = Result<T, MapError>;
