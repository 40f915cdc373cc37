//! Explicit context passing from providers to consumers.

use super::map::MapState;
use crate::error::{MapError, MapResult};
use crate::zoom::Transform;

/// What a consumer can see of its providers. Built from [`Scope::root`] and
/// narrowed by each provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scope<'a> {
    map: Option<&'a MapState>,
    transform: Option<Transform>,
}

impl<'a> Scope<'a> {
    /// A scope with no providers.
    pub fn root() -> Self {
        Self::default()
    }

    /// Child scope in which `map` is the map context.
    pub fn with_map<'b>(&self, map: &'b MapState) -> Scope<'b>
    where
        'a: 'b,
    {
        Scope {
            map: Some(map),
            transform: self.transform,
        }
    }

    /// Child scope inside a zoomable group.
    pub fn with_transform(&self, transform: Transform) -> Scope<'a> {
        Scope {
            map: self.map,
            transform: Some(transform),
        }
    }

    pub fn map_context(&self) -> MapResult<&'a MapState> {
        self.map
            .ok_or_else(|| MapError::context("map context must be used within a MapProvider"))
    }

    /// The enclosing zoom transform, identity outside a zoomable group.
    pub fn transform(&self) -> Transform {
        self.transform.unwrap_or(Transform::IDENTITY)
    }
}
