//! Map state management.
//!
//! Derived values (projection, path generator, prepared geometry) are cached
//! against input revisions so consumers re-derive only when a real input
//! changed. Context flows to consumers through an explicit [`Scope`].

mod geographies;
mod map;
mod memo;
mod scope;
mod settings;

pub use geographies::{
    Geographies, GeographyErrorCallback, GeographyStatus, Notify, PreparedGeographies,
};
pub use map::{MapState, DEFAULT_HEIGHT, DEFAULT_WIDTH};
pub use memo::Memo;
pub use scope::Scope;
pub use settings::ViewerSettings;
