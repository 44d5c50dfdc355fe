//! Shape viewers: the public face of the workspace.
//!
//! A [`MultiShapeViewer`] owns one render surface and any number of
//! [`ShapeView`]s drawn into it; a [`ShapeViewer`] is the same thing with a
//! single view covering the whole surface. Both take their quarter fragments
//! from a [`QuarterRegistry`] the caller constructs once and shares.
//!
//! # Lifecycle
//! 1. `new` checks the platform and builds every view's fixed structure.
//! 2. `init` resolves the registry and assembles every view.
//! 3. `frame` (or the render loop) draws; `assign`, the toggles, `resize` and
//!    `set_region` may be called between frames.
//!
//! [`ShapeView`]: shapez_model::ShapeView
//! [`QuarterRegistry`]: shapez_assets::QuarterRegistry

mod config;
mod error;
mod layout;
mod platform;
mod single;
mod viewer;

pub use config::{ConfigError, FragmentSource, ViewConfig, ViewerConfig};
pub use error::ViewerError;
pub use layout::grid_layout;
pub use platform::{Headless, Platform, ensure_supported};
pub use single::ShapeViewer;
pub use viewer::{MultiShapeViewer, ShapeViewOption, SurfaceSize};

pub fn crate_info() -> &'static str {
    "shapez-viewer v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("viewer"));
    }
}
