//! Shared types for the shapez viewer workspace.
//!
//! # Invariants
//! - Screen rectangles are expressed in logical (CSS-like) pixels with a
//!   top-left origin; only the scheduler converts them to bottom-left.
//! - Every error type in the workspace reports the component it came from.

mod tag;
mod types;

pub use tag::{Component, Tagged};
pub use types::{PixelRect, Transform, ViewRect};

pub fn crate_info() -> &'static str {
    "shapez-common v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("common"));
    }
}
