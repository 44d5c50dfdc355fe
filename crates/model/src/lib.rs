//! Shape assembly: turns decoded shape data into a populated scene per view.
//!
//! Every [`ShapeView`] owns a fixed hierarchy built once at construction: a
//! base stand holding four layer slots, each holding four quarter slots.
//! Assembly only ever adds or removes meshes under quarter slots; the slots
//! themselves never move except through the explode toggles.
//!
//! # Invariants
//! - Assembling requires a resolved quarter map.
//! - Empty quarters attach nothing.
//! - Crystal quarters always use the crystal material.
//! - Expand then collapse restores every slot transform exactly.

mod error;
mod palette;
mod view;

pub use error::AssemblyError;
pub use palette::Palette;
pub use view::{ShapeView, base_stand};

use glam::Vec3;

pub use shapez_parser::{MAX_LAYERS, MAX_QUARTERS};

/// Height the base stand is lowered by, and the bottom layer raised by.
pub const BASE_OFFSET: f32 = 0.05;
pub const LAYER_HEIGHT: f32 = 0.1;
/// Each layer up is this much narrower than the one below.
pub const LAYER_SCALE_FACTOR: f32 = 0.24;
/// Local direction a quarter slot moves along when quarters are expanded.
pub const QUARTER_EXPAND_OFFSET: Vec3 = Vec3::new(0.3, 0.0, 0.3);

pub fn crate_info() -> &'static str {
    "shapez-model v0.1.0"
}
