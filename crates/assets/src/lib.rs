//! Quarter asset pipeline: fragment loaders and the quarter registry.
//!
//! Every quarter type code maps to one mesh fragment. Fragments come from a
//! [`FragmentLoader`]; the [`QuarterRegistry`] resolves the full set once and
//! hands the same [`QuarterMap`] to every consumer.
//!
//! # Layout
//! Directory fragments are stored as `<name>.json` files holding
//! [`shapez_scene::MeshData`].

mod error;
mod loader;
mod registry;

pub use error::AssetError;
pub use loader::{DirectoryLoader, FragmentLoader, ProceduralLoader, FRAGMENT_HEIGHT, write_fragment};
pub use registry::{MeshFragment, QUARTER_FRAGMENTS, QuarterMap, QuarterRegistry};

pub fn crate_info() -> &'static str {
    "shapez-assets v0.1.0"
}
