//! Scene description consumed by render backends.
//!
//! A [`SceneGraph`] is an arena of transform nodes; mesh nodes reference
//! shared [`Geometry`] and [`Material`] data through `Arc`, so cloning a mesh
//! instance never copies vertex data or paint.
//!
//! # Invariants
//! - Geometry ids are content hashes: identical vertex data yields the same id.
//! - Removing a node removes its whole subtree.
//! - Backends read the graph; they never mutate it.

mod camera;
mod graph;
mod material;
mod mesh;

pub use camera::OrbitCamera;
pub use graph::{Light, MeshInstance, Node, NodeId, NodeKind, SceneError, SceneGraph};
pub use material::{Color, Material, Shading};
pub use mesh::{Geometry, GeometryError, GeometryId, MeshData};

pub fn crate_info() -> &'static str {
    "shapez-scene v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("scene"));
    }
}
