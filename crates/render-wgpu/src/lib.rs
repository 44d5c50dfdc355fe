//! wgpu backend for the shape viewer.
//!
//! One surface, one device, any number of views. Each view is drawn in its own
//! render pass that loads the frame so far and is clipped to the view's
//! scissor rectangle. Geometry is uploaded once per content hash and shared by
//! every view that shows it.
//!
//! # Invariants
//! - The backend never mutates a scene.
//! - Scissor rectangles are clamped to the surface; a view entirely off the
//!   surface draws nothing.

mod backend;
mod gpu;
mod shaders;

pub use backend::{WgpuBackend, WgpuError, adapter_available};
