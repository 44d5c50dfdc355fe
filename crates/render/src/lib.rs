//! Multi-viewport rendering over one shared surface.
//!
//! The [`RenderScheduler`] owns the surface through a [`SurfaceBackend`] and
//! draws any number of independent scene/camera pairs into it each frame,
//! fencing every draw with a viewport and scissor rectangle of its own.
//!
//! # Invariants
//! - Only the scheduler writes to the surface.
//! - Viewport and scissor are set for every view before it is drawn; nothing
//!   carries over from the previous view.
//! - Backends read scenes; they never mutate them.
//!
//! The [`DebugTextBackend`] records every command instead of drawing, which
//! makes scheduling observable without a GPU. The wgpu backend lives in
//! `shapez-render-wgpu`.

mod backend;
mod error;
mod frame_loop;
mod scheduler;

pub use backend::{BackendCommand, DebugTextBackend, RenderTarget, SurfaceBackend};
pub use error::RenderError;
pub use frame_loop::{FrameScheduler, ManualFrames, RenderLoop};
pub use scheduler::{FrameStats, RenderScheduler, SurfaceState, surface_rect};

pub fn crate_info() -> &'static str {
    "shapez-render v0.1.0"
}
