use shapez_common::{PixelRect, ViewRect};
use shapez_scene::{OrbitCamera, SceneGraph};
use std::fmt::Write as _;

use crate::error::RenderError;

/// Something the scheduler can draw: a placed scene seen through a camera.
pub trait RenderTarget {
    fn rect(&self) -> ViewRect;
    fn scene(&self) -> &SceneGraph;
    fn camera(&self) -> &OrbitCamera;
}

/// Drawing surface shared by every view. All implementations follow the same
/// frame protocol: `begin_frame`, then for each view `set_viewport`,
/// `set_scissor` and `render`, then `finish_frame`.
///
/// Rectangles are in logical pixels with a bottom-left origin; backends with a
/// different convention or a pixel ratio other than one convert them.
pub trait SurfaceBackend {
    /// Resize the drawable area, in logical pixels.
    fn set_size(&mut self, width: u32, height: u32);

    fn set_pixel_ratio(&mut self, ratio: f32);

    /// Prepare a frame. `Ok(false)` means the frame should be skipped, for
    /// example while the surface is being reconfigured.
    fn begin_frame(&mut self) -> Result<bool, RenderError>;

    fn set_viewport(&mut self, rect: PixelRect);

    fn set_scissor(&mut self, rect: PixelRect);

    /// Draw `scene` through `camera` into the current viewport.
    fn render(&mut self, scene: &SceneGraph, camera: &OrbitCamera);

    fn finish_frame(&mut self) -> Result<(), RenderError>;
}

/// One call received by a [`DebugTextBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCommand {
    SetSize { width: u32, height: u32 },
    SetPixelRatio(f32),
    BeginFrame,
    Viewport(PixelRect),
    Scissor(PixelRect),
    Render { meshes: usize, lights: usize },
    FinishFrame,
}

/// Records commands instead of drawing them.
///
/// Useful for CLI output, logging, and testing the scheduler without a GPU.
#[derive(Debug, Default)]
pub struct DebugTextBackend {
    commands: Vec<BackendCommand>,
    frames: u64,
}

impl DebugTextBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[BackendCommand] {
        &self.commands
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// The viewport and scissor pairs in effect at each render, in order.
    pub fn draws(&self) -> Vec<(PixelRect, PixelRect)> {
        let mut viewport = None;
        let mut scissor = None;
        let mut out = Vec::new();
        for command in &self.commands {
            match command {
                BackendCommand::Viewport(rect) => viewport = Some(*rect),
                BackendCommand::Scissor(rect) => scissor = Some(*rect),
                BackendCommand::Render { .. } => {
                    if let (Some(v), Some(s)) = (viewport, scissor) {
                        out.push((v, s));
                    }
                    viewport = None;
                    scissor = None;
                }
                _ => {}
            }
        }
        out
    }

    /// Human-readable listing of everything recorded so far.
    pub fn transcript(&self) -> String {
        let mut out = String::new();
        for command in &self.commands {
            let _ = match command {
                BackendCommand::SetSize { width, height } => {
                    writeln!(out, "size {width}x{height}")
                }
                BackendCommand::SetPixelRatio(ratio) => writeln!(out, "pixel ratio {ratio:.2}"),
                BackendCommand::BeginFrame => writeln!(out, "=== frame {} ===", self.frames),
                BackendCommand::Viewport(r) => writeln!(
                    out,
                    "  viewport x={} y={} w={} h={}",
                    r.x, r.y, r.width, r.height
                ),
                BackendCommand::Scissor(r) => writeln!(
                    out,
                    "  scissor  x={} y={} w={} h={}",
                    r.x, r.y, r.width, r.height
                ),
                BackendCommand::Render { meshes, lights } => {
                    writeln!(out, "  render meshes={meshes} lights={lights}")
                }
                BackendCommand::FinishFrame => writeln!(out, "=== end ==="),
            };
        }
        out
    }
}

impl SurfaceBackend for DebugTextBackend {
    fn set_size(&mut self, width: u32, height: u32) {
        self.commands.push(BackendCommand::SetSize { width, height });
    }

    fn set_pixel_ratio(&mut self, ratio: f32) {
        self.commands.push(BackendCommand::SetPixelRatio(ratio));
    }

    fn begin_frame(&mut self) -> Result<bool, RenderError> {
        self.frames += 1;
        self.commands.push(BackendCommand::BeginFrame);
        Ok(true)
    }

    fn set_viewport(&mut self, rect: PixelRect) {
        self.commands.push(BackendCommand::Viewport(rect));
    }

    fn set_scissor(&mut self, rect: PixelRect) {
        self.commands.push(BackendCommand::Scissor(rect));
    }

    fn render(&mut self, scene: &SceneGraph, _camera: &OrbitCamera) {
        self.commands.push(BackendCommand::Render {
            meshes: scene.meshes().len(),
            lights: scene.lights().len(),
        });
    }

    fn finish_frame(&mut self) -> Result<(), RenderError> {
        self.commands.push(BackendCommand::FinishFrame);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_lists_commands() {
        let mut backend = DebugTextBackend::new();
        backend.set_size(200, 100);
        backend.begin_frame().unwrap();
        backend.set_viewport(PixelRect::new(0, 0, 100, 100));
        backend.set_scissor(PixelRect::new(0, 0, 100, 100));
        backend.render(&SceneGraph::new(), &OrbitCamera::default());
        backend.finish_frame().unwrap();

        let text = backend.transcript();
        assert!(text.contains("size 200x100"));
        assert!(text.contains("=== frame 1 ==="));
        assert!(text.contains("render meshes=0 lights=0"));
        assert_eq!(backend.frames(), 1);
    }

    #[test]
    fn draws_pair_viewport_with_scissor() {
        let mut backend = DebugTextBackend::new();
        let a = PixelRect::new(0, 0, 10, 10);
        let b = PixelRect::new(10, 0, 10, 10);
        backend.set_viewport(a);
        backend.set_scissor(a);
        backend.render(&SceneGraph::new(), &OrbitCamera::default());
        backend.set_viewport(b);
        backend.set_scissor(b);
        backend.render(&SceneGraph::new(), &OrbitCamera::default());
        assert_eq!(backend.draws(), vec![(a, a), (b, b)]);
    }

    #[test]
    fn render_without_fence_is_not_a_draw() {
        let mut backend = DebugTextBackend::new();
        backend.render(&SceneGraph::new(), &OrbitCamera::default());
        assert!(backend.draws().is_empty());
        assert_eq!(backend.commands().len(), 1);
    }
}
