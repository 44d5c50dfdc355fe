use shapez_common::{PixelRect, ViewRect};

use crate::backend::{RenderTarget, SurfaceBackend};
use crate::error::RenderError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceState {
    Unsized,
    Sized {
        width: u32,
        height: u32,
        pixel_ratio: f32,
    },
}

/// What one [`RenderScheduler::update`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub drawn: usize,
    pub skipped: usize,
    /// The backend declined the frame; nothing was drawn.
    pub dropped: bool,
}

/// Convert a top-left view rectangle to the bottom-left rectangle the backend
/// fences with, on a surface `surface_height` pixels tall.
pub fn surface_rect(rect: ViewRect, surface_height: u32) -> PixelRect {
    let bottom = surface_height as i32 - rect.top - rect.height as i32;
    PixelRect::new(rect.left, bottom, rect.width, rect.height)
}

/// Owns the shared surface and draws each view into its own rectangle.
pub struct RenderScheduler<B> {
    backend: B,
    state: SurfaceState,
}

impl<B: SurfaceBackend> RenderScheduler<B> {
    /// Take ownership of `backend` and size it. A missing pixel ratio means 1.
    pub fn new(
        backend: B,
        width: u32,
        height: u32,
        pixel_ratio: Option<f32>,
    ) -> Result<Self, RenderError> {
        let mut scheduler = Self {
            backend,
            state: SurfaceState::Unsized,
        };
        scheduler.resize(width, height, Some(pixel_ratio.unwrap_or(1.0)))?;
        Ok(scheduler)
    }

    pub fn state(&self) -> SurfaceState {
        self.state
    }

    /// Logical surface size. `(0, 0)` before the first resize.
    pub fn size(&self) -> (u32, u32) {
        match self.state {
            SurfaceState::Unsized => (0, 0),
            SurfaceState::Sized { width, height, .. } => (width, height),
        }
    }

    pub fn pixel_ratio(&self) -> f32 {
        match self.state {
            SurfaceState::Unsized => 1.0,
            SurfaceState::Sized { pixel_ratio, .. } => pixel_ratio,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Resize the surface. Without a pixel ratio the previous one is kept.
    ///
    /// Views keep their own rectangles; callers re-derive camera aspects from
    /// them.
    pub fn resize(
        &mut self,
        width: u32,
        height: u32,
        pixel_ratio: Option<f32>,
    ) -> Result<(), RenderError> {
        let pixel_ratio = pixel_ratio.unwrap_or_else(|| self.pixel_ratio());
        if !pixel_ratio.is_finite() || pixel_ratio <= 0.0 {
            return Err(RenderError::PixelRatio(pixel_ratio));
        }
        self.backend.set_pixel_ratio(pixel_ratio);
        self.backend.set_size(width, height);
        self.state = SurfaceState::Sized {
            width,
            height,
            pixel_ratio,
        };
        tracing::debug!(width, height, pixel_ratio, "surface resized");
        Ok(())
    }

    /// Draw every view whose rectangle intersects the surface.
    pub fn update<'a, T, I>(&mut self, views: I) -> Result<FrameStats, RenderError>
    where
        T: RenderTarget + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        let (width, height) = self.size();
        self.update_with(views, |rect| rect.intersects_surface(width, height))
    }

    /// Draw every view `visible` accepts, in iteration order.
    pub fn update_with<'a, T, I, F>(
        &mut self,
        views: I,
        mut visible: F,
    ) -> Result<FrameStats, RenderError>
    where
        T: RenderTarget + 'a,
        I: IntoIterator<Item = &'a T>,
        F: FnMut(&ViewRect) -> bool,
    {
        let mut stats = FrameStats::default();
        let SurfaceState::Sized { height, .. } = self.state else {
            stats.dropped = true;
            return Ok(stats);
        };
        if !self.backend.begin_frame()? {
            stats.dropped = true;
            return Ok(stats);
        }

        let _span = tracing::trace_span!("render_frame").entered();
        for (index, view) in views.into_iter().enumerate() {
            let rect = view.rect();
            if !visible(&rect) {
                stats.skipped += 1;
                continue;
            }
            let fence = surface_rect(rect, height);
            self.backend.set_viewport(fence);
            self.backend.set_scissor(fence);
            self.backend.render(view.scene(), view.camera());
            stats.drawn += 1;
            tracing::trace!(index, x = fence.x, y = fence.y, "view drawn");
        }

        self.backend.finish_frame()?;
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendCommand, DebugTextBackend};
    use shapez_scene::{OrbitCamera, SceneGraph};

    struct Target {
        rect: ViewRect,
        scene: SceneGraph,
        camera: OrbitCamera,
    }

    impl Target {
        fn at(top: i32, left: i32, width: u32, height: u32) -> Self {
            Self {
                rect: ViewRect::new(top, left, width, height),
                scene: SceneGraph::new(),
                camera: OrbitCamera::default(),
            }
        }
    }

    impl RenderTarget for Target {
        fn rect(&self) -> ViewRect {
            self.rect
        }

        fn scene(&self) -> &SceneGraph {
            &self.scene
        }

        fn camera(&self) -> &OrbitCamera {
            &self.camera
        }
    }

    fn scheduler(width: u32, height: u32) -> RenderScheduler<DebugTextBackend> {
        RenderScheduler::new(DebugTextBackend::new(), width, height, None).unwrap()
    }

    #[test]
    fn construction_sizes_the_surface() {
        let s = scheduler(200, 100);
        assert_eq!(
            s.state(),
            SurfaceState::Sized {
                width: 200,
                height: 100,
                pixel_ratio: 1.0
            }
        );
        assert!(
            s.backend()
                .commands()
                .contains(&BackendCommand::SetSize { width: 200, height: 100 })
        );
    }

    #[test]
    fn side_by_side_views_get_disjoint_fences() {
        let mut s = scheduler(200, 100);
        let views = [Target::at(0, 0, 100, 100), Target::at(0, 100, 100, 100)];
        let stats = s.update(&views).unwrap();
        assert_eq!(stats.drawn, 2);

        let draws = s.backend().draws();
        assert_eq!(draws.len(), 2);
        let (left, right) = (draws[0], draws[1]);
        assert_eq!(left.0, PixelRect::new(0, 0, 100, 100));
        assert_eq!(right.0, PixelRect::new(100, 0, 100, 100));
        assert_eq!(left.0, left.1);
        assert_eq!(right.0, right.1);
        assert!(!left.1.overlaps(&right.1));
    }

    #[test]
    fn bottom_is_measured_from_surface_bottom() {
        assert_eq!(
            surface_rect(ViewRect::new(10, 5, 50, 30), 100),
            PixelRect::new(5, 60, 50, 30)
        );
        assert_eq!(
            surface_rect(ViewRect::new(0, 0, 100, 100), 100),
            PixelRect::new(0, 0, 100, 100)
        );
    }

    #[test]
    fn every_view_is_fenced_before_render() {
        let mut s = scheduler(300, 300);
        let views = [
            Target::at(0, 0, 100, 100),
            Target::at(100, 100, 100, 100),
            Target::at(200, 200, 100, 100),
        ];
        s.update(&views).unwrap();
        let commands = s.backend().commands();
        for (i, command) in commands.iter().enumerate() {
            if matches!(command, BackendCommand::Render { .. }) {
                assert!(matches!(commands[i - 2], BackendCommand::Viewport(_)));
                assert!(matches!(commands[i - 1], BackendCommand::Scissor(_)));
            }
        }
    }

    #[test]
    fn offscreen_views_are_skipped() {
        let mut s = scheduler(200, 100);
        let views = [Target::at(0, 0, 100, 100), Target::at(500, 0, 100, 100)];
        let stats = s.update(&views).unwrap();
        assert_eq!(stats.drawn, 1);
        assert_eq!(stats.skipped, 1);
    }

    #[test]
    fn custom_predicate_decides_visibility() {
        let mut s = scheduler(200, 100);
        let views = [Target::at(0, 0, 100, 100), Target::at(0, 100, 100, 100)];
        let stats = s.update_with(&views, |rect| rect.left > 0).unwrap();
        assert_eq!(stats.drawn, 1);
        assert_eq!(s.backend().draws()[0].0.x, 100);
    }

    #[test]
    fn resize_keeps_pixel_ratio_unless_given() {
        let mut s = RenderScheduler::new(DebugTextBackend::new(), 10, 10, Some(2.0)).unwrap();
        s.resize(20, 30, None).unwrap();
        assert_eq!(s.pixel_ratio(), 2.0);
        assert_eq!(s.size(), (20, 30));
        s.resize(20, 30, Some(1.5)).unwrap();
        assert_eq!(s.pixel_ratio(), 1.5);
        assert_eq!(s.resize(1, 1, Some(0.0)), Err(RenderError::PixelRatio(0.0)));
        assert_eq!(s.pixel_ratio(), 1.5);
    }

    #[test]
    fn resize_moves_later_fences() {
        let mut s = scheduler(200, 100);
        let views = [Target::at(0, 0, 100, 50)];
        s.update(&views).unwrap();
        s.resize(200, 300, None).unwrap();
        s.backend_mut().clear();
        s.update(&views).unwrap();
        assert_eq!(s.backend().draws()[0].0, PixelRect::new(0, 250, 100, 50));
    }
}
