use shapez_assets::QuarterRegistry;
use shapez_common::ViewRect;
use shapez_model::ShapeView;
use shapez_parser::DEFAULT_SHAPE;
use shapez_render::{FrameScheduler, FrameStats, SurfaceBackend};
use std::rc::Rc;

use crate::error::ViewerError;
use crate::platform::Platform;
use crate::viewer::{MultiShapeViewer, ShapeViewOption, SurfaceSize};

/// One shape filling the whole surface.
///
/// A thin wrapper over [`MultiShapeViewer`] with exactly one view whose region
/// tracks the surface size.
pub struct ShapeViewer<B, S> {
    inner: MultiShapeViewer<B, S>,
}

impl<B: SurfaceBackend, S: FrameScheduler> ShapeViewer<B, S> {
    pub fn new(
        platform: &impl Platform,
        backend: B,
        size: SurfaceSize,
        shape: Option<&str>,
        registry: Rc<QuarterRegistry>,
        frames: S,
    ) -> Result<Self, ViewerError> {
        let option = ShapeViewOption {
            region: ViewRect::new(0, 0, size.width, size.height),
            shape: shape.map(str::to_string),
        };
        let inner = MultiShapeViewer::new(platform, backend, size, vec![option], registry, frames)?;
        Ok(Self { inner })
    }

    pub async fn init(&mut self) -> Result<(), ViewerError> {
        self.inner.init().await
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.is_initialized()
    }

    /// Show `identifier`, or the default shape.
    pub fn draw(&mut self, identifier: Option<&str>) -> Result<usize, ViewerError> {
        self.inner.assign(0, identifier.unwrap_or(DEFAULT_SHAPE))
    }

    pub fn view(&self) -> &ShapeView {
        &self.inner.views()[0]
    }

    pub fn expand_layers(&mut self) -> Result<(), ViewerError> {
        self.inner.expand_layers(0)
    }

    pub fn collapse_layers(&mut self) -> Result<(), ViewerError> {
        self.inner.collapse_layers(0)
    }

    pub fn expand_quarters(&mut self) -> Result<(), ViewerError> {
        self.inner.expand_quarters(0)
    }

    pub fn collapse_quarters(&mut self) -> Result<(), ViewerError> {
        self.inner.collapse_quarters(0)
    }

    pub fn rotate(&mut self, dx: f32, dy: f32) -> Result<(), ViewerError> {
        self.inner.rotate(0, dx, dy)
    }

    /// Resize the surface; the view follows it. A rejected resize leaves both
    /// untouched.
    pub fn resize(
        &mut self,
        width: u32,
        height: u32,
        pixel_ratio: Option<f32>,
    ) -> Result<(), ViewerError> {
        self.inner.resize(width, height, pixel_ratio)?;
        self.inner.set_region(0, ViewRect::new(0, 0, width, height))
    }

    pub fn frame(&mut self) -> Result<FrameStats, ViewerError> {
        self.inner.frame()
    }

    pub fn start(&mut self) {
        self.inner.start();
    }

    pub fn stop(&mut self) {
        self.inner.stop();
    }

    pub fn on_frame(&mut self) -> Result<Option<FrameStats>, ViewerError> {
        self.inner.on_frame()
    }

    pub fn inner(&self) -> &MultiShapeViewer<B, S> {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut MultiShapeViewer<B, S> {
        &mut self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Headless;
    use futures::executor::block_on;
    use shapez_assets::ProceduralLoader;
    use shapez_common::PixelRect;
    use shapez_render::{DebugTextBackend, ManualFrames};

    fn viewer(shape: Option<&str>) -> ShapeViewer<DebugTextBackend, ManualFrames> {
        ShapeViewer::new(
            &Headless,
            DebugTextBackend::new(),
            SurfaceSize::new(256, 128),
            shape,
            Rc::new(QuarterRegistry::new(ProceduralLoader::new())),
            ManualFrames::new(),
        )
        .unwrap()
    }

    #[test]
    fn draw_requires_init() {
        let mut v = viewer(None);
        assert!(v.draw(Some("Cr")).unwrap_err().is_not_initialized());
        block_on(v.init()).unwrap();
        assert_eq!(v.draw(Some("Cr")).unwrap(), 1);
    }

    #[test]
    fn draw_without_identifier_shows_default() {
        let mut v = viewer(Some("Cr"));
        block_on(v.init()).unwrap();
        v.draw(None).unwrap();
        assert_eq!(v.view().data().identifier(), DEFAULT_SHAPE);
    }

    #[test]
    fn view_tracks_surface() {
        let mut v = viewer(None);
        block_on(v.init()).unwrap();
        assert_eq!(v.view().rect(), ViewRect::new(0, 0, 256, 128));

        v.resize(100, 300, None).unwrap();
        assert_eq!(v.view().rect(), ViewRect::new(0, 0, 100, 300));
        assert!((v.view().camera().aspect - 100.0 / 300.0).abs() < 1e-6);

        v.frame().unwrap();
        let draws = v.inner().backend().draws();
        assert_eq!(draws.last().unwrap().0, PixelRect::new(0, 0, 100, 300));
    }

    #[test]
    fn toggles_reach_the_view() {
        let mut v = viewer(None);
        block_on(v.init()).unwrap();
        v.expand_layers().unwrap();
        v.expand_quarters().unwrap();
        assert!(v.view().layers_expanded());
        assert!(v.view().quarters_expanded());
        v.collapse_layers().unwrap();
        v.collapse_quarters().unwrap();
        assert!(!v.view().layers_expanded());
        assert!(!v.view().quarters_expanded());
    }

    #[test]
    fn rejected_resize_keeps_view_and_surface() {
        let mut v = viewer(None);
        block_on(v.init()).unwrap();
        let aspect = v.view().camera().aspect;

        let err = v.resize(100, 300, Some(0.0)).unwrap_err();
        assert!(matches!(err, ViewerError::Render(_)));
        assert_eq!(v.inner().surface_size(), (256, 128));
        assert_eq!(v.view().rect(), ViewRect::new(0, 0, 256, 128));
        assert_eq!(v.view().camera().aspect, aspect);
    }
}
