use shapez_assets::QuarterRegistry;
use shapez_common::ViewRect;
use shapez_model::ShapeView;
use shapez_parser::DEFAULT_SHAPE;
use shapez_render::{FrameScheduler, FrameStats, RenderLoop, RenderScheduler, SurfaceBackend};
use std::rc::Rc;

use crate::error::ViewerError;
use crate::platform::{Platform, ensure_supported};

/// Where one view goes and what it shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeViewOption {
    pub region: ViewRect,
    /// The default shape when `None`.
    pub shape: Option<String>,
}

impl ShapeViewOption {
    pub fn new(region: ViewRect, shape: impl Into<String>) -> Self {
        Self {
            region,
            shape: Some(shape.into()),
        }
    }
}

/// Initial drawable size in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: Option<f32>,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixel_ratio: None,
        }
    }
}

/// Many shape views sharing one surface.
pub struct MultiShapeViewer<B, S> {
    scheduler: RenderScheduler<B>,
    views: Vec<ShapeView>,
    registry: Rc<QuarterRegistry>,
    render_loop: RenderLoop<S>,
}

impl<B: SurfaceBackend, S: FrameScheduler> MultiShapeViewer<B, S> {
    /// Check the platform, take the surface and build every view. Fragments
    /// are not loaded until [`MultiShapeViewer::init`].
    pub fn new(
        platform: &impl Platform,
        backend: B,
        size: SurfaceSize,
        options: Vec<ShapeViewOption>,
        registry: Rc<QuarterRegistry>,
        frames: S,
    ) -> Result<Self, ViewerError> {
        ensure_supported(platform)?;
        if options.is_empty() {
            return Err(ViewerError::NoViewsDefined);
        }

        let views = options
            .iter()
            .map(|option| {
                let shape = option.shape.as_deref().unwrap_or(DEFAULT_SHAPE);
                ShapeView::from_identifier(shape, option.region)
            })
            .collect::<Result<Vec<_>, _>>()?;
        let scheduler = RenderScheduler::new(backend, size.width, size.height, size.pixel_ratio)?;

        tracing::info!(
            views = views.len(),
            width = size.width,
            height = size.height,
            "viewer created"
        );
        Ok(Self {
            scheduler,
            views,
            registry,
            render_loop: RenderLoop::new(frames),
        })
    }

    /// Resolve the quarter fragments and assemble every view. A failed load
    /// leaves the viewer uninitialized; calling again retries.
    pub async fn init(&mut self) -> Result<(), ViewerError> {
        if self.is_initialized() {
            return Ok(());
        }
        let quarters = match self.registry.resolve().await {
            Ok(quarters) => quarters,
            Err(err) => {
                tracing::warn!("viewer init failed: {err}");
                return Err(err.into());
            }
        };
        for view in &mut self.views {
            view.initialize(Rc::clone(&quarters))?;
        }
        tracing::info!(views = self.views.len(), "viewer initialized");
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.views.iter().all(ShapeView::is_initialized)
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn views(&self) -> &[ShapeView] {
        &self.views
    }

    pub fn view(&self, index: usize) -> Option<&ShapeView> {
        self.views.get(index)
    }

    pub fn view_mut(&mut self, index: usize) -> Result<&mut ShapeView, ViewerError> {
        self.views
            .get_mut(index)
            .ok_or(ViewerError::UnknownView(index))
    }

    /// Show `identifier` in view `index`. Returns the number of meshes placed.
    pub fn assign(&mut self, index: usize, identifier: &str) -> Result<usize, ViewerError> {
        let attached = self.view_mut(index)?.assign(identifier)?;
        tracing::debug!(index, identifier, attached, "shape assigned");
        Ok(attached)
    }

    pub fn expand_layers(&mut self, index: usize) -> Result<(), ViewerError> {
        self.view_mut(index)?.expand_layers();
        Ok(())
    }

    pub fn collapse_layers(&mut self, index: usize) -> Result<(), ViewerError> {
        self.view_mut(index)?.collapse_layers();
        Ok(())
    }

    pub fn expand_quarters(&mut self, index: usize) -> Result<(), ViewerError> {
        self.view_mut(index)?.expand_quarters();
        Ok(())
    }

    pub fn collapse_quarters(&mut self, index: usize) -> Result<(), ViewerError> {
        self.view_mut(index)?.collapse_quarters();
        Ok(())
    }

    /// Feed a pointer drag to one view's orbit camera.
    pub fn rotate(&mut self, index: usize, dx: f32, dy: f32) -> Result<(), ViewerError> {
        self.view_mut(index)?.camera_mut().rotate(dx, dy);
        Ok(())
    }

    /// Index of the topmost view under a logical surface point.
    pub fn view_at(&self, x: i32, y: i32) -> Option<usize> {
        self.views.iter().rposition(|view| {
            let rect = view.rect();
            x >= rect.left && x < rect.right() && y >= rect.top && y < rect.bottom()
        })
    }

    /// Move view `index` on the surface.
    pub fn set_region(&mut self, index: usize, region: ViewRect) -> Result<(), ViewerError> {
        self.view_mut(index)?.set_rect(region);
        Ok(())
    }

    /// Resize the shared surface. Every camera's aspect is re-derived from its
    /// own view rectangle.
    pub fn resize(
        &mut self,
        width: u32,
        height: u32,
        pixel_ratio: Option<f32>,
    ) -> Result<(), ViewerError> {
        self.scheduler.resize(width, height, pixel_ratio)?;
        for view in &mut self.views {
            let rect = view.rect();
            view.set_rect(rect);
        }
        Ok(())
    }

    pub fn surface_size(&self) -> (u32, u32) {
        self.scheduler.size()
    }

    /// Advance camera damping and draw every view on the surface.
    pub fn frame(&mut self) -> Result<FrameStats, ViewerError> {
        let (width, height) = self.scheduler.size();
        self.frame_with(|rect| rect.intersects_surface(width, height))
    }

    /// As [`MultiShapeViewer::frame`], drawing only views `visible` accepts.
    pub fn frame_with(
        &mut self,
        visible: impl FnMut(&ViewRect) -> bool,
    ) -> Result<FrameStats, ViewerError> {
        draw_views(&mut self.scheduler, &mut self.views, visible)
    }

    pub fn start(&mut self) {
        self.render_loop.start();
    }

    pub fn stop(&mut self) {
        self.render_loop.stop();
    }

    pub fn is_running(&self) -> bool {
        self.render_loop.is_running()
    }

    /// Handle a frame delivered by the host scheduler. `Ok(None)` when the
    /// render loop is stopped.
    pub fn on_frame(&mut self) -> Result<Option<FrameStats>, ViewerError> {
        let (width, height) = self.scheduler.size();
        let scheduler = &mut self.scheduler;
        let views = &mut self.views;
        self.render_loop
            .on_frame(|| draw_views(scheduler, views, |rect| rect.intersects_surface(width, height)))
            .transpose()
    }

    pub fn render_loop(&self) -> &RenderLoop<S> {
        &self.render_loop
    }

    pub fn render_loop_mut(&mut self) -> &mut RenderLoop<S> {
        &mut self.render_loop
    }

    pub fn scheduler(&self) -> &RenderScheduler<B> {
        &self.scheduler
    }

    pub fn backend(&self) -> &B {
        self.scheduler.backend()
    }

    pub fn backend_mut(&mut self) -> &mut B {
        self.scheduler.backend_mut()
    }

    pub fn registry(&self) -> &Rc<QuarterRegistry> {
        &self.registry
    }
}

fn draw_views<B: SurfaceBackend>(
    scheduler: &mut RenderScheduler<B>,
    views: &mut [ShapeView],
    visible: impl FnMut(&ViewRect) -> bool,
) -> Result<FrameStats, ViewerError> {
    if !views.iter().all(ShapeView::is_initialized) {
        return Err(shapez_model::AssemblyError::NotInitialized.into());
    }
    for view in views.iter_mut() {
        view.camera_mut().update();
    }
    let stats = scheduler.update_with(views.iter(), visible)?;
    tracing::trace!(drawn = stats.drawn, skipped = stats.skipped, "frame drawn");
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Headless;
    use futures::executor::block_on;
    use shapez_assets::{AssetError, FragmentLoader, ProceduralLoader};
    use shapez_common::{PixelRect, Tagged};
    use shapez_render::{DebugTextBackend, ManualFrames};
    use shapez_scene::Geometry;
    use std::cell::Cell;

    type TestViewer = MultiShapeViewer<DebugTextBackend, ManualFrames>;

    struct NoGpu;

    impl Platform for NoGpu {
        fn name(&self) -> &str {
            "no-gpu"
        }

        fn supports_rendering(&self) -> bool {
            false
        }
    }

    fn registry() -> Rc<QuarterRegistry> {
        Rc::new(QuarterRegistry::new(ProceduralLoader::new()))
    }

    fn side_by_side() -> Vec<ShapeViewOption> {
        vec![
            ShapeViewOption::new(ViewRect::new(0, 0, 100, 100), "CuCuCuCu"),
            ShapeViewOption::new(ViewRect::new(0, 100, 100, 100), "RrRr:cwcw"),
        ]
    }

    fn viewer(options: Vec<ShapeViewOption>) -> TestViewer {
        MultiShapeViewer::new(
            &Headless,
            DebugTextBackend::new(),
            SurfaceSize::new(200, 100),
            options,
            registry(),
            ManualFrames::new(),
        )
        .unwrap()
    }

    fn ready(options: Vec<ShapeViewOption>) -> TestViewer {
        let mut viewer = viewer(options);
        block_on(viewer.init()).unwrap();
        viewer
    }

    #[test]
    fn unsupported_platform_is_rejected() {
        let err = TestViewer::new(
            &NoGpu,
            DebugTextBackend::new(),
            SurfaceSize::new(10, 10),
            side_by_side(),
            registry(),
            ManualFrames::new(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, ViewerError::UnsupportedPlatform { .. }));
        assert!(err.to_string().contains("no-gpu"));
    }

    #[test]
    fn empty_view_list_is_rejected() {
        let err = TestViewer::new(
            &Headless,
            DebugTextBackend::new(),
            SurfaceSize::new(10, 10),
            Vec::new(),
            registry(),
            ManualFrames::new(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, ViewerError::NoViewsDefined));
    }

    #[test]
    fn malformed_option_is_rejected() {
        let options = vec![ShapeViewOption::new(ViewRect::new(0, 0, 10, 10), "X-")];
        let err = TestViewer::new(
            &Headless,
            DebugTextBackend::new(),
            SurfaceSize::new(10, 10),
            options,
            registry(),
            ManualFrames::new(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, ViewerError::Identifier(_)));
    }

    #[test]
    fn missing_shape_uses_default() {
        let viewer = viewer(vec![ShapeViewOption {
            region: ViewRect::new(0, 0, 100, 100),
            shape: None,
        }]);
        assert_eq!(viewer.view(0).unwrap().data().identifier(), DEFAULT_SHAPE);
    }

    #[test]
    fn frame_before_init_is_not_initialized() {
        let mut viewer = viewer(side_by_side());
        let err = viewer.frame().unwrap_err();
        assert!(err.is_not_initialized());
        assert!(viewer.assign(0, "Cr").unwrap_err().is_not_initialized());
    }

    #[test]
    fn init_assembles_every_view() {
        let mut viewer = ready(side_by_side());
        assert!(viewer.is_initialized());
        // Four quarters plus the stand in each.
        assert_eq!(viewer.view(0).unwrap().scene().meshes().len(), 5);
        assert_eq!(viewer.view(1).unwrap().scene().meshes().len(), 5);
        block_on(viewer.init()).unwrap();
        assert_eq!(viewer.registry().attempts(), 1);
    }

    #[test]
    fn views_draw_into_disjoint_regions() {
        let mut viewer = ready(side_by_side());
        let stats = viewer.frame().unwrap();
        assert_eq!(stats.drawn, 2);
        let draws = viewer.backend().draws();
        assert_eq!(draws[0].0, PixelRect::new(0, 0, 100, 100));
        assert_eq!(draws[1].0, PixelRect::new(100, 0, 100, 100));
        assert!(!draws[0].1.overlaps(&draws[1].1));
    }

    #[test]
    fn malformed_assignment_changes_nothing() {
        let mut viewer = ready(side_by_side());
        let err = viewer.assign(1, "Cr:Cr:Cr:Cr:Cr").unwrap_err();
        assert!(matches!(err, ViewerError::Identifier(_)));
        assert_eq!(err.component(), shapez_common::Component::Parser);
        assert_eq!(viewer.view(1).unwrap().data().identifier(), "RrRr:cwcw");
        assert!(matches!(
            viewer.assign(7, "Cr"),
            Err(ViewerError::UnknownView(7))
        ));
    }

    #[test]
    fn toggles_are_per_view() {
        let mut viewer = ready(side_by_side());
        viewer.expand_layers(0).unwrap();
        assert!(viewer.view(0).unwrap().layers_expanded());
        assert!(!viewer.view(1).unwrap().layers_expanded());
        viewer.collapse_layers(0).unwrap();
        viewer.expand_quarters(1).unwrap();
        viewer.collapse_quarters(1).unwrap();
        assert!(!viewer.view(0).unwrap().layers_expanded());
        assert!(!viewer.view(1).unwrap().quarters_expanded());
    }

    #[test]
    fn resize_rederives_aspects_and_moves_fences() {
        let mut viewer = ready(side_by_side());
        viewer.set_region(1, ViewRect::new(0, 100, 100, 50)).unwrap();
        viewer.resize(200, 300, Some(2.0)).unwrap();
        assert_eq!(viewer.surface_size(), (200, 300));
        assert!((viewer.view(1).unwrap().camera().aspect - 2.0).abs() < 1e-6);

        viewer.backend_mut().clear();
        viewer.frame().unwrap();
        let draws = viewer.backend().draws();
        assert_eq!(draws[0].0, PixelRect::new(0, 200, 100, 100));
        assert_eq!(draws[1].0, PixelRect::new(100, 250, 100, 50));
    }

    #[test]
    fn custom_visibility_skips_views() {
        let mut viewer = ready(side_by_side());
        let stats = viewer.frame_with(|rect| rect.left == 0).unwrap();
        assert_eq!((stats.drawn, stats.skipped), (1, 1));
    }

    #[test]
    fn render_loop_draws_only_while_running() {
        let mut viewer = ready(side_by_side());
        assert_eq!(viewer.on_frame().unwrap(), None);

        viewer.start();
        assert!(viewer.render_loop_mut().scheduler_mut().take_request());
        let stats = viewer.on_frame().unwrap().unwrap();
        assert_eq!(stats.drawn, 2);
        assert!(viewer.render_loop().scheduler().is_pending());

        viewer.stop();
        assert_eq!(viewer.on_frame().unwrap(), None);
        assert_eq!(viewer.backend().frames(), 1);
    }

    #[test]
    fn view_at_finds_view_under_point() {
        let viewer = viewer(side_by_side());
        assert_eq!(viewer.view_at(10, 10), Some(0));
        assert_eq!(viewer.view_at(150, 99), Some(1));
        assert_eq!(viewer.view_at(250, 10), None);
    }

    struct FlakyLoader {
        fail: Cell<bool>,
    }

    impl FragmentLoader for FlakyLoader {
        fn load<'a>(
            &'a self,
            name: &'a str,
        ) -> futures::future::LocalBoxFuture<'a, Result<Geometry, AssetError>> {
            let result = if self.fail.replace(false) {
                ProceduralLoader::generate("missing-quarter")
            } else {
                ProceduralLoader::generate(name)
            };
            Box::pin(async move { result })
        }
    }

    #[test]
    fn failed_init_can_be_retried() {
        let registry = Rc::new(QuarterRegistry::new(FlakyLoader {
            fail: Cell::new(true),
        }));
        let mut viewer = TestViewer::new(
            &Headless,
            DebugTextBackend::new(),
            SurfaceSize::new(200, 100),
            side_by_side(),
            Rc::clone(&registry),
            ManualFrames::new(),
        )
        .unwrap();

        let err = block_on(viewer.init()).unwrap_err();
        assert!(matches!(err, ViewerError::Asset(_)));
        assert!(!viewer.is_initialized());

        block_on(viewer.init()).unwrap();
        assert!(viewer.is_initialized());
        assert_eq!(registry.attempts(), 2);
    }
}
