use anyhow::Result;
use clap::Parser;
use egui::Context as EguiContext;
use shapez_assets::QuarterRegistry;
use shapez_model::ShapeView;
use shapez_render::FrameScheduler;
use shapez_render_wgpu::{WgpuBackend, adapter_available};
use shapez_viewer::{
    MultiShapeViewer, Platform, ShapeViewOption, SurfaceSize, ViewerConfig, ensure_supported,
};
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalPosition};
use winit::event::{ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "shapez-desktop", about = "Shape viewer desktop application")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Viewer config (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Shapes to show side by side; overrides the config's views
    #[arg(short, long)]
    shape: Vec<String>,
}

/// Native window with a GPU adapter.
struct Desktop;

impl Platform for Desktop {
    fn name(&self) -> &str {
        "desktop"
    }

    fn supports_rendering(&self) -> bool {
        adapter_available()
    }
}

/// Frames are winit redraw requests.
struct WindowFrames {
    window: Arc<Window>,
}

impl FrameScheduler for WindowFrames {
    fn request_frame(&mut self) {
        self.window.request_redraw();
    }
}

type DesktopViewer = MultiShapeViewer<WgpuBackend, WindowFrames>;

enum UiAction {
    Assign(usize, String),
    Layers(usize, bool),
    Quarters(usize, bool),
}

/// Side panel state, kept apart from the viewer so the panel can be built
/// while the views are borrowed.
struct Controls {
    drafts: Vec<String>,
    status: Option<String>,
    visible: bool,
}

impl Controls {
    fn new() -> Self {
        Self {
            drafts: Vec::new(),
            status: None,
            visible: true,
        }
    }

    fn draw(&mut self, ctx: &EguiContext, views: &[ShapeView]) -> Vec<UiAction> {
        let mut actions = Vec::new();
        if !self.visible {
            return actions;
        }
        self.drafts.resize_with(views.len(), String::new);

        egui::SidePanel::left("controls")
            .default_width(260.0)
            .show(ctx, |ui| {
                ui.heading("Shape Viewer");
                ui.separator();

                for (i, view) in views.iter().enumerate() {
                    ui.push_id(i, |ui| {
                        ui.label(format!("View {}", i + 1));
                        ui.label(egui::RichText::new(view.data().identifier()).monospace());

                        let edit = ui.text_edit_singleline(&mut self.drafts[i]);
                        let submitted =
                            edit.lost_focus() && ui.input(|input| input.key_pressed(egui::Key::Enter));
                        if ui.button("Show").clicked() || submitted {
                            actions.push(UiAction::Assign(i, self.drafts[i].trim().to_string()));
                        }

                        let mut layers = view.layers_expanded();
                        if ui.checkbox(&mut layers, "Expand layers").changed() {
                            actions.push(UiAction::Layers(i, layers));
                        }
                        let mut quarters = view.quarters_expanded();
                        if ui.checkbox(&mut quarters, "Expand quarters").changed() {
                            actions.push(UiAction::Quarters(i, quarters));
                        }
                    });
                    ui.separator();
                }

                if let Some(status) = &self.status {
                    ui.colored_label(egui::Color32::LIGHT_RED, status);
                    ui.separator();
                }
                ui.small("F1: Toggle Controls | LMB drag: Orbit");
            });
        actions
    }
}

struct Drag {
    view: usize,
    last: PhysicalPosition<f64>,
}

struct App {
    config: ViewerConfig,
    registry: Rc<QuarterRegistry>,
    window: Option<Arc<Window>>,
    viewer: Option<DesktopViewer>,
    controls: Controls,
    egui_ctx: EguiContext,
    egui_winit: Option<egui_winit::State>,
    egui_renderer: Option<egui_wgpu::Renderer>,
    cursor: Option<PhysicalPosition<f64>>,
    drag: Option<Drag>,
}

impl App {
    fn new(config: ViewerConfig) -> Self {
        let registry = Rc::new(QuarterRegistry::with_loader(config.fragments.loader()));
        Self {
            config,
            registry,
            window: None,
            viewer: None,
            controls: Controls::new(),
            egui_ctx: EguiContext::default(),
            egui_winit: None,
            egui_renderer: None,
            cursor: None,
            drag: None,
        }
    }

    /// View placement for a logical surface of `width` x `height`.
    fn view_options(&self, width: u32, height: u32) -> Vec<ShapeViewOption> {
        ViewerConfig {
            width,
            height,
            ..self.config.clone()
        }
        .view_options()
    }

    fn create_viewer(&mut self, window: Arc<Window>) -> Result<()> {
        ensure_supported(&Desktop)?;
        let scale = window.scale_factor();
        let physical = window.inner_size();
        let logical: LogicalSize<u32> = physical.to_logical(scale);

        let mut backend = pollster::block_on(WgpuBackend::new(
            window.clone(),
            physical.width,
            physical.height,
        ))?;
        backend.set_auto_present(false);

        let size = SurfaceSize {
            width: logical.width,
            height: logical.height,
            pixel_ratio: Some(scale as f32),
        };
        let mut viewer = MultiShapeViewer::new(
            &Desktop,
            backend,
            size,
            self.view_options(logical.width, logical.height),
            Rc::clone(&self.registry),
            WindowFrames {
                window: window.clone(),
            },
        )?;
        pollster::block_on(viewer.init())?;

        self.controls.drafts = viewer
            .views()
            .iter()
            .map(|view| view.data().identifier().to_string())
            .collect();

        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(scale as f32),
            None,
            None,
        );
        let backend = viewer.backend();
        let egui_renderer =
            egui_wgpu::Renderer::new(backend.device(), backend.surface_format(), None, 1, false);

        viewer.start();
        self.viewer = Some(viewer);
        self.egui_winit = Some(egui_winit);
        self.egui_renderer = Some(egui_renderer);
        self.window = Some(window);
        Ok(())
    }

    fn resize(&mut self) {
        let Some(window) = &self.window else {
            return;
        };
        let scale = window.scale_factor();
        let logical: LogicalSize<u32> = window.inner_size().to_logical(scale);
        let options = self.view_options(logical.width, logical.height);
        let Some(viewer) = self.viewer.as_mut() else {
            return;
        };
        if let Err(e) = viewer.resize(logical.width, logical.height, Some(scale as f32)) {
            tracing::error!("resize failed: {e}");
            return;
        }
        for (i, option) in options.into_iter().enumerate() {
            let _ = viewer.set_region(i, option.region);
        }
    }

    fn apply(&mut self, actions: Vec<UiAction>) {
        let Some(viewer) = self.viewer.as_mut() else {
            return;
        };
        for action in actions {
            let result = match action {
                UiAction::Assign(i, identifier) => viewer.assign(i, &identifier).map(|meshes| {
                    tracing::info!(view = i, meshes, "showing {identifier}");
                }),
                UiAction::Layers(i, true) => viewer.expand_layers(i),
                UiAction::Layers(i, false) => viewer.collapse_layers(i),
                UiAction::Quarters(i, true) => viewer.expand_quarters(i),
                UiAction::Quarters(i, false) => viewer.collapse_quarters(i),
            };
            match result {
                Ok(()) => self.controls.status = None,
                Err(e) => {
                    tracing::warn!("{e}");
                    self.controls.status = Some(e.to_string());
                }
            }
        }
    }

    fn redraw(&mut self) {
        let (Some(window), Some(viewer)) = (self.window.clone(), self.viewer.as_ref()) else {
            return;
        };
        let Some(egui_winit) = self.egui_winit.as_mut() else {
            return;
        };

        let raw_input = egui_winit.take_egui_input(&window);
        let views = viewer.views();
        let mut actions = Vec::new();
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            actions = self.controls.draw(ctx, views);
        });
        egui_winit.handle_platform_output(&window, full_output.platform_output);
        self.apply(actions);

        let Some(viewer) = self.viewer.as_mut() else {
            return;
        };
        match viewer.on_frame() {
            Ok(Some(stats)) if stats.dropped => tracing::debug!("frame dropped"),
            Ok(_) => {}
            Err(e) => tracing::error!("frame failed: {e}"),
        }

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let backend = viewer.backend();
        let (Some(frame_view), Some(egui_renderer)) =
            (backend.frame_view(), self.egui_renderer.as_mut())
        else {
            return;
        };
        let (device, queue) = (backend.device(), backend.queue());
        let (width, height) = backend.physical_size();
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [width, height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            egui_renderer.update_texture(device, queue, *id, image_delta);
        }
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("egui_encoder"),
        });
        egui_renderer.update_buffers(device, queue, &mut encoder, &paint_jobs, &screen_descriptor);
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: frame_view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            egui_renderer.render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            egui_renderer.free_texture(id);
        }

        viewer.backend_mut().present();
    }

    fn pointer_moved(&mut self, position: PhysicalPosition<f64>) {
        self.cursor = Some(position);
        let (Some(drag), Some(viewer), Some(window)) =
            (self.drag.as_mut(), self.viewer.as_mut(), &self.window)
        else {
            return;
        };
        let scale = window.scale_factor();
        let dx = ((position.x - drag.last.x) / scale) as f32;
        let dy = ((position.y - drag.last.y) / scale) as f32;
        drag.last = position;
        let _ = viewer.rotate(drag.view, dx, dy);
    }

    fn pointer_button(&mut self, pressed: bool) {
        if !pressed {
            self.drag = None;
            return;
        }
        let (Some(position), Some(viewer), Some(window)) =
            (self.cursor, self.viewer.as_ref(), &self.window)
        else {
            return;
        };
        let logical = position.to_logical::<f64>(window.scale_factor());
        self.drag = viewer
            .view_at(logical.x as i32, logical.y as i32)
            .map(|view| Drag {
                view,
                last: position,
            });
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title("Shape Viewer")
            .with_inner_size(LogicalSize::new(self.config.width, self.config.height));
        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                tracing::error!("failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        if let Err(e) = self.create_viewer(window) {
            tracing::error!("failed to start viewer: {e:#}");
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let (Some(egui_winit), Some(window)) = (&mut self.egui_winit, &self.window) {
            let response = egui_winit.on_window_event(window, &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                if let Some(viewer) = self.viewer.as_mut() {
                    viewer.stop();
                }
                event_loop.exit();
            }
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => self.resize(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::F1),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                self.controls.visible = !self.controls.visible;
            }
            WindowEvent::CursorMoved { position, .. } => self.pointer_moved(position),
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state,
                ..
            } => self.pointer_button(state == ElementState::Pressed),
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ViewerConfig::load(path)?,
        None => ViewerConfig::default(),
    };
    if !cli.shape.is_empty() {
        config.views = cli
            .shape
            .iter()
            .map(|shape| shapez_viewer::ViewConfig {
                shape: Some(shape.clone()),
                region: None,
            })
            .collect();
    }

    let filter = match (&config.log_filter, cli.verbose) {
        (_, true) => "debug".to_string(),
        (Some(filter), false) => filter.clone(),
        (None, false) => "info".to_string(),
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!(views = config.views.len(), "shapez-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    Ok(())
}
