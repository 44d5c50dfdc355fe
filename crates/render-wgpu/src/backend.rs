use shapez_common::{Component, PixelRect, Tagged};
use shapez_render::{RenderError, SurfaceBackend};
use shapez_scene::{OrbitCamera, SceneGraph};

use crate::gpu::{DeviceRect, MeshRenderer};

#[derive(Debug, thiserror::Error)]
pub enum WgpuError {
    #[error("[render-scheduler] failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("[render-scheduler] no compatible GPU adapter")]
    NoAdapter,
    #[error("[render-scheduler] failed to create device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
}

impl Tagged for WgpuError {
    fn component(&self) -> Component {
        Component::Scheduler
    }
}

/// Whether this host has any GPU adapter wgpu can drive.
pub fn adapter_available() -> bool {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });
    !instance.enumerate_adapters(wgpu::Backends::all()).is_empty()
}

struct Frame {
    texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
}

/// [`SurfaceBackend`] over a wgpu surface.
///
/// Logical rectangles from the scheduler are flipped to a top-left origin and
/// scaled by the pixel ratio here. The surface is cleared once per frame; each
/// view then loads what is already there and draws inside its own scissor.
pub struct WgpuBackend {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: MeshRenderer,
    adapter_info: wgpu::AdapterInfo,
    logical: (u32, u32),
    pixel_ratio: f32,
    viewport: Option<PixelRect>,
    scissor: Option<PixelRect>,
    frame: Option<Frame>,
    auto_present: bool,
}

impl WgpuBackend {
    /// Create a device for `target` and configure its surface at
    /// `width` x `height` physical pixels.
    pub async fn new(
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> Result<Self, WgpuError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(target)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(WgpuError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("shapez_device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .ok_or(WgpuError::NoAdapter)?;
        let alpha_mode = caps
            .alpha_modes
            .iter()
            .find(|m| **m == wgpu::CompositeAlphaMode::PreMultiplied)
            .or_else(|| caps.alpha_modes.first())
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let renderer = MeshRenderer::new(&device, format, config.width, config.height);
        let adapter_info = adapter.get_info();
        tracing::info!(
            "GPU initialized with {} backend ({})",
            adapter_info.backend.to_str(),
            adapter_info.name
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            renderer,
            adapter_info,
            logical: (width, height),
            pixel_ratio: 1.0,
            viewport: None,
            scissor: None,
            frame: None,
            auto_present: true,
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn adapter_info(&self) -> &wgpu::AdapterInfo {
        &self.adapter_info
    }

    /// Surface size in physical pixels.
    pub fn physical_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    /// Distinct geometries uploaded so far.
    pub fn cached_meshes(&self) -> usize {
        self.renderer.cached_meshes()
    }

    /// With auto-present off, a finished frame stays open so overlays can be
    /// drawn into [`WgpuBackend::frame_view`] before [`WgpuBackend::present`].
    pub fn set_auto_present(&mut self, auto_present: bool) {
        self.auto_present = auto_present;
    }

    /// Texture of the frame in progress.
    pub fn frame_view(&self) -> Option<&wgpu::TextureView> {
        self.frame.as_ref().map(|f| &f.view)
    }

    pub fn present(&mut self) {
        if let Some(frame) = self.frame.take() {
            frame.texture.present();
        }
    }

    fn reconfigure(&mut self) {
        let scale = |v: u32| ((v as f32 * self.pixel_ratio).round() as u32).max(1);
        self.config.width = scale(self.logical.0);
        self.config.height = scale(self.logical.1);
        self.surface.configure(&self.device, &self.config);
        self.renderer
            .resize(&self.device, self.config.width, self.config.height);
    }

    /// Flip a bottom-left logical rectangle into device pixels.
    fn to_device(&self, rect: PixelRect) -> DeviceRect {
        let top = self.logical.1 as i32 - rect.y - rect.height as i32;
        DeviceRect {
            x: rect.x as f32 * self.pixel_ratio,
            y: top as f32 * self.pixel_ratio,
            width: rect.width as f32 * self.pixel_ratio,
            height: rect.height as f32 * self.pixel_ratio,
        }
    }
}

impl SurfaceBackend for WgpuBackend {
    fn set_size(&mut self, width: u32, height: u32) {
        self.logical = (width, height);
        self.reconfigure();
    }

    fn set_pixel_ratio(&mut self, ratio: f32) {
        self.pixel_ratio = ratio;
        self.reconfigure();
    }

    fn begin_frame(&mut self) -> Result<bool, RenderError> {
        // A frame left open by a caller that never presented it.
        self.present();

        let texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return Ok(false);
            }
            Err(wgpu::SurfaceError::Timeout) => return Ok(false),
            Err(e) => {
                return Err(RenderError::Surface {
                    reason: e.to_string(),
                });
            }
        };
        let view = texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.renderer.clear(&self.device, &self.queue, &view);
        self.frame = Some(Frame { texture, view });
        Ok(true)
    }

    fn set_viewport(&mut self, rect: PixelRect) {
        self.viewport = Some(rect);
    }

    fn set_scissor(&mut self, rect: PixelRect) {
        self.scissor = Some(rect);
    }

    fn render(&mut self, scene: &SceneGraph, camera: &OrbitCamera) {
        let (Some(viewport), Some(scissor)) = (self.viewport.take(), self.scissor.take()) else {
            tracing::warn!("render without viewport and scissor ignored");
            return;
        };
        let Some(frame) = &self.frame else {
            return;
        };
        let target_size = (self.config.width, self.config.height);
        let viewport = self.to_device(viewport);
        let scissor = self.to_device(scissor);
        self.renderer.draw(
            &self.device,
            &self.queue,
            &frame.view,
            target_size,
            viewport,
            scissor,
            scene,
            camera,
        );
    }

    fn finish_frame(&mut self) -> Result<(), RenderError> {
        if self.auto_present {
            self.present();
        }
        Ok(())
    }
}
