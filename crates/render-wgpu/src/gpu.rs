use crate::shaders;
use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use shapez_scene::{Geometry, GeometryId, Light, OrbitCamera, SceneGraph, Shading};
use std::collections::BTreeMap;
use wgpu::util::DeviceExt;

pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
    ambient: [f32; 4],
    sun_dir: [f32; 4],
    sun_color: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Vertex {
    position: [f32; 3],
    normal: [f32; 3],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct InstanceData {
    model_0: [f32; 4],
    model_1: [f32; 4],
    model_2: [f32; 4],
    model_3: [f32; 4],
    color: [f32; 4],
    params: [f32; 4],
}

fn shading_code(shading: Shading) -> f32 {
    match shading {
        Shading::Toon => 0.0,
        Shading::Standard => 1.0,
        Shading::Glass => 2.0,
    }
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

/// Instances of one geometry drawn with one pipeline.
struct Batch {
    geometry: GeometryId,
    translucent: bool,
    instances: std::ops::Range<u32>,
}

/// Physical-pixel rectangle with a top-left origin, as wgpu expects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct DeviceRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl DeviceRect {
    /// Clamp to a `width` x `height` target and round to whole pixels for
    /// scissoring. `None` when nothing is left.
    pub fn scissor_within(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        let x0 = self.x.round().clamp(0.0, width as f32) as u32;
        let y0 = self.y.round().clamp(0.0, height as f32) as u32;
        let x1 = (self.x + self.width).round().clamp(0.0, width as f32) as u32;
        let y1 = (self.y + self.height).round().clamp(0.0, height as f32) as u32;
        (x1 > x0 && y1 > y0).then(|| (x0, y0, x1 - x0, y1 - y0))
    }
}

/// Pipelines, per-view uniforms and a geometry cache shared by every view.
pub(crate) struct MeshRenderer {
    opaque_pipeline: wgpu::RenderPipeline,
    translucent_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    instance_buffer: wgpu::Buffer,
    instance_capacity: u64,
    meshes: BTreeMap<GeometryId, GpuMesh>,
    depth_texture: wgpu::TextureView,
}

impl MeshRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("shape_uniform_buffer"),
            contents: bytemuck::bytes_of(&Uniforms::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("shape_uniform_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("shape_uniform_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("shape_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("shape_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SHAPE_SHADER.into()),
        });

        let pipeline = |label: &str, blend: wgpu::BlendState, depth_write_enabled: bool| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[
                        wgpu::VertexBufferLayout {
                            array_stride: std::mem::size_of::<Vertex>() as u64,
                            step_mode: wgpu::VertexStepMode::Vertex,
                            attributes: &wgpu::vertex_attr_array![
                                0 => Float32x3,
                                1 => Float32x3,
                            ],
                        },
                        wgpu::VertexBufferLayout {
                            array_stride: std::mem::size_of::<InstanceData>() as u64,
                            step_mode: wgpu::VertexStepMode::Instance,
                            attributes: &wgpu::vertex_attr_array![
                                2 => Float32x4,
                                3 => Float32x4,
                                4 => Float32x4,
                                5 => Float32x4,
                                6 => Float32x4,
                                7 => Float32x4,
                            ],
                        },
                    ],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: surface_format,
                        blend: Some(blend),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: Default::default(),
                    bias: Default::default(),
                }),
                multisample: Default::default(),
                multiview: None,
                cache: None,
            })
        };

        let opaque_pipeline = pipeline("shape_opaque_pipeline", wgpu::BlendState::REPLACE, true);
        let translucent_pipeline = pipeline(
            "shape_translucent_pipeline",
            wgpu::BlendState::ALPHA_BLENDING,
            false,
        );

        let instance_capacity = 256;
        let instance_buffer = Self::create_instance_buffer(device, instance_capacity);
        let depth_texture = Self::create_depth_texture(device, width, height);

        Self {
            opaque_pipeline,
            translucent_pipeline,
            uniform_buffer,
            uniform_bind_group,
            instance_buffer,
            instance_capacity,
            meshes: BTreeMap::new(),
            depth_texture,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = Self::create_depth_texture(device, width, height);
    }

    pub fn cached_meshes(&self) -> usize {
        self.meshes.len()
    }

    /// Clear color and depth across the whole target.
    pub fn clear(&self, device: &wgpu::Device, queue: &wgpu::Queue, view: &wgpu::TextureView) {
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("clear_encoder"),
        });
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("clear_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_texture,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            ..Default::default()
        });
        queue.submit(std::iter::once(encoder.finish()));
    }

    /// Draw one scene into `viewport`, clipped to `scissor`. Both rectangles
    /// are in physical pixels of `target_size`.
    #[allow(clippy::too_many_arguments)]
    pub fn draw(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        target_size: (u32, u32),
        viewport: DeviceRect,
        scissor: DeviceRect,
        scene: &SceneGraph,
        camera: &OrbitCamera,
    ) {
        let Some((sx, sy, sw, sh)) = scissor.scissor_within(target_size.0, target_size.1) else {
            return;
        };
        if viewport.width <= 0.0 || viewport.height <= 0.0 {
            return;
        }

        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&scene_uniforms(scene, camera)),
        );

        let (instances, batches) = self.prepare(device, scene);
        if instances.is_empty() {
            return;
        }
        if instances.len() as u64 > self.instance_capacity {
            self.instance_capacity = (instances.len() as u64).next_power_of_two();
            self.instance_buffer = Self::create_instance_buffer(device, self.instance_capacity);
        }
        queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("view_encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("view_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_viewport(
                viewport.x,
                viewport.y,
                viewport.width,
                viewport.height,
                0.0,
                1.0,
            );
            pass.set_scissor_rect(sx, sy, sw, sh);
            pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            pass.set_vertex_buffer(1, self.instance_buffer.slice(..));

            for batch in &batches {
                let Some(mesh) = self.meshes.get(&batch.geometry) else {
                    continue;
                };
                let pipeline = if batch.translucent {
                    &self.translucent_pipeline
                } else {
                    &self.opaque_pipeline
                };
                pass.set_pipeline(pipeline);
                pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..mesh.index_count, 0, batch.instances.clone());
            }
        }
        queue.submit(std::iter::once(encoder.finish()));
    }

    /// Upload unseen geometry and lay out instance data batch by batch, opaque
    /// batches first.
    fn prepare(&mut self, device: &wgpu::Device, scene: &SceneGraph) -> (Vec<InstanceData>, Vec<Batch>) {
        let mut groups: BTreeMap<(bool, GeometryId), Vec<InstanceData>> = BTreeMap::new();
        for (world, mesh) in scene.meshes() {
            let geometry = &mesh.geometry;
            if !self.meshes.contains_key(&geometry.id()) {
                self.meshes.insert(geometry.id(), upload(device, geometry));
            }
            let cols = world.to_cols_array_2d();
            let translucent = mesh.material.is_translucent();
            groups
                .entry((translucent, geometry.id()))
                .or_default()
                .push(InstanceData {
                    model_0: cols[0],
                    model_1: cols[1],
                    model_2: cols[2],
                    model_3: cols[3],
                    color: mesh.material.color.to_array(),
                    params: [shading_code(mesh.material.shading), 0.0, 0.0, 0.0],
                });
        }

        let mut instances = Vec::new();
        let mut batches = Vec::with_capacity(groups.len());
        for ((translucent, geometry), group) in groups {
            let start = instances.len() as u32;
            instances.extend(group);
            batches.push(Batch {
                geometry,
                translucent,
                instances: start..instances.len() as u32,
            });
        }
        (instances, batches)
    }

    fn create_instance_buffer(device: &wgpu::Device, capacity: u64) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("shape_instance_buffer"),
            size: capacity * std::mem::size_of::<InstanceData>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}

fn upload(device: &wgpu::Device, geometry: &Geometry) -> GpuMesh {
    let vertices: Vec<Vertex> = geometry
        .positions()
        .iter()
        .zip(geometry.normals())
        .map(|(position, normal)| Vertex {
            position: *position,
            normal: *normal,
        })
        .collect();
    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(geometry.name()),
        contents: bytemuck::cast_slice(&vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });
    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(geometry.name()),
        contents: bytemuck::cast_slice(geometry.indices()),
        usage: wgpu::BufferUsages::INDEX,
    });
    tracing::debug!(name = geometry.name(), triangles = geometry.triangle_count(), "uploaded geometry");
    GpuMesh {
        vertex_buffer,
        index_buffer,
        index_count: geometry.indices().len() as u32,
    }
}

fn scene_uniforms(scene: &SceneGraph, camera: &OrbitCamera) -> Uniforms {
    let mut ambient = Vec3::ZERO;
    let mut sun_dir = Vec3::Y;
    let mut sun_color = Vec3::ZERO;
    for (position, light) in scene.lights() {
        match light {
            Light::Ambient { color, intensity } => {
                ambient += Vec3::new(color.r, color.g, color.b) * *intensity;
            }
            Light::Directional {
                color, intensity, ..
            } => {
                sun_dir = position.try_normalize().unwrap_or(Vec3::Y);
                sun_color += Vec3::new(color.r, color.g, color.b) * *intensity;
            }
        }
    }
    Uniforms {
        view_proj: camera.view_projection().to_cols_array_2d(),
        ambient: ambient.extend(1.0).to_array(),
        sun_dir: sun_dir.extend(0.0).to_array(),
        sun_color: sun_color.extend(1.0).to_array(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shapez_common::Transform;
    use shapez_scene::{Color, NodeKind};

    #[test]
    fn scissor_is_clamped_to_target() {
        let rect = DeviceRect {
            x: -10.0,
            y: 50.0,
            width: 100.0,
            height: 100.0,
        };
        assert_eq!(rect.scissor_within(200, 100), Some((0, 50, 90, 50)));
    }

    #[test]
    fn offscreen_scissor_is_empty() {
        let rect = DeviceRect {
            x: 300.0,
            y: 0.0,
            width: 50.0,
            height: 50.0,
        };
        assert_eq!(rect.scissor_within(200, 100), None);
    }

    #[test]
    fn uniforms_collect_scene_lights() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        scene
            .add(
                root,
                "ambient",
                Transform::default(),
                NodeKind::Light(Light::Ambient {
                    color: Color::WHITE,
                    intensity: 1.0,
                }),
            )
            .unwrap();
        scene
            .add(
                root,
                "sun",
                Transform::from_position(Vec3::new(0.0, 4.0, 0.0)),
                NodeKind::Light(Light::Directional {
                    color: Color::WHITE,
                    intensity: 2.0,
                    cast_shadow: false,
                }),
            )
            .unwrap();
        let uniforms = scene_uniforms(&scene, &OrbitCamera::default());
        assert_eq!(uniforms.ambient, [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(uniforms.sun_dir, [0.0, 1.0, 0.0, 0.0]);
        assert_eq!(uniforms.sun_color, [2.0, 2.0, 2.0, 1.0]);
    }
}
