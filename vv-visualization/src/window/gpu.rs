//! wgpu surface, pipeline and per-panel draw batches

use crate::color::Rgb;
use crate::facet::Viewport;
use crate::lookup_table::LookupTable;
use bytemuck::{Pod, Zeroable};
use nalgebra::{Matrix4, Vector3};
use std::sync::Arc;
use vv_core::{Error, Result, TriangleMesh, Vector3f};
use wgpu::util::DeviceExt;
use winit::window::Window;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const COLORBAR_SEGMENTS: usize = 64;

fn gpu_error(message: impl std::fmt::Display) -> Error {
    Error::Visualization(message.to_string())
}

/// Interleaved vertex: position, normal, colour
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct GpuVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 3],
}

impl GpuVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x3];

    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GpuVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Per-panel uniform: camera and lighting switch
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct PanelUniform {
    pub view_proj: [[f32; 4]; 4],
    pub light_dir: [f32; 3],
    pub lit: f32,
}

impl PanelUniform {
    pub fn lit(view_proj: Matrix4<f32>, light_dir: Vector3<f32>) -> Self {
        Self {
            view_proj: view_proj.into(),
            light_dir: light_dir.into(),
            lit: 1.0,
        }
    }

    /// Screen-space overlay drawn with its own colours
    pub fn overlay() -> Self {
        Self {
            view_proj: Matrix4::identity().into(),
            light_dir: [0.0, 0.0, 1.0],
            lit: 0.0,
        }
    }
}

/// Positions, normals and indices of one mesh; colours are supplied per draw
#[derive(Debug, Clone)]
pub struct MeshGeometry {
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    indices: Vec<u32>,
}

impl MeshGeometry {
    /// Uses the mesh's `Normals` attribute when present, computed normals otherwise
    pub fn new(mesh: &TriangleMesh) -> Self {
        let mut valid;
        let mesh = if mesh.has_valid_faces() {
            mesh
        } else {
            valid = mesh.clone();
            let dropped = valid.retain_valid_faces();
            log::warn!("dropping {} out-of-range face(s) before upload", dropped);
            &valid
        };
        let normals: Vec<Vector3f> = mesh
            .normals()
            .unwrap_or_else(|| mesh.compute_vertex_normals());
        Self {
            positions: mesh.vertices.iter().map(|p| [p.x, p.y, p.z]).collect(),
            normals: normals.iter().map(|n| [n.x, n.y, n.z]).collect(),
            indices: mesh
                .faces
                .iter()
                .flat_map(|f| f.iter().map(|&i| i as u32))
                .collect(),
        }
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn vertices(&self, colors: &[Rgb]) -> Vec<GpuVertex> {
        self.positions
            .iter()
            .zip(&self.normals)
            .zip(colors.iter().chain(std::iter::repeat(&[1.0; 3])))
            .map(|((&position, &normal), &color)| GpuVertex {
                position,
                normal,
                color,
            })
            .collect()
    }
}

/// Vertical colour bar in panel-local normalised device coordinates
pub fn colorbar_geometry(table: &LookupTable) -> (Vec<GpuVertex>, Vec<u32>) {
    let (x0, x1) = (0.80, 0.88);
    let (y0, y1) = (-0.8, 0.8);
    let (lo, hi) = table.range();
    let mut vertices = Vec::with_capacity(COLORBAR_SEGMENTS * 4);
    let mut indices = Vec::with_capacity(COLORBAR_SEGMENTS * 6);
    for i in 0..COLORBAR_SEGMENTS {
        let t0 = i as f32 / COLORBAR_SEGMENTS as f32;
        let t1 = (i + 1) as f32 / COLORBAR_SEGMENTS as f32;
        let color = table.map(lo + (hi - lo) * (t0 + t1) * 0.5);
        let (ya, yb) = (y0 + (y1 - y0) * t0, y0 + (y1 - y0) * t1);
        let base = vertices.len() as u32;
        for (x, y) in [(x0, ya), (x1, ya), (x1, yb), (x0, yb)] {
            vertices.push(GpuVertex {
                position: [x, y, 0.0],
                normal: [0.0, 0.0, 1.0],
                color,
            });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    (vertices, indices)
}

/// Uploaded vertex and index buffers
pub struct DrawBuffers {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

/// One viewport with its camera uniform, meshes and optional overlay
pub struct PanelTarget {
    pub viewport: Viewport,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    overlay_buffer: wgpu::Buffer,
    overlay_group: wgpu::BindGroup,
    pub meshes: Vec<DrawBuffers>,
    pub overlay: Option<DrawBuffers>,
}

pub struct GpuRenderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    depth_view: wgpu::TextureView,
    background: wgpu::Color,
}

impl GpuRenderer {
    pub async fn new(window: Arc<Window>, background: Rgb) -> Result<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let size = window.inner_size();
        let surface = instance
            .create_surface(window)
            .map_err(|e| gpu_error(format!("failed to create surface: {}", e)))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| gpu_error("no suitable graphics adapter"))?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("vv device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_defaults()
                        .using_resolution(adapter.limits()),
                },
                None,
            )
            .await
            .map_err(|e| gpu_error(format!("failed to create device: {}", e)))?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| gpu_error("surface reports no texture formats"))?;
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("panel_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("mesh shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("mesh.wgsl").into()),
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("mesh pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("mesh pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                buffers: &[GpuVertex::desc()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // surfaces from mixed sources do not agree on winding
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        let depth_view = Self::create_depth_view(&device, &surface_config);
        let background = wgpu::Color {
            r: background[0] as f64,
            g: background[1] as f64,
            b: background[2] as f64,
            a: 1.0,
        };

        Ok(Self {
            surface,
            device,
            queue,
            surface_config,
            pipeline,
            bind_group_layout,
            depth_view,
            background,
        })
    }

    fn create_depth_view(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
    ) -> wgpu::TextureView {
        device
            .create_texture(&wgpu::TextureDescriptor {
                label: Some("depth texture"),
                size: wgpu::Extent3d {
                    width: config.width,
                    height: config.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: DEPTH_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            })
            .create_view(&wgpu::TextureViewDescriptor::default())
    }

    pub fn size(&self) -> (u32, u32) {
        (self.surface_config.width, self.surface_config.height)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.surface_config.width = width;
        self.surface_config.height = height;
        self.surface.configure(&self.device, &self.surface_config);
        self.depth_view = Self::create_depth_view(&self.device, &self.surface_config);
    }

    /// `None` for geometry with nothing to draw
    pub fn upload(&self, vertices: &[GpuVertex], indices: &[u32]) -> Option<DrawBuffers> {
        if vertices.is_empty() || indices.is_empty() {
            return None;
        }
        let vertex_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("vertex buffer"),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("index buffer"),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Some(DrawBuffers {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        })
    }

    fn uniform_group(&self, uniform: &PanelUniform) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("panel uniform"),
            contents: bytemuck::bytes_of(uniform),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("panel bind group"),
            layout: &self.bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        (buffer, group)
    }

    pub fn create_panel(&self, viewport: Viewport) -> PanelTarget {
        let (uniform_buffer, bind_group) = self.uniform_group(&PanelUniform::overlay());
        let (overlay_buffer, overlay_group) = self.uniform_group(&PanelUniform::overlay());
        PanelTarget {
            viewport,
            uniform_buffer,
            bind_group,
            overlay_buffer,
            overlay_group,
            meshes: Vec::new(),
            overlay: None,
        }
    }

    pub fn update_panel(&self, panel: &PanelTarget, uniform: &PanelUniform) {
        self.queue
            .write_buffer(&panel.uniform_buffer, 0, bytemuck::bytes_of(uniform));
        self.queue
            .write_buffer(&panel.overlay_buffer, 0, bytemuck::bytes_of(&PanelUniform::overlay()));
    }

    pub fn render(&mut self, panels: &[PanelTarget]) -> Result<()> {
        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let (w, h) = self.size();
                self.resize(w, h);
                return Ok(());
            }
            Err(e) => return Err(gpu_error(format!("failed to acquire frame: {}", e))),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.background),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.pipeline);

            let (width, height) = self.size();
            for panel in panels {
                let (x, y, w, h) = panel.viewport.to_pixels(width, height);
                pass.set_viewport(x as f32, y as f32, w as f32, h as f32, 0.0, 1.0);
                pass.set_scissor_rect(x, y, w, h);

                pass.set_bind_group(0, &panel.bind_group, &[]);
                for mesh in &panel.meshes {
                    draw(&mut pass, mesh);
                }
                if let Some(overlay) = &panel.overlay {
                    pass.set_bind_group(0, &panel.overlay_group, &[]);
                    draw(&mut pass, overlay);
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

fn draw<'a>(pass: &mut wgpu::RenderPass<'a>, buffers: &'a DrawBuffers) {
    pass.set_vertex_buffer(0, buffers.vertex_buffer.slice(..));
    pass.set_index_buffer(buffers.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
    pass.draw_indexed(0..buffers.index_count, 0, 0..1);
}
