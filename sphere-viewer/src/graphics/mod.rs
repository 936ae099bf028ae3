//! wgpu graphics backend for the sphere viewer
//!
//! Owns the surface, device, depth buffer, pipelines and the uploaded
//! sphere. The session is the only input: every frame reads its display
//! flags and re-uploads the mesh when its generation counter moves.

mod gpu_mesh;
mod pipeline;

use std::sync::Arc;

use anyhow::{Context, Result};
use winit::window::Window;

use crate::session::RenderSession;
use crate::uniforms::SphereUniforms;

pub use gpu_mesh::{DrawCall, GpuMesh};
pub use pipeline::{
    DEPTH_FORMAT, SPHERE_SHADER, UniformBinding, VERTEX_ATTRIBUTES, create_sphere_pipeline,
    vertex_buffer_layout,
};

/// Background color (39, 40, 34)
pub const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 39.0 / 255.0,
    g: 40.0 / 255.0,
    b: 34.0 / 255.0,
    a: 1.0,
};

/// Graphics context for the viewer window
pub struct SphereGraphics {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    depth_view: wgpu::TextureView,
    fill_pipeline: wgpu::RenderPipeline,
    /// None when the adapter cannot rasterize lines
    line_pipeline: Option<wgpu::RenderPipeline>,
    uniforms: UniformBinding,
    mesh: Option<GpuMesh>,
    /// Session mesh generation `mesh` was uploaded from
    mesh_generation: Option<u64>,
}

impl SphereGraphics {
    /// Create graphics context for the given window.
    pub fn new(window: Arc<Window>, vsync: bool) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("Failed to create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("Failed to find suitable GPU adapter")?;

        tracing::info!("Using GPU adapter: {:?}", adapter.get_info().name);

        let supports_wireframe = adapter
            .features()
            .contains(wgpu::Features::POLYGON_MODE_LINE);
        let required_features = if supports_wireframe {
            wgpu::Features::POLYGON_MODE_LINE
        } else {
            tracing::warn!("Adapter lacks POLYGON_MODE_LINE; wireframe toggle disabled");
            wgpu::Features::empty()
        };

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("Sphere Viewer Device"),
            required_features,
            required_limits: wgpu::Limits::default(),
            memory_hints: wgpu::MemoryHints::Performance,
            experimental_features: Default::default(),
            trace: wgpu::Trace::Off,
        }))
        .context("Failed to create GPU device")?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .or_else(|| surface_caps.formats.first().copied())
            .context("Surface reports no supported formats")?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: if vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let depth_view =
            Self::create_depth_view(&device, surface_config.width, surface_config.height);

        let shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Sphere Shader"),
            source: wgpu::ShaderSource::Wgsl(SPHERE_SHADER.into()),
        });

        let uniforms = UniformBinding::new(&device);
        let fill_pipeline = create_sphere_pipeline(
            &device,
            surface_format,
            &shader_module,
            &uniforms.layout,
            wgpu::PolygonMode::Fill,
        );
        let line_pipeline = supports_wireframe.then(|| {
            create_sphere_pipeline(
                &device,
                surface_format,
                &shader_module,
                &uniforms.layout,
                wgpu::PolygonMode::Line,
            )
        });

        tracing::info!(
            "Sphere graphics initialized: {}x{}, format: {:?}",
            surface_config.width,
            surface_config.height,
            surface_format
        );

        Ok(Self {
            device,
            queue,
            surface,
            surface_config,
            depth_view,
            fill_pipeline,
            line_pipeline,
            uniforms,
            mesh: None,
            mesh_generation: None,
        })
    }

    fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.surface_config.width as f32 / self.surface_config.height as f32
    }

    /// Largest buffer the device accepts, in bytes
    pub fn max_buffer_size(&self) -> u64 {
        self.device.limits().max_buffer_size
    }

    pub fn supports_wireframe(&self) -> bool {
        self.line_pipeline.is_some()
    }

    /// Resize the surface and depth buffer.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.surface_config.width = width;
            self.surface_config.height = height;
            self.surface.configure(&self.device, &self.surface_config);
            self.depth_view = Self::create_depth_view(&self.device, width, height);
            tracing::debug!("Surface resized to {}x{}", width, height);
        }
    }

    /// Re-upload the sphere if the session replaced it since the last frame
    ///
    /// The previous buffers stay in use if the upload fails.
    fn sync_mesh(&mut self, session: &RenderSession) -> Result<()> {
        if self.mesh_generation == Some(session.mesh_generation()) {
            return Ok(());
        }

        let mesh = GpuMesh::upload(&self.device, &self.queue, session.mesh())?;
        self.mesh = Some(mesh);
        self.mesh_generation = Some(session.mesh_generation());
        Ok(())
    }

    /// Render one frame of the session and present it
    pub fn render(&mut self, session: &RenderSession) -> Result<()> {
        self.sync_mesh(session)?;

        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                tracing::debug!("Surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.surface_config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                anyhow::bail!("Out of memory acquiring surface texture");
            }
            Err(e) => {
                tracing::warn!("Skipping frame: {}", e);
                return Ok(());
            }
        };

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.uniforms.write(
            &self.queue,
            &SphereUniforms::from_session(session, self.aspect_ratio()),
        );

        let pipeline = match (&self.line_pipeline, session.wireframe()) {
            (Some(line_pipeline), true) => line_pipeline,
            _ => &self.fill_pipeline,
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Sphere Frame Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Sphere Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
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

            if let Some(mesh) = &self.mesh {
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(0, &self.uniforms.bind_group, &[]);
                mesh.draw(&mut render_pass);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}
