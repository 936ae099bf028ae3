//! Sphere render pipeline and uniform binding

use sphere_mesh::Vertex;

use crate::uniforms::SphereUniforms;

/// WGSL source for the sphere pipeline
pub const SPHERE_SHADER: &str = include_str!("../../shaders/sphere.wgsl");

/// Depth buffer format
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Shader locations: position @0, normal @1, texcoord @2
pub const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

/// Vertex buffer layout for [`Vertex`]
pub fn vertex_buffer_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: Vertex::STRIDE as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &VERTEX_ATTRIBUTES,
    }
}

/// Uniform buffer and bind group, resolved once at pipeline creation
///
/// Per-frame updates are a single `write_buffer` into `buffer`.
pub struct UniformBinding {
    pub layout: wgpu::BindGroupLayout,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl UniformBinding {
    pub fn new(device: &wgpu::Device) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Sphere Uniform Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(SphereUniforms::SIZE),
                },
                count: None,
            }],
        });

        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Sphere Uniforms"),
            size: SphereUniforms::SIZE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Sphere Uniform Bind Group"),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });

        Self {
            layout,
            buffer,
            bind_group,
        }
    }

    /// Upload this frame's uniforms
    pub fn write(&self, queue: &wgpu::Queue, uniforms: &SphereUniforms) {
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(uniforms));
    }
}

/// Create the sphere pipeline for one polygon mode
///
/// Back faces are culled; outward-facing triangles are counter-clockwise.
pub fn create_sphere_pipeline(
    device: &wgpu::Device,
    surface_format: wgpu::TextureFormat,
    shader_module: &wgpu::ShaderModule,
    uniform_layout: &wgpu::BindGroupLayout,
    polygon_mode: wgpu::PolygonMode,
) -> wgpu::RenderPipeline {
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Sphere Pipeline Layout"),
        bind_group_layouts: &[uniform_layout],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(match polygon_mode {
            wgpu::PolygonMode::Line => "Sphere Pipeline (wireframe)",
            _ => "Sphere Pipeline",
        }),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: shader_module,
            entry_point: Some("vs"),
            buffers: &[vertex_buffer_layout()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader_module,
            entry_point: Some("fs"),
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: Some(wgpu::Face::Back),
            unclipped_depth: false,
            polygon_mode,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_attributes_match_vertex_layout() {
        let layout = vertex_buffer_layout();
        assert_eq!(layout.array_stride, 32);

        let offsets: Vec<u64> = layout.attributes.iter().map(|a| a.offset).collect();
        assert_eq!(
            offsets,
            vec![
                Vertex::POSITION_OFFSET as u64,
                Vertex::NORMAL_OFFSET as u64,
                Vertex::TEXCOORD_OFFSET as u64
            ]
        );

        let locations: Vec<u32> = layout
            .attributes
            .iter()
            .map(|a| a.shader_location)
            .collect();
        assert_eq!(locations, vec![0, 1, 2]);
    }

    // =========================================================================
    // Shader Compilation Tests (using naga)
    // =========================================================================

    fn parse_and_validate() -> Result<naga::Module, String> {
        let module = naga::front::wgsl::parse_str(SPHERE_SHADER)
            .map_err(|e| format!("WGSL parse error: {:?}", e))?;

        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        );
        validator
            .validate(&module)
            .map_err(|e| format!("Validation error: {:?}", e))?;

        Ok(module)
    }

    #[test]
    fn test_shader_compiles() {
        if let Err(e) = parse_and_validate() {
            panic!("{}", e);
        }
    }

    #[test]
    fn test_shader_entry_points() {
        let module = parse_and_validate().unwrap();
        let names: Vec<&str> = module
            .entry_points
            .iter()
            .map(|entry| entry.name.as_str())
            .collect();
        assert!(names.contains(&"vs"));
        assert!(names.contains(&"fs"));
    }

    #[test]
    fn test_shader_uniform_block_size() {
        let module = parse_and_validate().unwrap();
        let uniforms = module
            .global_variables
            .iter()
            .find(|(_, var)| var.name.as_deref() == Some("uniforms"))
            .map(|(_, var)| var.ty)
            .expect("uniforms global missing");

        let size = module.types[uniforms].inner.size(module.to_ctx());
        assert_eq!(size as u64, SphereUniforms::SIZE);
    }
}
