//! GPU copies of a generated sphere
//!
//! Handles mesh upload for both draw modes. A `GpuMesh` is rebuilt whole
//! whenever the session replaces its mesh; dropping the old value frees the
//! old buffers.

use anyhow::{Context, Result, bail};
use sphere_mesh::{DrawMode, SphereMesh};

/// Draw call parameters for a mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawCall {
    /// `draw_indexed(0..index_count, 0, 0..1)`
    Indexed { index_count: u32 },
    /// `draw(0..vertex_count, 0..1)`
    NonIndexed { vertex_count: u32 },
}

impl DrawCall {
    /// Derive the draw call for a mesh's current draw mode
    ///
    /// Fails if any buffer the draw reads is larger than `limits` allow.
    pub fn for_mesh(mesh: &SphereMesh, limits: &wgpu::Limits) -> Result<Self> {
        let largest = mesh.draw_vertex_bytes().len().max(mesh.index_bytes().len()) as u64;
        if largest > limits.max_buffer_size {
            bail!(
                "Sphere N={} ({}) needs a {}-byte buffer, device limit is {}",
                mesh.tessellation(),
                mesh.draw_mode(),
                largest,
                limits.max_buffer_size
            );
        }

        let count = u32::try_from(mesh.topology().element_count())
            .context("Sphere has too many elements for a single draw call")?;

        Ok(match mesh.draw_mode() {
            DrawMode::Indexed => DrawCall::Indexed { index_count: count },
            DrawMode::Flattened => DrawCall::NonIndexed {
                vertex_count: count,
            },
        })
    }
}

/// Uploaded sphere buffers
pub enum GpuMesh {
    Indexed {
        vertex_buffer: wgpu::Buffer,
        index_buffer: wgpu::Buffer,
        index_count: u32,
    },
    Flattened {
        vertex_buffer: wgpu::Buffer,
        vertex_count: u32,
    },
}

impl GpuMesh {
    /// Create GPU buffers for a mesh and copy its data into them
    pub fn upload(device: &wgpu::Device, queue: &wgpu::Queue, mesh: &SphereMesh) -> Result<Self> {
        let draw_call = DrawCall::for_mesh(mesh, &device.limits())?;
        let vertex_buffer = create_filled_buffer(
            device,
            queue,
            wgpu::BufferUsages::VERTEX,
            "Sphere Vertex Buffer",
            mesh.draw_vertex_bytes(),
        );

        let gpu_mesh = match draw_call {
            DrawCall::Indexed { index_count } => {
                let index_buffer = create_filled_buffer(
                    device,
                    queue,
                    wgpu::BufferUsages::INDEX,
                    "Sphere Index Buffer",
                    mesh.index_bytes(),
                );
                GpuMesh::Indexed {
                    vertex_buffer,
                    index_buffer,
                    index_count,
                }
            }
            DrawCall::NonIndexed { vertex_count } => GpuMesh::Flattened {
                vertex_buffer,
                vertex_count,
            },
        };

        tracing::debug!(
            "Uploaded sphere N={} ({}): {} vertex bytes, {} index bytes",
            mesh.tessellation(),
            mesh.draw_mode(),
            mesh.draw_vertex_bytes().len(),
            mesh.index_bytes().len()
        );

        Ok(gpu_mesh)
    }

    /// Record the draw into a render pass
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        match self {
            GpuMesh::Indexed {
                vertex_buffer,
                index_buffer,
                index_count,
            } => {
                pass.set_vertex_buffer(0, vertex_buffer.slice(..));
                pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..*index_count, 0, 0..1);
            }
            GpuMesh::Flattened {
                vertex_buffer,
                vertex_count,
            } => {
                pass.set_vertex_buffer(0, vertex_buffer.slice(..));
                pass.draw(0..*vertex_count, 0..1);
            }
        }
    }
}

fn create_filled_buffer(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    usage: wgpu::BufferUsages,
    label: &str,
    contents: &[u8],
) -> wgpu::Buffer {
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: contents.len() as u64,
        usage: usage | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    queue.write_buffer(&buffer, 0, contents);
    buffer
}
