//! Complete sphere mesh with replace-on-success regeneration

use super::sphere::{generate_sphere_topology, generate_sphere_vertices};
use super::types::{DrawMode, SphereParams, Topology, Vertex};
use crate::error::MeshError;

/// Sphere vertex grid plus the triangle data for one draw mode
///
/// A `SphereMesh` is always complete: every constructor and mutator either
/// produces a fully generated mesh or returns an error and leaves the
/// existing value untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct SphereMesh {
    params: SphereParams,
    vertices: Vec<Vertex>,
    topology: Topology,
}

impl SphereMesh {
    /// Generate a sphere for the given parameters and draw mode
    pub fn generate(params: SphereParams, mode: DrawMode) -> Result<Self, MeshError> {
        let vertices = generate_sphere_vertices(params.tessellation, params.radius)?;
        let topology = generate_sphere_topology(params.tessellation, &vertices, mode)?;

        tracing::debug!(
            "Generated sphere N={} radius={} ({}): {} vertices, {} triangles",
            params.tessellation,
            params.radius,
            mode,
            vertices.len(),
            topology.triangle_count()
        );

        Ok(Self {
            params,
            vertices,
            topology,
        })
    }

    /// Rebuild the whole mesh with new parameters
    ///
    /// On error the current mesh is kept as it was.
    pub fn regenerate(&mut self, params: SphereParams, mode: DrawMode) -> Result<(), MeshError> {
        *self = Self::generate(params, mode)?;
        Ok(())
    }

    /// Rebuild only the triangle data for another draw mode
    ///
    /// The vertex grid is reused. On error the current mesh is kept.
    pub fn set_draw_mode(&mut self, mode: DrawMode) -> Result<(), MeshError> {
        if self.topology.draw_mode() == mode {
            return Ok(());
        }
        self.topology = generate_sphere_topology(self.params.tessellation, &self.vertices, mode)?;
        Ok(())
    }

    pub fn tessellation(&self) -> u32 {
        self.params.tessellation
    }

    pub fn radius(&self) -> f32 {
        self.params.radius
    }

    pub fn draw_mode(&self) -> DrawMode {
        self.topology.draw_mode()
    }

    /// The shared vertex grid (row-major)
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Index list, if generated in `DrawMode::Indexed`
    pub fn indices(&self) -> Option<&[u32]> {
        match &self.topology {
            Topology::Indexed(indices) => Some(indices.as_slice()),
            Topology::Flattened(_) => None,
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.topology.triangle_count()
    }

    /// Every triangle with its corners expanded to vertices
    ///
    /// Yields the same sequence regardless of draw mode.
    pub fn triangles(&self) -> Box<dyn Iterator<Item = [Vertex; 3]> + '_> {
        match &self.topology {
            Topology::Indexed(indices) => Box::new(indices.chunks_exact(3).map(move |triangle| {
                [
                    self.vertices[triangle[0] as usize],
                    self.vertices[triangle[1] as usize],
                    self.vertices[triangle[2] as usize],
                ]
            })),
            Topology::Flattened(corners) => Box::new(
                corners
                    .chunks_exact(3)
                    .map(|triangle| [triangle[0], triangle[1], triangle[2]]),
            ),
        }
    }

    /// Raw bytes of the shared vertex grid
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.vertices.as_slice())
    }

    /// Raw bytes of the index list (empty in `DrawMode::Flattened`)
    pub fn index_bytes(&self) -> &[u8] {
        match &self.topology {
            Topology::Indexed(indices) => bytemuck::cast_slice(indices.as_slice()),
            Topology::Flattened(_) => &[],
        }
    }

    /// Raw bytes of the vertex buffer a draw in the current mode reads
    pub fn draw_vertex_bytes(&self) -> &[u8] {
        match &self.topology {
            Topology::Indexed(_) => bytemuck::cast_slice(self.vertices.as_slice()),
            Topology::Flattened(corners) => bytemuck::cast_slice(corners.as_slice()),
        }
    }
}
