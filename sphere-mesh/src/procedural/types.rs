//! Procedural mesh types
//!
//! Shared types for sphere generation.

use std::fmt;

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Vertex with position, normal, and texture coordinate
///
/// Layout is `[f32; 3] + [f32; 3] + [f32; 2]` = 32 bytes, no padding, so a
/// vertex slice can be copied verbatim into a GPU vertex buffer.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub texcoord: Vec2,
}

impl Vertex {
    /// Size of one vertex in bytes
    pub const STRIDE: usize = std::mem::size_of::<Vertex>();
    /// Byte offset of `position`
    pub const POSITION_OFFSET: usize = 0;
    /// Byte offset of `normal`
    pub const NORMAL_OFFSET: usize = 12;
    /// Byte offset of `texcoord`
    pub const TEXCOORD_OFFSET: usize = 24;

    /// Create a new vertex
    pub fn new(position: Vec3, normal: Vec3, texcoord: Vec2) -> Self {
        Self {
            position,
            normal,
            texcoord,
        }
    }
}

/// GPU draw strategy for a generated sphere
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DrawMode {
    /// Shared vertex buffer plus a `u32` index buffer
    #[default]
    Indexed,
    /// One vertex per triangle corner, drawn without indices
    Flattened,
}

impl DrawMode {
    /// The other draw mode
    pub fn toggled(self) -> Self {
        match self {
            DrawMode::Indexed => DrawMode::Flattened,
            DrawMode::Flattened => DrawMode::Indexed,
        }
    }
}

impl fmt::Display for DrawMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrawMode::Indexed => write!(f, "indexed"),
            DrawMode::Flattened => write!(f, "flattened"),
        }
    }
}

/// Triangle data produced by the topology generator
#[derive(Debug, Clone, PartialEq)]
pub enum Topology {
    /// Three indices per triangle into the sphere's vertex list
    Indexed(Vec<u32>),
    /// Three vertices per triangle, copied from the sphere's vertex list
    Flattened(Vec<Vertex>),
}

impl Topology {
    /// Draw mode this topology was generated for
    pub fn draw_mode(&self) -> DrawMode {
        match self {
            Topology::Indexed(_) => DrawMode::Indexed,
            Topology::Flattened(_) => DrawMode::Flattened,
        }
    }

    /// Number of elements a draw call consumes (indices or vertices)
    pub fn element_count(&self) -> usize {
        match self {
            Topology::Indexed(indices) => indices.len(),
            Topology::Flattened(vertices) => vertices.len(),
        }
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.element_count() / 3
    }
}

/// Sphere resolution and size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereParams {
    /// Tessellation factor N: N latitude bands, 2N longitude steps
    pub tessellation: u32,
    /// Sphere radius
    pub radius: f32,
}

impl SphereParams {
    pub fn new(tessellation: u32, radius: f32) -> Self {
        Self {
            tessellation,
            radius,
        }
    }
}

impl Default for SphereParams {
    fn default() -> Self {
        Self {
            tessellation: 36,
            radius: 1.0,
        }
    }
}
