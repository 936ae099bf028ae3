//! UV sphere vertex grid and quad-walk topology

use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};

use super::types::{DrawMode, Topology, Vertex};
use crate::error::MeshError;

/// Vertices per latitude row for tessellation factor N (`2N + 1`)
///
/// The first and last column share a position; the duplicate carries
/// `u = 1.0` so textures wrap without index arithmetic across the seam.
/// Both the vertex grid and the quad walk index through this value.
pub const fn row_stride(tessellation: u32) -> usize {
    tessellation as usize * 2 + 1
}

/// Number of vertices in the sphere grid: `(N + 1) × (2N + 1)`
pub fn sphere_vertex_count(tessellation: u32) -> Result<usize, MeshError> {
    if tessellation == 0 {
        return Err(MeshError::ZeroTessellation);
    }

    let n = tessellation as usize;
    n.checked_mul(2)
        .and_then(|twice| twice.checked_add(1))
        .and_then(|stride| stride.checked_mul(n + 1))
        .ok_or(MeshError::SizeOverflow { tessellation })
}

/// Number of triangles emitted by the quad walk: `N × 2N × 2`
fn sphere_triangle_count(tessellation: u32) -> Result<usize, MeshError> {
    let n = tessellation as usize;
    n.checked_mul(n)
        .and_then(|quads| quads.checked_mul(4))
        .ok_or(MeshError::SizeOverflow { tessellation })
}

/// Size in bytes of the largest buffer a draw of this sphere reads
///
/// Indexed draws read the vertex grid and a `u32` index list; flattened
/// draws read one vertex per triangle corner. Computed without generating
/// anything, so callers can reject a sphere before allocating it.
pub fn sphere_buffer_bytes(tessellation: u32, mode: DrawMode) -> Result<u64, MeshError> {
    let vertex_count = sphere_vertex_count(tessellation)?;
    let corners = sphere_triangle_count(tessellation)?.checked_mul(3);

    let bytes = match mode {
        DrawMode::Indexed => {
            let vertex_bytes = vertex_count.checked_mul(Vertex::STRIDE);
            let index_bytes = corners.and_then(|c| c.checked_mul(size_of::<u32>()));
            vertex_bytes
                .zip(index_bytes)
                .map(|(vertex_bytes, index_bytes)| vertex_bytes.max(index_bytes))
        }
        DrawMode::Flattened => corners.and_then(|c| c.checked_mul(Vertex::STRIDE)),
    };

    bytes
        .and_then(|bytes| u64::try_from(bytes).ok())
        .ok_or(MeshError::SizeOverflow { tessellation })
}

/// Allocate an empty vector able to hold `elements` without reallocating
fn try_with_capacity<T>(elements: usize) -> Result<Vec<T>, MeshError> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(elements)
        .map_err(|_| MeshError::Allocation { elements })?;
    Ok(buffer)
}

/// Generate the sphere vertex grid
///
/// Row `i` (colatitude `alpha = π·i/N`) runs from the +Z pole (`i = 0`) to
/// the -Z pole (`i = N`); column `k` (longitude `beta = 2π·k/2N`) runs
/// counter-clockwise around +Z. The vertex for `(i, k)` is stored at
/// `i · row_stride(N) + k`.
///
/// # Arguments
/// * `tessellation` - Tessellation factor N (must be >= 1)
/// * `radius` - Sphere radius. Non-positive values are not rejected but
///   produce inverted or collapsed geometry.
///
/// # Returns
/// `(N + 1) × (2N + 1)` vertices with unit normals and
/// `texcoord = (beta / 2π, 1 - alpha / π)`
pub fn generate_sphere_vertices(tessellation: u32, radius: f32) -> Result<Vec<Vertex>, MeshError> {
    let vertex_count = sphere_vertex_count(tessellation)?;
    let stride = row_stride(tessellation);
    let bands = tessellation as f32;
    let segments = (stride - 1) as f32;

    let mut vertices = try_with_capacity(vertex_count)?;

    for i in 0..=tessellation {
        let v = i as f32 / bands;
        let alpha = PI * v;
        let (sin_alpha, cos_alpha) = alpha.sin_cos();

        for k in 0..stride {
            let u = k as f32 / segments;
            let beta = TAU * u;
            let (sin_beta, cos_beta) = beta.sin_cos();

            let normal = Vec3::new(sin_alpha * cos_beta, sin_alpha * sin_beta, cos_alpha);
            vertices.push(Vertex::new(normal * radius, normal, Vec2::new(u, 1.0 - v)));
        }
    }

    tracing::trace!(
        "generate_sphere_vertices: N={} radius={} -> {} vertices",
        tessellation,
        radius,
        vertices.len()
    );

    Ok(vertices)
}

/// Walk every grid cell and yield its two triangles as flat vertex indices
///
/// For band `i` and step `k`, with `f(i, k) = i · row_stride(N) + k`:
/// - Triangle 1: `f(i, k+1), f(i+1, k), f(i+1, k+1)`
/// - Triangle 2: `f(i+1, k), f(i, k+1), f(i, k)`
///
/// Both are counter-clockwise seen from outside the sphere. The second
/// triangle of each band-0 cell and the first triangle of each band-(N-1)
/// cell touch a pole with two corners and have zero area.
pub fn sphere_triangles(tessellation: u32) -> impl Iterator<Item = [usize; 3]> {
    let stride = row_stride(tessellation);
    let bands = tessellation as usize;
    let segments = stride - 1;

    (0..bands).flat_map(move |i| {
        (0..segments).flat_map(move |k| {
            let upper = i * stride + k;
            let lower = upper + stride;
            [[upper + 1, lower, lower + 1], [lower, upper + 1, upper]]
        })
    })
}

/// Generate triangles for a vertex grid built by [`generate_sphere_vertices`]
///
/// `tessellation` must be the factor the grid was built with; a vertex list
/// of any other length is rejected before anything is read from it.
///
/// In `DrawMode::Indexed` the result references `vertices` by `u32` index.
/// In `DrawMode::Flattened` each referenced vertex is copied into the output
/// at the position its index would occupy, so both modes expand to the same
/// triangle list.
pub fn generate_sphere_topology(
    tessellation: u32,
    vertices: &[Vertex],
    mode: DrawMode,
) -> Result<Topology, MeshError> {
    let expected = sphere_vertex_count(tessellation)?;
    // Largest index is expected - 1
    if mode == DrawMode::Indexed && u32::try_from(expected - 1).is_err() {
        return Err(MeshError::IndexOverflow {
            tessellation,
            vertex_count: expected,
        });
    }
    if vertices.len() != expected {
        return Err(MeshError::VertexCountMismatch {
            tessellation,
            expected,
            actual: vertices.len(),
        });
    }

    let element_count = sphere_triangle_count(tessellation)?
        .checked_mul(3)
        .ok_or(MeshError::SizeOverflow { tessellation })?;

    let topology = match mode {
        DrawMode::Indexed => {
            let mut indices = try_with_capacity(element_count)?;
            for triangle in sphere_triangles(tessellation) {
                indices.extend(triangle.map(|index| index as u32));
            }
            Topology::Indexed(indices)
        }
        DrawMode::Flattened => {
            let mut corners = try_with_capacity(element_count)?;
            for triangle in sphere_triangles(tessellation) {
                corners.extend(triangle.map(|index| vertices[index]));
            }
            Topology::Flattened(corners)
        }
    };

    tracing::trace!(
        "generate_sphere_topology: N={} mode={} -> {} triangles",
        tessellation,
        mode,
        topology.triangle_count()
    );

    Ok(topology)
}
