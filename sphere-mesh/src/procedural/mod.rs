//! Procedural sphere generation
//!
//! The sphere is a latitude/longitude grid of `(N + 1) × (2N + 1)` vertices
//! stored row-major, followed by a quad walk that emits two triangles per
//! grid cell.
//!
//! Two draw strategies share the same walk:
//! - `DrawMode::Indexed`: shared vertices + `u32` index list
//! - `DrawMode::Flattened`: every triangle corner copied by value

mod mesh;
mod sphere;
mod types;


pub use mesh::SphereMesh;
pub use sphere::{
    generate_sphere_topology, generate_sphere_vertices, row_stride, sphere_buffer_bytes,
    sphere_triangles, sphere_vertex_count,
};
pub use types::{DrawMode, SphereParams, Topology, Vertex};
