//! Sphere mesh - UV-sphere tessellation
//!
//! Generates latitude/longitude sphere geometry laid out for direct upload
//! into GPU buffers, with either an index list or a flattened triangle list.

pub mod error;
pub mod procedural;

pub use error::MeshError;
pub use procedural::{
    DrawMode, SphereMesh, SphereParams, Topology, Vertex, generate_sphere_topology,
    generate_sphere_vertices, row_stride, sphere_buffer_bytes, sphere_triangles,
    sphere_vertex_count,
};
