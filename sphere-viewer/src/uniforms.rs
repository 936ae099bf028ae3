//! Per-frame shader uniforms
//!
//! Everything the shader reads is packed into one uniform block and written
//! with a single buffer upload per frame.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};

use crate::session::RenderSession;

/// Uniform block matching `SphereUniforms` in `shaders/sphere.wgsl`
///
/// WGSL layout: two `mat4x4<f32>` (64 bytes each), `f32`, `u32`, padded to
/// a 16-byte multiple = 144 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct SphereUniforms {
    pub view_projection: Mat4,
    pub model: Mat4,
    pub aspect_ratio: f32,
    pub color_mode: u32,
    pub _padding: [u32; 2],
}

impl SphereUniforms {
    pub const SIZE: u64 = std::mem::size_of::<SphereUniforms>() as u64;

    /// Build the uniforms for the current session state
    pub fn from_session(session: &RenderSession, aspect_ratio: f32) -> Self {
        Self {
            view_projection: view_projection(session.radius()),
            model: Mat4::from_rotation_z(session.rotation_angle()),
            aspect_ratio,
            color_mode: session.color_mode().shader_index(),
            _padding: [0; 2],
        }
    }
}

/// Fixed camera looking down the -X axis with +Z up
///
/// Maps `(x, y, z)` to clip `(y, z, 0.5 - 0.5·x/extent, 1)` where `extent`
/// is at least 1 and covers the sphere radius, so the whole sphere stays
/// inside the `[0, 1]` depth range with larger x nearer the viewer.
pub fn view_projection(radius: f32) -> Mat4 {
    let extent = radius.abs().max(1.0);
    Mat4::from_cols(
        Vec4::new(0.0, 0.0, -0.5 / extent, 0.0),
        Vec4::new(1.0, 0.0, 0.0, 0.0),
        Vec4::new(0.0, 1.0, 0.0, 0.0),
        Vec4::new(0.0, 0.0, 0.5, 1.0),
    )
}
