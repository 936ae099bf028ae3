//! Sphere viewer - library interface
//!
//! Interactive session state, per-frame uniforms, configuration and the
//! wgpu/winit front end that displays a generated sphere.

pub mod app;
pub mod config;
pub mod graphics;
pub mod session;
pub mod uniforms;
