//! Interactive render session
//!
//! All state the keyboard can change lives in [`RenderSession`]. The mesh is
//! the single source of truth for tessellation, radius and draw mode, so a
//! rejected regeneration leaves every one of them as it was.

use std::f32::consts::TAU;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sphere_mesh::{DrawMode, MeshError, SphereMesh, SphereParams, sphere_buffer_bytes};
use thiserror::Error;

use crate::config::Config;

/// Rotation speed in radians per second
pub const ROTATION_SPEED: f32 = 0.5;
/// Radius change per key press
pub const RADIUS_STEP: f32 = 0.1;
/// Smallest radius reachable from the keyboard
pub const MIN_RADIUS: f32 = 0.1;

/// Why a session could not be created or changed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error(transparent)]
    Mesh(#[from] MeshError),
    #[error("radius must be positive and finite (got {radius})")]
    InvalidRadius { radius: f32 },
    #[error("sphere needs a {bytes}-byte buffer but the GPU allows at most {limit} bytes")]
    BufferTooLarge { bytes: u64, limit: u64 },
}

/// How the fragment stage colors the sphere
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorMode {
    /// `(texcoord.xy, 0, 1)`
    #[default]
    Texcoord,
    /// `(texcoord.xxx, 1)`
    TexcoordU,
    /// `(texcoord.yyy, 1)`
    TexcoordV,
}

impl ColorMode {
    /// Next mode in the cycle
    pub fn next(self) -> Self {
        match self {
            ColorMode::Texcoord => ColorMode::TexcoordU,
            ColorMode::TexcoordU => ColorMode::TexcoordV,
            ColorMode::TexcoordV => ColorMode::Texcoord,
        }
    }

    /// Value the shader switches on
    pub fn shader_index(self) -> u32 {
        match self {
            ColorMode::Texcoord => 0,
            ColorMode::TexcoordU => 1,
            ColorMode::TexcoordV => 2,
        }
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorMode::Texcoord => write!(f, "(texcoord.xy, 0, 1)"),
            ColorMode::TexcoordU => write!(f, "(texcoord.xxx, 1)"),
            ColorMode::TexcoordV => write!(f, "(texcoord.yyy, 1)"),
        }
    }
}

/// Discrete actions the viewer binds to keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKey {
    Quit,
    Help,
    ToggleWireframe,
    CycleColorMode,
    ToggleRotation,
    ToggleDrawMode,
    IncreaseTessellation,
    DecreaseTessellation,
    IncreaseRadius,
    DecreaseRadius,
}

/// Outcome of a key action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Close the viewer
    Quit,
    /// Print the hotkey list
    ShowHelp,
    /// A display flag changed; the mesh is the same
    DisplayChanged,
    /// The mesh was replaced and must be uploaded again
    MeshChanged,
    /// Nothing changed
    Unchanged,
}

/// Hotkey summary printed at startup and on request
pub fn help_text() -> &'static str {
    "[help]\n\
     - press ESC or 'q' to terminate the program\n\
     - press F1 or 'h' to see help\n\
     - press 'w' to toggle wireframe\n\
     - press 'd' to toggle (tc.xy, 0) > (tc.xxx, 1) > (tc.yyy, 1)\n\
     - press 'r' to rotate the sphere\n\
     - press 'i' to toggle indexed / flattened drawing\n\
     - press '+' / '-' to change the tessellation factor\n\
     - press ']' / '[' to change the radius\n"
}

/// Mutable state of one viewer run
#[derive(Debug, Clone)]
pub struct RenderSession {
    mesh: SphereMesh,
    /// Bumped every time `mesh` is replaced
    mesh_generation: u64,
    /// Largest GPU buffer a mesh may need, in bytes
    buffer_limit: u64,
    wireframe: bool,
    color_mode: ColorMode,
    rotating: bool,
    rotation_angle: f32,
    frame: u64,
}

impl RenderSession {
    /// Create a session with a freshly generated sphere
    ///
    /// The buffer limit starts unbounded; see [`RenderSession::set_buffer_limit`].
    pub fn new(params: SphereParams, mode: DrawMode) -> Result<Self, SessionError> {
        check_radius(params.radius)?;

        Ok(Self {
            mesh: SphereMesh::generate(params, mode)?,
            mesh_generation: 0,
            buffer_limit: u64::MAX,
            wireframe: false,
            color_mode: ColorMode::default(),
            rotating: false,
            rotation_angle: 0.0,
            frame: 0,
        })
    }

    /// Create a session from the startup configuration
    pub fn from_config(config: &Config) -> Result<Self, SessionError> {
        let params = SphereParams::new(config.sphere.tessellation, config.sphere.radius);
        let mut session = Self::new(params, config.sphere.draw_mode)?;
        session.wireframe = config.display.wireframe;
        session.color_mode = config.display.color_mode;
        session.rotating = config.display.rotate;
        Ok(session)
    }

    pub fn mesh(&self) -> &SphereMesh {
        &self.mesh
    }

    pub fn mesh_generation(&self) -> u64 {
        self.mesh_generation
    }

    pub fn tessellation(&self) -> u32 {
        self.mesh.tessellation()
    }

    pub fn radius(&self) -> f32 {
        self.mesh.radius()
    }

    pub fn draw_mode(&self) -> DrawMode {
        self.mesh.draw_mode()
    }

    pub fn wireframe(&self) -> bool {
        self.wireframe
    }

    pub fn color_mode(&self) -> ColorMode {
        self.color_mode
    }

    pub fn rotating(&self) -> bool {
        self.rotating
    }

    /// Current rotation about the polar axis, in `[0, 2π)`
    pub fn rotation_angle(&self) -> f32 {
        self.rotation_angle
    }

    /// Number of frames updated so far
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn buffer_limit(&self) -> u64 {
        self.buffer_limit
    }

    /// Cap the size of any single GPU buffer the mesh may need
    ///
    /// Fails, keeping the previous limit, if the current mesh already
    /// exceeds `limit`.
    pub fn set_buffer_limit(&mut self, limit: u64) -> Result<(), SessionError> {
        check_buffer_size(self.tessellation(), self.draw_mode(), limit)?;
        self.buffer_limit = limit;
        Ok(())
    }

    /// Regenerate the sphere with a new tessellation factor
    pub fn set_tessellation(&mut self, tessellation: u32) -> Result<(), SessionError> {
        check_buffer_size(tessellation, self.draw_mode(), self.buffer_limit)?;
        let params = SphereParams::new(tessellation, self.radius());
        self.replace_mesh(params, self.draw_mode())
    }

    /// Regenerate the sphere with a new radius
    pub fn set_radius(&mut self, radius: f32) -> Result<(), SessionError> {
        check_radius(radius)?;
        let params = SphereParams::new(self.tessellation(), radius);
        self.replace_mesh(params, self.draw_mode())
    }

    /// Switch between indexed and flattened drawing
    pub fn set_draw_mode(&mut self, mode: DrawMode) -> Result<(), SessionError> {
        if mode == self.draw_mode() {
            return Ok(());
        }
        check_buffer_size(self.tessellation(), mode, self.buffer_limit)?;
        self.mesh.set_draw_mode(mode)?;
        self.mesh_generation += 1;
        Ok(())
    }

    fn replace_mesh(&mut self, params: SphereParams, mode: DrawMode) -> Result<(), SessionError> {
        self.mesh.regenerate(params, mode)?;
        self.mesh_generation += 1;
        Ok(())
    }

    /// Apply one key action
    pub fn handle_key(&mut self, key: SessionKey) -> SessionEvent {
        match key {
            SessionKey::Quit => SessionEvent::Quit,
            SessionKey::Help => SessionEvent::ShowHelp,
            SessionKey::ToggleWireframe => {
                self.wireframe = !self.wireframe;
                tracing::info!(
                    "> using {} mode",
                    if self.wireframe { "wireframe" } else { "solid" }
                );
                SessionEvent::DisplayChanged
            }
            SessionKey::CycleColorMode => {
                self.color_mode = self.color_mode.next();
                tracing::info!("> using {}", self.color_mode);
                SessionEvent::DisplayChanged
            }
            SessionKey::ToggleRotation => {
                self.rotating = !self.rotating;
                tracing::info!(
                    "> rotation {}",
                    if self.rotating { "on" } else { "off" }
                );
                SessionEvent::DisplayChanged
            }
            SessionKey::ToggleDrawMode => {
                let mode = self.draw_mode().toggled();
                let result = self.set_draw_mode(mode);
                self.mesh_event(result, "draw mode")
            }
            SessionKey::IncreaseTessellation => {
                let result = self.set_tessellation(self.tessellation().saturating_add(1));
                self.mesh_event(result, "tessellation")
            }
            SessionKey::DecreaseTessellation => {
                if self.tessellation() <= 1 {
                    return SessionEvent::Unchanged;
                }
                let result = self.set_tessellation(self.tessellation().saturating_sub(1));
                self.mesh_event(result, "tessellation")
            }
            SessionKey::IncreaseRadius => {
                let radius = snap_radius(self.radius() + RADIUS_STEP);
                let result = self.set_radius(radius);
                self.mesh_event(result, "radius")
            }
            SessionKey::DecreaseRadius => {
                let radius = snap_radius(self.radius() - RADIUS_STEP).max(MIN_RADIUS);
                if radius == self.radius() {
                    return SessionEvent::Unchanged;
                }
                let result = self.set_radius(radius);
                self.mesh_event(result, "radius")
            }
        }
    }

    fn mesh_event(&self, result: Result<(), SessionError>, what: &str) -> SessionEvent {
        match result {
            Ok(()) => {
                tracing::info!(
                    "> {}: N={} radius={} ({}), {} triangles",
                    what,
                    self.tessellation(),
                    self.radius(),
                    self.draw_mode(),
                    self.mesh.triangle_count()
                );
                SessionEvent::MeshChanged
            }
            Err(e) => {
                tracing::warn!("Keeping current sphere, {} change rejected: {}", what, e);
                SessionEvent::Unchanged
            }
        }
    }

    /// Advance per-frame state by `dt`
    pub fn update(&mut self, dt: Duration) {
        if self.rotating {
            self.rotation_angle = (self.rotation_angle + ROTATION_SPEED * dt.as_secs_f32()) % TAU;
        }
        self.frame += 1;
    }
}

fn check_radius(radius: f32) -> Result<(), SessionError> {
    if radius.is_finite() && radius > 0.0 {
        Ok(())
    } else {
        Err(SessionError::InvalidRadius { radius })
    }
}

fn check_buffer_size(tessellation: u32, mode: DrawMode, limit: u64) -> Result<(), SessionError> {
    let bytes = sphere_buffer_bytes(tessellation, mode)?;
    if bytes > limit {
        return Err(SessionError::BufferTooLarge { bytes, limit });
    }
    Ok(())
}

/// Round to the radius step grid so repeated presses do not drift
fn snap_radius(radius: f32) -> f32 {
    (radius / RADIUS_STEP).round() * RADIUS_STEP
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(tessellation: u32) -> RenderSession {
        RenderSession::new(SphereParams::new(tessellation, 1.0), DrawMode::Indexed).unwrap()
    }

    #[test]
    fn test_new_session_defaults() {
        let session = session(4);
        assert_eq!(session.tessellation(), 4);
        assert_eq!(session.radius(), 1.0);
        assert_eq!(session.draw_mode(), DrawMode::Indexed);
        assert!(!session.wireframe());
        assert!(!session.rotating());
        assert_eq!(session.color_mode(), ColorMode::Texcoord);
        assert_eq!(session.mesh_generation(), 0);
        assert_eq!(session.frame(), 0);
    }

    #[test]
    fn test_new_session_rejects_zero_tessellation() {
        let result = RenderSession::new(SphereParams::new(0, 1.0), DrawMode::Indexed);
        assert_eq!(
            result.err(),
            Some(SessionError::Mesh(MeshError::ZeroTessellation))
        );
    }

    #[test]
    fn test_from_config() {
        let mut config = Config::default();
        config.sphere.tessellation = 5;
        config.sphere.draw_mode = DrawMode::Flattened;
        config.display.wireframe = true;
        config.display.color_mode = ColorMode::TexcoordV;
        config.display.rotate = true;

        let session = RenderSession::from_config(&config).unwrap();
        assert_eq!(session.tessellation(), 5);
        assert_eq!(session.draw_mode(), DrawMode::Flattened);
        assert!(session.wireframe());
        assert_eq!(session.color_mode(), ColorMode::TexcoordV);
        assert!(session.rotating());
    }

    #[test]
    fn test_quit_and_help_keys() {
        let mut session = session(2);
        assert_eq!(session.handle_key(SessionKey::Quit), SessionEvent::Quit);
        assert_eq!(session.handle_key(SessionKey::Help), SessionEvent::ShowHelp);
        assert_eq!(session.mesh_generation(), 0);
    }

    #[test]
    fn test_toggle_wireframe() {
        let mut session = session(2);
        assert_eq!(
            session.handle_key(SessionKey::ToggleWireframe),
            SessionEvent::DisplayChanged
        );
        assert!(session.wireframe());
        session.handle_key(SessionKey::ToggleWireframe);
        assert!(!session.wireframe());
    }

    #[test]
    fn test_color_mode_cycle() {
        let mut session = session(2);
        let mut seen = Vec::new();
        for _ in 0..3 {
            session.handle_key(SessionKey::CycleColorMode);
            seen.push(session.color_mode());
        }
        assert_eq!(
            seen,
            vec![
                ColorMode::TexcoordU,
                ColorMode::TexcoordV,
                ColorMode::Texcoord
            ]
        );
        assert_eq!(ColorMode::TexcoordV.shader_index(), 2);
    }

    #[test]
    fn test_toggle_draw_mode_regenerates() {
        let mut session = session(3);
        assert_eq!(
            session.handle_key(SessionKey::ToggleDrawMode),
            SessionEvent::MeshChanged
        );
        assert_eq!(session.draw_mode(), DrawMode::Flattened);
        assert_eq!(session.mesh_generation(), 1);
        assert!(session.mesh().indices().is_none());

        session.handle_key(SessionKey::ToggleDrawMode);
        assert_eq!(session.draw_mode(), DrawMode::Indexed);
        assert_eq!(session.mesh_generation(), 2);
    }

    #[test]
    fn test_tessellation_keys() {
        let mut session = session(2);
        assert_eq!(
            session.handle_key(SessionKey::IncreaseTessellation),
            SessionEvent::MeshChanged
        );
        assert_eq!(session.tessellation(), 3);
        assert_eq!(session.mesh().vertices().len(), 4 * 7);

        session.handle_key(SessionKey::DecreaseTessellation);
        session.handle_key(SessionKey::DecreaseTessellation);
        assert_eq!(session.tessellation(), 1);
        assert_eq!(session.mesh_generation(), 3);
    }

    #[test]
    fn test_tessellation_floor_keeps_mesh() {
        let mut session = session(1);
        let before = session.mesh().clone();

        assert_eq!(
            session.handle_key(SessionKey::DecreaseTessellation),
            SessionEvent::Unchanged
        );
        assert_eq!(session.tessellation(), 1);
        assert_eq!(session.mesh(), &before);
        assert_eq!(session.mesh_generation(), 0);
    }

    #[test]
    fn test_set_tessellation_error_keeps_state() {
        let mut session = session(6);
        assert_eq!(
            session.set_tessellation(0),
            Err(SessionError::Mesh(MeshError::ZeroTessellation))
        );
        assert_eq!(session.tessellation(), 6);
        assert_eq!(session.mesh_generation(), 0);
    }

    #[test]
    fn test_from_config_rejects_bad_radius() {
        for radius in [-1.0, 0.0, f32::NAN, f32::INFINITY] {
            let mut config = Config::default();
            config.sphere.radius = radius;

            let result = RenderSession::from_config(&config);
            assert!(
                matches!(result, Err(SessionError::InvalidRadius { .. })),
                "radius {} accepted",
                radius
            );
        }
    }

    #[test]
    fn test_set_radius_rejects_non_positive() {
        let mut session = session(2);
        assert_eq!(
            session.set_radius(0.0),
            Err(SessionError::InvalidRadius { radius: 0.0 })
        );
        assert_eq!(session.radius(), 1.0);
        assert_eq!(session.mesh_generation(), 0);
    }

    #[test]
    fn test_buffer_limit_blocks_oversized_changes() {
        // N=4 indexed: 45 vertices * 32 bytes = 1440 bytes
        let mut session = session(4);
        session.set_buffer_limit(2048).unwrap();
        let before = session.mesh().clone();

        // Flattened needs 4 * 8 * 2 * 3 * 32 = 6144 bytes
        assert_eq!(
            session.set_draw_mode(DrawMode::Flattened),
            Err(SessionError::BufferTooLarge {
                bytes: 6144,
                limit: 2048
            })
        );
        assert_eq!(
            session.handle_key(SessionKey::ToggleDrawMode),
            SessionEvent::Unchanged
        );

        // N=5 indexed needs 6 * 11 * 32 = 2112 bytes
        assert_eq!(
            session.handle_key(SessionKey::IncreaseTessellation),
            SessionEvent::Unchanged
        );

        assert_eq!(session.mesh(), &before);
        assert_eq!(session.mesh_generation(), 0);

        // Shrinking still works under the cap
        assert_eq!(
            session.handle_key(SessionKey::DecreaseTessellation),
            SessionEvent::MeshChanged
        );
        assert_eq!(session.tessellation(), 3);
    }

    #[test]
    fn test_buffer_limit_rejects_current_mesh() {
        let mut session = session(4);
        assert_eq!(
            session.set_buffer_limit(1000),
            Err(SessionError::BufferTooLarge {
                bytes: 1440,
                limit: 1000
            })
        );
        assert_eq!(session.buffer_limit(), u64::MAX);

        // wgpu's default limit is below what N=838 flattened needs
        let mut session =
            RenderSession::new(SphereParams::new(2, 1.0), DrawMode::Flattened).unwrap();
        session.set_buffer_limit(256 << 20).unwrap();
        assert!(matches!(
            session.set_tessellation(838),
            Err(SessionError::BufferTooLarge { .. })
        ));
        assert_eq!(session.tessellation(), 2);
    }

    #[test]
    fn test_radius_keys() {
        let mut session = session(2);
        session.handle_key(SessionKey::IncreaseRadius);
        session.handle_key(SessionKey::IncreaseRadius);
        assert!((session.radius() - 1.2).abs() < 1e-6);

        // Positions follow the new radius
        let first = session.mesh().vertices()[0].position;
        assert!((first.length() - session.radius()).abs() < 1e-5);
    }

    #[test]
    fn test_radius_floor() {
        let mut session =
            RenderSession::new(SphereParams::new(2, 0.2), DrawMode::Indexed).unwrap();
        assert_eq!(
            session.handle_key(SessionKey::DecreaseRadius),
            SessionEvent::MeshChanged
        );
        assert!((session.radius() - MIN_RADIUS).abs() < 1e-6);

        assert_eq!(
            session.handle_key(SessionKey::DecreaseRadius),
            SessionEvent::Unchanged
        );
        assert!(session.radius() > 0.0);
    }

    #[test]
    fn test_update_rotation_only_when_enabled() {
        let mut session = session(2);
        session.update(Duration::from_secs(1));
        assert_eq!(session.rotation_angle(), 0.0);
        assert_eq!(session.frame(), 1);

        session.handle_key(SessionKey::ToggleRotation);
        session.update(Duration::from_secs(2));
        assert!((session.rotation_angle() - 1.0).abs() < 1e-6);

        // Stopping freezes the current angle
        session.handle_key(SessionKey::ToggleRotation);
        session.update(Duration::from_secs(5));
        assert!((session.rotation_angle() - 1.0).abs() < 1e-6);
        assert_eq!(session.frame(), 3);
    }

    #[test]
    fn test_rotation_wraps() {
        let mut session = session(2);
        session.handle_key(SessionKey::ToggleRotation);
        session.update(Duration::from_secs(20));
        let angle = session.rotation_angle();
        assert!((0.0..TAU).contains(&angle));
        assert!((angle - (10.0 % TAU)).abs() < 1e-4);
    }

    #[test]
    fn test_help_text_lists_keys() {
        let help = help_text();
        for key in ["ESC", "'w'", "'d'", "'r'", "'i'", "'+'", "']'"] {
            assert!(help.contains(key), "missing {}", key);
        }
    }
}
