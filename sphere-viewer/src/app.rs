//! Application state and main loop

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalPosition,
    event::{ElementState, KeyEvent, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::config::Config;
use crate::graphics::SphereGraphics;
use crate::session::{RenderSession, SessionError, SessionEvent, SessionKey, help_text};

const WINDOW_TITLE: &str = "sphere";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid initial sphere: {0}")]
    Session(#[from] SessionError),
    #[error("Window creation failed: {0}")]
    Window(String),
    #[error("Graphics initialization failed: {0}")]
    Graphics(String),
    #[error("Event loop error: {0}")]
    EventLoop(String),
}

/// Map a physical key to a session action
pub fn key_binding(key_code: KeyCode) -> Option<SessionKey> {
    let key = match key_code {
        KeyCode::Escape | KeyCode::KeyQ => SessionKey::Quit,
        KeyCode::KeyH | KeyCode::F1 => SessionKey::Help,
        KeyCode::KeyW => SessionKey::ToggleWireframe,
        KeyCode::KeyD => SessionKey::CycleColorMode,
        KeyCode::KeyR => SessionKey::ToggleRotation,
        KeyCode::KeyI => SessionKey::ToggleDrawMode,
        KeyCode::Equal | KeyCode::NumpadAdd => SessionKey::IncreaseTessellation,
        KeyCode::Minus | KeyCode::NumpadSubtract => SessionKey::DecreaseTessellation,
        KeyCode::BracketRight => SessionKey::IncreaseRadius,
        KeyCode::BracketLeft => SessionKey::DecreaseRadius,
        _ => return None,
    };
    Some(key)
}

/// Application state
pub struct App {
    /// Startup configuration
    config: Config,
    /// Interactive state shared by update and render
    session: RenderSession,
    /// Window handle (created during resumed event)
    window: Option<Arc<Window>>,
    /// Graphics backend (initialized after window creation)
    graphics: Option<SphereGraphics>,
    /// Last known cursor position, for click logging
    cursor_position: PhysicalPosition<f64>,
    /// Last frame time
    last_frame: Instant,
    /// Whether the application should exit
    should_exit: bool,
    /// Fatal error raised inside the event loop
    fatal_error: Option<AppError>,
}

impl App {
    /// Create a new application instance
    pub fn new(config: Config) -> Result<Self, AppError> {
        let session = RenderSession::from_config(&config)?;

        Ok(Self {
            config,
            session,
            window: None,
            graphics: None,
            cursor_position: PhysicalPosition::new(0.0, 0.0),
            last_frame: Instant::now(),
            should_exit: false,
            fatal_error: None,
        })
    }

    pub fn session(&self) -> &RenderSession {
        &self.session
    }

    fn fail(&mut self, error: AppError) {
        tracing::error!("{}", error);
        self.fatal_error = Some(error);
        self.should_exit = true;
    }

    /// Handle window resize
    fn handle_resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if let Some(graphics) = &mut self.graphics {
            graphics.resize(new_size.width, new_size.height);
        }
    }

    /// Handle keyboard input
    fn handle_key_input(&mut self, key_event: KeyEvent) {
        if key_event.state != ElementState::Pressed || key_event.repeat {
            return;
        }
        let PhysicalKey::Code(key_code) = key_event.physical_key else {
            return;
        };
        let Some(key) = key_binding(key_code) else {
            return;
        };

        match self.session.handle_key(key) {
            SessionEvent::Quit => {
                tracing::info!("Quit requested");
                self.should_exit = true;
            }
            SessionEvent::ShowHelp => {
                tracing::info!("\n{}", help_text());
            }
            SessionEvent::DisplayChanged => {
                if self.session.wireframe()
                    && self
                        .graphics
                        .as_ref()
                        .is_some_and(|graphics| !graphics.supports_wireframe())
                {
                    tracing::warn!("Wireframe is not supported on this adapter");
                }
            }
            SessionEvent::MeshChanged | SessionEvent::Unchanged => {}
        }
    }

    fn handle_mouse_input(&mut self, state: ElementState, button: MouseButton) {
        if button == MouseButton::Left && state == ElementState::Pressed {
            tracing::info!(
                "> Left mouse button pressed at ({}, {})",
                self.cursor_position.x as i32,
                self.cursor_position.y as i32
            );
        }
    }

    /// Per-frame update then render
    fn redraw(&mut self) {
        let now = Instant::now();
        let dt = now - self.last_frame;
        self.last_frame = now;

        self.session.update(dt);

        if let Some(graphics) = &mut self.graphics
            && let Err(e) = graphics.render(&self.session)
        {
            let error = AppError::Graphics(format!("{:#}", e));
            self.fail(error);
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attributes = Window::default_attributes()
            .with_title(WINDOW_TITLE)
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));

        let window = match event_loop.create_window(window_attributes) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                self.fail(AppError::Window(e.to_string()));
                event_loop.exit();
                return;
            }
        };

        let graphics = match SphereGraphics::new(window.clone(), self.config.window.vsync) {
            Ok(g) => g,
            Err(e) => {
                self.fail(AppError::Graphics(format!("{:#}", e)));
                event_loop.exit();
                return;
            }
        };

        if let Err(e) = self.session.set_buffer_limit(graphics.max_buffer_size()) {
            self.fail(AppError::Session(e));
            event_loop.exit();
            return;
        }

        tracing::info!("\n{}", help_text());
        self.last_frame = Instant::now();
        self.graphics = Some(graphics);
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                tracing::info!("Close requested");
                self.should_exit = true;
            }
            WindowEvent::Resized(new_size) => {
                tracing::debug!("Window resized to {:?}", new_size);
                self.handle_resize(new_size);
            }
            WindowEvent::KeyboardInput {
                event: key_event, ..
            } => {
                self.handle_key_input(key_event);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_position = position;
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.handle_mouse_input(state, button);
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
            }
            _ => {}
        }

        if self.should_exit {
            event_loop.exit();
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        // Request redraw for continuous rendering
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

pub fn run(config: Config) -> Result<(), AppError> {
    let mut app = App::new(config)?;

    tracing::info!(
        "Starting with N={} radius={} ({})",
        app.session.tessellation(),
        app.session.radius(),
        app.session.draw_mode()
    );

    let event_loop = EventLoop::new()
        .map_err(|e| AppError::EventLoop(format!("Failed to create event loop: {}", e)))?;

    event_loop.set_control_flow(ControlFlow::Poll);

    event_loop
        .run_app(&mut app)
        .map_err(|e| AppError::EventLoop(format!("Event loop error: {}", e)))?;

    match app.fatal_error.take() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
