//! Configuration management (`<config dir>/sphere-viewer/config.toml`)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sphere_mesh::DrawMode;
use thiserror::Error;

use crate::session::ColorMode;

const CONFIG_FILE: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("No config directory available on this platform")]
    NoConfigDir,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sphere: SphereConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub window: WindowConfig,
}

/// Initial sphere geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SphereConfig {
    #[serde(default = "default_tessellation")]
    pub tessellation: u32,
    #[serde(default = "default_radius")]
    pub radius: f32,
    #[serde(default)]
    pub draw_mode: DrawMode,
}

/// Initial display toggles
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default)]
    pub wireframe: bool,
    #[serde(default)]
    pub color_mode: ColorMode,
    #[serde(default)]
    pub rotate: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_true")]
    pub vsync: bool,
}

fn default_tessellation() -> u32 { 36 }
fn default_radius() -> f32 { 1.0 }
fn default_width() -> u32 { 1024 }
fn default_height() -> u32 { 576 }
fn default_true() -> bool { true }

impl Default for SphereConfig {
    fn default() -> Self {
        Self {
            tessellation: default_tessellation(),
            radius: default_radius(),
            draw_mode: DrawMode::default(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            vsync: true,
        }
    }
}

/// Command-line values that take precedence over the config file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub tessellation: Option<u32>,
    pub radius: Option<f32>,
    pub flattened: bool,
    pub wireframe: bool,
}

impl Config {
    /// Apply command-line overrides on top of loaded values
    pub fn apply(&mut self, overrides: &ConfigOverrides) {
        if let Some(tessellation) = overrides.tessellation {
            self.sphere.tessellation = tessellation;
        }
        if let Some(radius) = overrides.radius {
            self.sphere.radius = radius;
        }
        if overrides.flattened {
            self.sphere.draw_mode = DrawMode::Flattened;
        }
        if overrides.wireframe {
            self.display.wireframe = true;
        }
    }
}

pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("org", "sphere", "sphere-viewer")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Default config file location, if the platform has a config directory
pub fn default_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(CONFIG_FILE))
}

/// Load a config file, failing on unreadable or malformed content
pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the default config file
///
/// A missing file yields the defaults silently; an unreadable or malformed
/// one yields the defaults with a warning.
pub fn load() -> Config {
    let Some(path) = default_path() else {
        return Config::default();
    };
    if !path.exists() {
        return Config::default();
    }

    match load_from(&path) {
        Ok(config) => {
            tracing::debug!("Loaded config from {}", path.display());
            config
        }
        Err(e) => {
            tracing::warn!("{}; using defaults", e);
            Config::default()
        }
    }
}

/// Write a config file, creating parent directories as needed
pub fn save_to(config: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Write {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Write `config` to `path`, or to the default config file when `None`
///
/// Returns the path written.
pub fn save(config: &Config, path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => default_path().ok_or(ConfigError::NoConfigDir)?,
    };
    save_to(config, &path)?;
    Ok(path)
}
