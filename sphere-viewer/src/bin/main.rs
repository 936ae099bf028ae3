//! Sphere Viewer
//!
//! Renders a tessellated UV sphere coloured by its texture coordinates.
//!
//! # Usage
//!
//! ```bash
//! sphere-viewer
//! sphere-viewer --tessellation 8 --wireframe
//! sphere-viewer --flattened --radius 0.5
//! sphere-viewer --config my-sphere.toml
//! sphere-viewer --tessellation 12 --save-config
//! ```
//!
//! # Keyboard Shortcuts
//!
//! - ESC / Q: Quit
//! - H / F1: Print help
//! - W: Toggle wireframe
//! - D: Cycle colour mode
//! - R: Toggle rotation
//! - I: Toggle indexed / flattened drawing
//! - + / -: Change tessellation
//! - ] / [: Change radius

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use sphere_viewer::app;
use sphere_viewer::config::{self, ConfigOverrides};

#[derive(Parser)]
#[command(name = "sphere-viewer")]
#[command(author, version, about = "UV sphere mesh viewer")]
struct Args {
    /// Config file to load instead of the user config
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Tessellation factor N (N latitude bands, 2N longitude segments)
    #[arg(long, short = 'n')]
    tessellation: Option<u32>,

    /// Sphere radius
    #[arg(long, short = 'r')]
    radius: Option<f32>,

    /// Start with the flattened (non-indexed) vertex list
    #[arg(long)]
    flattened: bool,

    /// Start in wireframe mode
    #[arg(long, short = 'w')]
    wireframe: bool,

    /// Write the merged settings back to the config file before starting
    #[arg(long)]
    save_config: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => config::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => config::load(),
    };

    config.apply(&ConfigOverrides {
        tessellation: args.tessellation,
        radius: args.radius,
        flattened: args.flattened,
        wireframe: args.wireframe,
    });

    if args.save_config {
        let path =
            config::save(&config, args.config.as_deref()).context("Failed to save config")?;
        tracing::info!("Saved config to {}", path.display());
    }

    app::run(config)?;
    Ok(())
}
