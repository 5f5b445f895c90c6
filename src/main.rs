//! Edge of Reality constellation - Rust Implementation
//!
//! CLI commands:
//! - view: Launch the native constellation viewer
//! - list: List episodes with their theme colors
//! - connections: List shared-theme connections
//! - labels: Compute directional labels for a fixed sphere orientation

mod config;
mod episodes;
mod geometry;
mod gui;
mod interaction;
mod labels;
mod logging;
mod palette;
mod picking;
mod registry;
mod scene;
mod starfield;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "constellation")]
#[command(about = "Interactive 3D podcast constellation with directional edge labels")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to constellation.yaml config
    #[arg(short, long, default_value = "constellation.yaml")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch native viewer
    View,

    /// List episodes
    List {
        /// Filter by theme
        #[arg(short, long)]
        theme: Option<String>,
    },

    /// List shared-theme connections between episodes
    Connections,

    /// Print the directional labels for a sphere orientation
    Labels {
        /// Sphere rotation around the vertical axis, degrees
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        yaw: f32,

        /// Sphere rotation around the horizontal axis, degrees
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        pitch: f32,

        #[arg(long, default_value = "1280")]
        width: f32,

        #[arg(long, default_value = "800")]
        height: f32,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let env = config::Environment::load();

    // Initialize logging first
    logging::init_logging(&env)?;
    tracing::info!("Constellation starting up");

    let cli = Cli::parse();
    tracing::debug!("CLI args parsed: config={:?}", cli.config);

    // Load config
    let config = if cli.config.exists() {
        tracing::info!("Loading config from {:?}", cli.config);
        config::Config::load(&cli.config)?
    } else {
        tracing::warn!("Config file not found: {:?}, using built-in episodes", cli.config);
        config::Config::default()
    };
    tracing::info!("Config loaded: {} episodes, {} categories",
        config.episodes.len(), config.categories.len());

    match cli.command {
        Commands::View => {
            tracing::info!("Launching native viewer");
            match gui::run_viewer(&config, &env) {
                Ok(()) => {}
                Err(gui::ViewerError::RenderingUnavailable(reason)) => {
                    tracing::error!("Renderer failed to start: {}", reason);
                    eprintln!("{}", gui::FALLBACK_NOTICE);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Commands::List { theme } => {
            list_episodes(&config, theme.as_deref())?;
        }

        Commands::Connections => {
            list_connections(&config)?;
        }

        Commands::Labels { yaw, pitch, width, height, json } => {
            print_labels(&config, yaw, pitch, geometry::Viewport::new(width, height), json)?;
        }
    }

    Ok(())
}

/// List episodes, optionally filtered by theme
fn list_episodes(config: &config::Config, theme: Option<&str>) -> anyhow::Result<()> {
    let palette = palette::Palette::from_config(config)?;
    let episodes: Vec<_> = if let Some(theme) = theme {
        config.episodes_by_theme(theme)
    } else {
        config.episodes.iter().collect()
    };

    println!("Episodes ({}):", episodes.len());
    println!();

    for episode in episodes {
        let color = palette.primary_color(&episode.themes);
        println!("  - {} [{}] {} ({}, {})",
            episode.title, episode.id, color.to_hex(), episode.theta, episode.phi);
        println!("      themes: {}", episode.themes.join(", "));
    }
    Ok(())
}

/// List derived connections
fn list_connections(config: &config::Config) -> anyhow::Result<()> {
    let registry = registry::Registry::build(&config.episodes, config.tuning.sphere_radius)?;
    let connections = registry.all_connections();

    println!("Connections ({}):", connections.len());
    println!();

    for connection in connections {
        let title = |id: &str| {
            config
                .get_episode(id)
                .map(|e| e.title.clone())
                .unwrap_or_else(|| id.to_string())
        };
        println!("  {} <-> {}", title(&connection.source), title(&connection.target));
        println!("      shared: {}", connection.shared_themes.join(", "));
    }
    Ok(())
}

/// Run label placement once, without a window
fn print_labels(
    config: &config::Config,
    yaw: f32,
    pitch: f32,
    viewport: geometry::Viewport,
    json: bool,
) -> anyhow::Result<()> {
    let mut scene = scene::Constellation::new(config, viewport)?;
    scene.sphere = geometry::SphereTransform {
        rotation_x: pitch.to_radians(),
        rotation_y: yaw.to_radians(),
    };
    let placements = scene.placements();

    if json {
        let data: Vec<_> = placements
            .iter()
            .map(|p| {
                serde_json::json!({
                    "id": p.node_id,
                    "title": p.view.text,
                    "edge": p.edge.name(),
                    "glyph": p.view.glyph.to_string(),
                    "angle": p.angle,
                    "x": p.view.anchor.x,
                    "y": p.view.anchor.y,
                    "color": p.view.color.to_hex(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    println!("Labels at yaw {:.1}, pitch {:.1} on {}x{} ({}):",
        yaw, pitch, viewport.width, viewport.height, placements.len());
    println!();
    for p in &placements {
        println!("  {} {:<40} {:>6} ({:>7.1}, {:>7.1}) {:>5.1} deg",
            p.view.glyph, p.view.text, p.edge.name(), p.view.anchor.x, p.view.anchor.y, p.angle);
    }
    Ok(())
}
