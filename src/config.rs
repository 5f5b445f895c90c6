//! Configuration loader - YAML manifest + .env overrides

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::episodes;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid color '{value}' for '{key}' (expected #rrggbb)")]
    InvalidColor { key: String, value: String },
    #[error("Duplicate episode id: {0}")]
    DuplicateEpisode(String),
    #[error("No episodes configured")]
    NoEpisodes,
}

/// A single podcast episode record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub media_ref: String,
    /// Azimuth around the vertical axis, degrees
    pub theta: f32,
    /// Polar angle from the vertical axis, degrees
    pub phi: f32,
    pub themes: Vec<String>,
}

/// Main configuration loaded from constellation.yaml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Theme tag -> `#rrggbb`
    pub categories: BTreeMap<String, String>,
    pub fallback_color: String,
    pub episodes: Vec<Episode>,
    pub tuning: Tuning,
}

/// Scene and interaction constants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub sphere_radius: f32,
    pub node_radius: f32,
    pub glow_radius: f32,
    pub backdrop_radius: f32,
    pub star_count: usize,
    pub star_seed: u64,
    /// Radians per frame around the vertical axis while idle
    pub auto_rotate_speed: f32,
    /// Radians of velocity per pixel of pointer motion
    pub drag_scale: f32,
    pub damping: f32,
    pub velocity_epsilon: f32,
    pub snap_duration_ms: u64,
    pub snap_hold_ms: u64,
    pub mouse_click_threshold: f32,
    pub touch_tap_threshold: f32,
    /// Viewports at most this wide keep a single detail window open
    pub narrow_viewport: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            sphere_radius: 950.0,
            node_radius: 15.0,
            glow_radius: 20.0,
            backdrop_radius: 1000.0,
            star_count: 1500,
            star_seed: 0x5eed,
            auto_rotate_speed: 0.0005,
            drag_scale: 0.005,
            damping: 0.95,
            velocity_epsilon: 0.0001,
            snap_duration_ms: 800,
            snap_hold_ms: 100,
            mouse_click_threshold: 5.0,
            touch_tap_threshold: 10.0,
            narrow_viewport: 768.0,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            categories: episodes::builtin_categories(),
            fallback_color: "#ffffff".to_string(),
            episodes: episodes::builtin_episodes(),
            tuning: Tuning::default(),
        }
    }
}

impl Config {
    /// Load configuration from YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&content)?;
        tracing::debug!("Parsed {} episodes from {:?}", config.episodes.len(), path);
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject datasets the registry cannot index
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.episodes.is_empty() {
            return Err(ConfigError::NoEpisodes);
        }
        let mut seen = HashSet::new();
        for episode in &self.episodes {
            if !seen.insert(episode.id.as_str()) {
                return Err(ConfigError::DuplicateEpisode(episode.id.clone()));
            }
            if episode.themes.is_empty() {
                tracing::warn!("Episode '{}' has no themes; it will use the fallback color", episode.id);
            }
        }
        Ok(())
    }

    /// Get episode by ID
    pub fn get_episode(&self, id: &str) -> Option<&Episode> {
        self.episodes.iter().find(|e| e.id == id)
    }

    /// Get all episodes carrying a theme
    pub fn episodes_by_theme(&self, theme: &str) -> Vec<&Episode> {
        self.episodes
            .iter()
            .filter(|e| e.themes.iter().any(|t| t == theme))
            .collect()
    }
}

/// Process-level settings loaded from .env
#[derive(Debug, Clone)]
pub struct Environment {
    pub log_dir: String,
    /// `EnvFilter` directives used when `RUST_LOG` is unset
    pub log_filter: String,
    /// `minutely`, `hourly`, `daily` or `never`
    pub log_rotation: String,
    /// Rotated files to keep; all when unset
    pub log_keep: Option<usize>,
    pub window_size: [f32; 2],
}

impl Environment {
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars<F: Fn(&str) -> Option<String>>(var: F) -> Self {
        let dimension = |key: &str, default: f32| {
            var(key)
                .and_then(|s| s.parse().ok())
                .unwrap_or(default)
        };

        Environment {
            log_dir: var("CONSTELLATION_LOG_DIR").unwrap_or_else(|| "logs".to_string()),
            log_filter: var("CONSTELLATION_LOG_FILTER")
                .unwrap_or_else(|| "info,constellation=debug".to_string()),
            log_rotation: var("CONSTELLATION_LOG_ROTATION").unwrap_or_else(|| "daily".to_string()),
            log_keep: var("CONSTELLATION_LOG_KEEP").and_then(|s| s.parse().ok()),
            window_size: [
                dimension("CONSTELLATION_WIDTH", 1280.0),
                dimension("CONSTELLATION_HEIGHT", 800.0),
            ],
        }
    }
}
