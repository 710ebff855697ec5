//! Persistent configuration
//!
//! Stored as JSON at `<config_dir>/bcmon/config.json`. Every field has a
//! default, so partial files and files from older versions load fine.

use crate::audio::loudness::LoudnessProfile;
use crate::overlay::DisplayMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors from loading or saving the config file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn default_refresh_interval() -> f64 {
    0.0
}

fn default_message_duration() -> f64 {
    2.0
}

fn default_loudness_profiles() -> Vec<LoudnessProfile> {
    crate::audio::loudness::default_profiles()
}

/// Overlay geometry, all sizes relative to the viewport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayGeometry {
    /// Main timecode size as a fraction of viewport height
    pub font_scale: f64,
    /// Lower bound for the main timecode size in pixels
    pub font_min: f64,
    /// Upper bound for the main timecode size in pixels
    pub font_max: f64,
    /// Timecode size factor in minimal mode
    pub minimal_scale: f64,
    /// Drop-frame indicator size relative to the timecode
    pub indicator_scale: f64,
    /// Info block line size as a fraction of viewport height
    pub info_scale: f64,
    pub info_min: f64,
    pub info_max: f64,
    /// Info block line spacing relative to the line size
    pub line_spacing: f64,
    /// Safe-area inset as a fraction of each viewport dimension, added to
    /// the margins the host reports
    pub safe_margin: f64,
    /// Progress bar width as a fraction of the safe-area width
    pub progress_width: f64,
    /// Progress bar height relative to the timecode size
    pub progress_height: f64,
    /// Gap between progress bar and timecode relative to the timecode size
    pub progress_gap: f64,
}

impl Default for OverlayGeometry {
    fn default() -> Self {
        Self {
            font_scale: 0.055,
            font_min: 16.0,
            font_max: 120.0,
            minimal_scale: 0.6,
            indicator_scale: 0.45,
            info_scale: 0.028,
            info_min: 12.0,
            info_max: 48.0,
            line_spacing: 1.25,
            safe_margin: 0.05,
            progress_width: 0.6,
            progress_height: 0.08,
            progress_gap: 0.25,
        }
    }
}

/// Overlay colours and fonts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayStyle {
    pub font: String,
    /// Text colour as `RRGGBB`
    pub color: String,
    /// Outline colour as `RRGGBB`
    pub border_color: String,
    pub border_size: f64,
    /// Drop-frame indicator colour as `RRGGBB`
    pub indicator_color: String,
    /// Progress bar fill colour as `RRGGBB`
    pub progress_color: String,
    /// Overall opacity (0.0 = invisible, 1.0 = opaque)
    pub opacity: f64,
    /// Opacity of the unfilled progress bar track
    pub progress_track_opacity: f64,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            font: "monospace".to_string(),
            color: "FFFFFF".to_string(),
            border_color: "000000".to_string(),
            border_size: 2.0,
            indicator_color: "FFC040".to_string(),
            progress_color: "FFFFFF".to_string(),
            opacity: 0.9,
            progress_track_opacity: 0.3,
        }
    }
}

/// Which metrics the info block shows, one line each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InfoBlockConfig {
    pub show_elapsed: bool,
    pub show_remaining: bool,
    pub show_duration: bool,
    pub show_framerate: bool,
    /// Local wall-clock time
    pub show_clock: bool,
}

impl Default for InfoBlockConfig {
    fn default() -> Self {
        Self {
            show_elapsed: true,
            show_remaining: true,
            show_duration: true,
            show_framerate: true,
            show_clock: false,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Initial display mode
    #[serde(default)]
    pub mode: DisplayMode,
    /// Render deferral in seconds (0 = next tick)
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: f64,
    #[serde(default)]
    pub geometry: OverlayGeometry,
    #[serde(default)]
    pub style: OverlayStyle,
    #[serde(default)]
    pub info: InfoBlockConfig,
    /// Duration of transient OSD messages in seconds
    #[serde(default = "default_message_duration")]
    pub message_duration: f64,
    /// Loudness targets in cycling order; `none` is always cycled first
    #[serde(default = "default_loudness_profiles")]
    pub loudness_profiles: Vec<LoudnessProfile>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mode: DisplayMode::default(),
            refresh_interval: default_refresh_interval(),
            geometry: OverlayGeometry::default(),
            style: OverlayStyle::default(),
            info: InfoBlockConfig::default(),
            message_duration: default_message_duration(),
            loudness_profiles: default_loudness_profiles(),
        }
    }
}

impl AppConfig {
    /// Config file path: `<config_dir>/bcmon/config.json`
    pub fn path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("bcmon")
            .join("config.json")
    }

    /// Load config from the default path, falling back to defaults on any error
    pub fn load() -> Self {
        Self::load_or_default(&Self::path())
    }

    /// Load config from `path`, falling back to defaults on any error
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load_from(path) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "Loaded config from disk");
                config
            }
            Err(ConfigError::Io { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                tracing::info!(path = %path.display(), "No config file found, using defaults");
                Self::default()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load config, using defaults");
                Self::default()
            }
        }
    }

    /// Load config from `path`
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save config to `path`, creating parent directories if needed
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(io_err)?;
        tracing::info!(path = %path.display(), "Config saved to disk");
        Ok(())
    }

    /// Render deferral as a duration (negative values clamp to zero)
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs_f64(self.refresh_interval.max(0.0))
    }

    /// Transient message duration
    pub fn message_duration(&self) -> Duration {
        Duration::from_secs_f64(self.message_duration.max(0.0))
    }
}
