//! Configuration management (`<config dir>/config.toml`)
//!
//! Handles loading, saving, and providing defaults for playback settings.
//! Settings are stored in TOML format in the platform-specific config directory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tasrun_shared::MAX_FRAMES;

/// Script used when neither the command line nor the config names one.
pub const DEFAULT_SCRIPT_NAME: &str = "Celeste.tas";

/// Error loading or saving the configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read or written
    #[error("config I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Playback configuration.
///
/// Every field has a default so partial files load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PlaybackConfig {
    /// Root script; `Celeste.tas` in the working directory when unset
    #[serde(default)]
    pub script_path: Option<PathBuf>,
    #[serde(default)]
    pub playback: PlaybackSection,
    #[serde(default)]
    pub reload: ReloadSection,
    #[serde(default)]
    pub savestate: SaveStateSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSection {
    /// Speed of a `***` marker without an explicit number (default: 400)
    #[serde(default = "default_fast_forward_speed")]
    pub default_fast_forward_speed: u32,
    /// Duration cap of one action line (default: 9999, never higher)
    #[serde(default = "default_max_frames_per_line")]
    pub max_frames_per_line: u32,
}

/// Re-parse retry policy, for scripts that are being written while read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReloadSection {
    /// Attempts before keeping the last good timeline (default: 5)
    #[serde(default = "default_reload_attempts")]
    pub attempts: u32,
    /// Delay between attempts in milliseconds (default: 50)
    #[serde(default = "default_reload_delay_ms")]
    pub delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SaveStateSection {
    /// Backend slot used for breakpoint save-states (default: 0)
    #[serde(default)]
    pub slot: u32,
}

fn default_fast_forward_speed() -> u32 {
    400
}
fn default_max_frames_per_line() -> u32 {
    MAX_FRAMES
}
fn default_reload_attempts() -> u32 {
    5
}
fn default_reload_delay_ms() -> u64 {
    50
}

impl Default for PlaybackSection {
    fn default() -> Self {
        Self {
            default_fast_forward_speed: default_fast_forward_speed(),
            max_frames_per_line: default_max_frames_per_line(),
        }
    }
}

impl Default for ReloadSection {
    fn default() -> Self {
        Self {
            attempts: default_reload_attempts(),
            delay_ms: default_reload_delay_ms(),
        }
    }
}

impl PlaybackConfig {
    pub fn max_frames_per_line(&self) -> u32 {
        self.playback.max_frames_per_line.clamp(1, MAX_FRAMES)
    }

    pub fn default_speed(&self) -> u32 {
        self.playback.default_fast_forward_speed.max(1)
    }

    pub fn reload_attempts(&self) -> u32 {
        self.reload.attempts.max(1)
    }

    pub fn reload_delay(&self) -> Duration {
        Duration::from_millis(self.reload.delay_ms)
    }

    /// Root script path, falling back to [`DEFAULT_SCRIPT_NAME`].
    pub fn script_path(&self) -> PathBuf {
        self.script_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SCRIPT_NAME))
    }

    /// Parse a config file, reporting errors instead of falling back.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Create an empty script at `path` when nothing exists there yet.
pub fn ensure_script_exists(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, "")?;
        log::info!("Created empty script at {}", path.display());
    }
    Ok(())
}

/// Returns the platform-specific configuration directory.
///
/// On Windows: `%APPDATA%\tasrun\config`
/// On macOS: `~/Library/Application Support/io.tasrun.tasrun`
/// On Linux: `~/.config/tasrun`
///
/// Returns `None` if the home directory cannot be determined.
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("io.tasrun", "", "tasrun")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Loads the configuration from disk.
///
/// Returns default values if the file doesn't exist or cannot be parsed.
pub fn load() -> PlaybackConfig {
    config_dir()
        .and_then(|dir| std::fs::read_to_string(dir.join("config.toml")).ok())
        .and_then(|content| toml::from_str(&content).ok())
        .unwrap_or_default()
}

/// Saves the configuration to disk.
///
/// Creates the config directory if it doesn't exist.
pub fn save(config: &PlaybackConfig) -> Result<(), ConfigError> {
    if let Some(dir) = config_dir() {
        save_to(config, &dir.join("config.toml"))?;
    }
    Ok(())
}

pub fn save_to(config: &PlaybackConfig, path: &Path) -> Result<(), ConfigError> {
    let io_err = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(io_err)
}
