/// Application settings
///
/// Stored as JSON in the user's config directory. Every field has a
/// default, so an empty or partial file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::debug;

use crate::error::{PipelineError, Result};

/// Environment variable that overrides the settings file location
pub const SETTINGS_ENV: &str = "VIDEO_HUB_CONFIG";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// ffmpeg binary (name on PATH or absolute path)
    pub ffmpeg_path: PathBuf,
    /// ffprobe binary, used to read video duration
    pub ffprobe_path: PathBuf,
    /// How many media tool invocations may run at once (0 = no limit)
    pub max_concurrent_extractions: usize,
    /// Per-video deadline in seconds (0 = wait forever)
    pub extraction_timeout_secs: u64,
    /// Screenshot height in pixels; width follows the aspect ratio
    pub thumbnail_height: u32,
    /// Output folder to start with, remembered between sessions
    pub output_dir: Option<PathBuf>,
    /// Default log filter when RUST_LOG is unset
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
            max_concurrent_extractions: 4,
            extraction_timeout_secs: 120,
            thumbnail_height: 100,
            output_dir: None,
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Get the path where settings should be stored
    ///
    /// - `$VIDEO_HUB_CONFIG` when set
    /// - Linux: ~/.config/video-hub/settings.json
    /// - macOS: ~/Library/Application Support/video-hub/settings.json
    /// - Windows: %APPDATA%\video-hub\settings.json
    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var(SETTINGS_ENV) {
            return PathBuf::from(path);
        }
        let mut path = dirs::config_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        path.push("video-hub");
        path.push("settings.json");
        path
    }

    /// Load settings, falling back to defaults if the file does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "Settings file does not exist; using defaults");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
        Self::from_json(&raw).map_err(|source| PipelineError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write settings as pretty JSON, creating the parent folder if needed
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|source| PipelineError::unserializable(path, source))?;
        std::fs::write(path, json).map_err(|e| PipelineError::io(path, e))
    }

    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Deadline for a single video, if one is configured
    pub fn extraction_timeout(&self) -> Option<Duration> {
        (self.extraction_timeout_secs > 0).then(|| Duration::from_secs(self.extraction_timeout_secs))
    }

    /// Semaphore size for media tool invocations, if bounded.
    /// Capped at what a tokio semaphore can hold.
    pub fn concurrency_limit(&self) -> Option<usize> {
        (self.max_concurrent_extractions > 0)
            .then_some(self.max_concurrent_extractions.min(Semaphore::MAX_PERMITS))
    }
}
