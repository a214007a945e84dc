//! Application configuration.
//!
//! Values come from an optional TOML file and are then overridden by
//! `MEDIA_CONVERTER_*` environment variables.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use crate::utils::{ConverterError, ConverterResult};

pub const DEFAULT_CONFIG_FILE: &str = "media-converter.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// ffmpeg executable used as the transcoding engine
    pub ffmpeg_path: String,
    /// ffprobe executable used to read video metadata
    pub ffprobe_path: String,
    /// Base URL of the download backend
    pub backend_url: String,
    /// Default tracing filter when RUST_LOG is unset
    pub log_level: String,
    /// Where the CLI writes converted files
    pub output_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            backend_url: "http://localhost:3000".to_string(),
            log_level: "info".to_string(),
            output_dir: PathBuf::from("converted"),
        }
    }
}

impl AppConfig {
    /// Loads `path` (or the default file in the working directory) and applies
    /// environment overrides. A missing file is not an error.
    pub fn load(path: Option<&Path>) -> ConverterResult<Self> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        let mut config = if path.exists() {
            let content = fs::read_to_string(&path)
                .map_err(|err| ConverterError::config(format!("failed to read config: {err}")))?;
            Self::from_toml(&content)?
        } else {
            Self::default()
        };
        config.apply_env_overrides(|key| env::var(key).ok());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> ConverterResult<Self> {
        toml::from_str(content)
            .map_err(|err| ConverterError::config(format!("failed to parse config: {err}")))
    }

    /// Defaults plus environment overrides, no file access.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides(|key| env::var(key).ok());
        config
    }

    fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(value) = get("MEDIA_CONVERTER_FFMPEG") {
            self.ffmpeg_path = value;
        }
        if let Some(value) = get("MEDIA_CONVERTER_FFPROBE") {
            self.ffprobe_path = value;
        }
        if let Some(value) = get("MEDIA_CONVERTER_BACKEND_URL") {
            self.backend_url = value;
        }
        if let Some(value) = get("MEDIA_CONVERTER_LOG") {
            self.log_level = value;
        }
    }
}
