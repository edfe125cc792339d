//! Client configuration.
//!
//! Read from `config.toml` in the platform config directory, or the file
//! named by `CHATLINE_CONFIG`. Every field has a default, so a missing file
//! is not an error.

use anyhow::{Context, Result};
use chatline_core::{RenderOptions, VoiceSettings};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5001";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server_url: String,
    /// Message catalog locale; detected from the environment when unset
    pub locale: Option<String>,
    pub request_timeout_secs: u64,
    pub voice: VoiceConfig,
    pub render: RenderOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            locale: None,
            request_timeout_secs: 60,
            voice: VoiceConfig::default(),
            render: RenderOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    #[serde(flatten)]
    pub settings: VoiceSettings,
    /// Command that plays an audio URL
    pub player: String,
    /// Command that speaks text (espeak-compatible flags)
    pub synthesizer: String,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            settings: VoiceSettings::default(),
            player: "mpv".to_string(),
            synthesizer: "espeak-ng".to_string(),
        }
    }
}

impl Config {
    /// Default config file path.
    ///
    /// Can be overridden with the `CHATLINE_CONFIG` environment variable.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("CHATLINE_CONFIG") {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }

        directories::ProjectDirs::from("", "", "chatline")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("chatline.toml"))
    }

    /// Load from `path`, or from the default path when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::default_path);

        let mut config = if path.exists() {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            toml::from_str(&raw)
                .with_context(|| format!("invalid config {}", path.display()))?
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Config::default()
        };

        if let Ok(url) = env::var("CHATLINE_SERVER_URL") {
            if !url.trim().is_empty() {
                config.server_url = url;
            }
        }

        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
