// Global configuration management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: DefaultsConfig,

    #[serde(default)]
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Codec label used when the CLI does not pass one
    #[serde(default = "default_codec")]
    pub codec: String,

    /// Expected transcode duration used for the percent estimate
    #[serde(default = "default_expected_duration_millis")]
    pub expected_duration_millis: u64,

    /// Output directory override; empty means the app-private data dir
    #[serde(default)]
    pub output_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// ffmpeg binary to invoke
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,

    /// ffprobe binary to invoke
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: String,
}

fn default_codec() -> String {
    "mpeg4".to_string()
}

fn default_expected_duration_millis() -> u64 {
    9000
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe_path() -> String {
    "ffprobe".to_string()
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            codec: default_codec(),
            expected_duration_millis: default_expected_duration_millis(),
            output_dir: String::new(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
        }
    }
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("ffpress");

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from disk, or fall back to defaults if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let contents = fs::read_to_string(&config_path).with_context(|| {
                format!("Failed to read config file: {}", config_path.display())
            })?;

            let config: Config = toml::from_str(&contents).with_context(|| {
                format!("Failed to parse config file: {}", config_path.display())
            })?;

            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save config to disk, creating the directory if needed
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&config_path, contents)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    /// Directory the compressed artifact lands in: the configured
    /// override, or the app-private data directory.
    pub fn output_dir(&self) -> Result<PathBuf> {
        if !self.defaults.output_dir.is_empty() {
            return Ok(PathBuf::from(&self.defaults.output_dir));
        }

        let data_dir = dirs::data_local_dir()
            .context("Could not determine data directory")?
            .join("ffpress");

        Ok(data_dir)
    }
}
