//! Configuration management for balloonwatch.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::position::HOURS_AVAILABLE;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "balloonwatch";

/// Default narrative cache file name.
const CACHE_FILE_NAME: &str = "narratives.json";

/// Environment variable prefix. Nested keys use `__`, e.g.
/// `BALLOONWATCH_NARRATOR__API_KEY`.
const ENV_PREFIX: &str = "BALLOONWATCH_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `BALLOONWATCH_`)
/// 2. TOML config file at `~/.config/balloonwatch/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Telemetry feed configuration.
    pub source: SourceConfig,
    /// Narrative backend configuration.
    pub narrator: NarratorConfig,
    /// Narrative cache configuration.
    pub cache: CacheConfig,
}

/// Telemetry feed configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Base URL; `<hh>.json` is appended per hour.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Hours fetched when a command does not say otherwise.
    pub default_hours: u32,
}

/// Which narrator backend to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarratorBackend {
    /// Deterministic, no network.
    #[default]
    Offline,
    /// OpenAI-compatible chat-completion endpoint.
    Chat,
}

/// Narrative backend configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NarratorConfig {
    /// Backend selection.
    pub backend: NarratorBackend,
    /// API root, e.g. `https://api.openai.com/v1`.
    pub api_base: String,
    /// Model name sent with each request.
    pub model: String,
    /// Bearer token. Usually supplied through the environment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Sampling temperature.
    pub temperature: f64,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

/// Narrative cache configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Whether narratives are cached at all.
    pub enabled: bool,
    /// Maximum age of a cached narrative in seconds.
    pub ttl_secs: u64,
    /// Cache file. Defaults to `~/.local/share/balloonwatch/narratives.json`
    pub path: Option<PathBuf>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://a.windbornesystems.com/treasure/".to_string(),
            timeout_secs: 10,
            default_hours: HOURS_AVAILABLE,
        }
    }
}

impl Default for NarratorConfig {
    fn default() -> Self {
        Self {
            backend: NarratorBackend::Offline,
            api_base: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            temperature: 0.0,
            timeout_secs: 60,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 300,
            path: None, // Resolved at runtime
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        let url = &self.source.base_url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::ConfigValidation {
                message: format!("source.base_url must be an http(s) URL: {url}"),
            });
        }

        if self.source.timeout_secs == 0 {
            return Err(Error::ConfigValidation {
                message: "source.timeout_secs must be greater than 0".to_string(),
            });
        }

        if self.source.default_hours == 0 {
            return Err(Error::ConfigValidation {
                message: "source.default_hours must be greater than 0".to_string(),
            });
        }

        if self.narrator.backend == NarratorBackend::Chat && self.narrator.model.trim().is_empty()
        {
            return Err(Error::ConfigValidation {
                message: "narrator.model is required for the chat backend".to_string(),
            });
        }

        if !(0.0..=2.0).contains(&self.narrator.temperature) {
            return Err(Error::ConfigValidation {
                message: format!(
                    "narrator.temperature must be between 0 and 2 (got {})",
                    self.narrator.temperature
                ),
            });
        }

        Ok(())
    }

    /// Hours to fetch by default, clamped to the retention window.
    #[must_use]
    pub fn default_hours(&self) -> u32 {
        self.source.default_hours.min(HOURS_AVAILABLE)
    }

    /// Get the source request timeout as a Duration.
    #[must_use]
    pub fn source_timeout(&self) -> Duration {
        Duration::from_secs(self.source.timeout_secs)
    }

    /// Get the narrator request timeout as a Duration.
    #[must_use]
    pub fn narrator_timeout(&self) -> Duration {
        Duration::from_secs(self.narrator.timeout_secs)
    }

    /// Get the cache TTL as a Duration.
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }

    /// Get the cache path, resolving defaults if not set.
    #[must_use]
    pub fn cache_path(&self) -> PathBuf {
        self.cache
            .path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(CACHE_FILE_NAME))
    }
}
