use crate::defaults;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub stt: SttConfig,
    pub phrase: PhraseConfig,
    pub feed: FeedConfig,
}

/// Audio capture configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    /// Input device name; None picks the best default
    pub device: Option<String>,
    pub sample_rate: u32,
    /// Capture-side energy gate, RMS over raw i16 samples
    pub energy_threshold: u32,
    /// Maximum duration of one captured chunk
    pub record_timeout_ms: u32,
}

/// Speech-to-text configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SttConfig {
    pub model: String,
    /// Language code, or "auto" for detection
    pub language: String,
}

/// Phrase aggregation configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PhraseConfig {
    /// Inter-batch silence that finalizes a phrase
    pub phrase_timeout_ms: u32,
    /// Aggregator sleep while the queue is empty
    pub poll_interval_ms: u32,
}

/// Live feed configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FeedConfig {
    /// Serve the live feed without needing `--serve` on every run
    pub enabled: bool,
    /// Listen address for the feed server
    pub listen: String,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: None,
            sample_rate: defaults::SAMPLE_RATE,
            energy_threshold: defaults::ENERGY_THRESHOLD,
            record_timeout_ms: defaults::RECORD_TIMEOUT_MS,
        }
    }
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            model: defaults::DEFAULT_MODEL.to_string(),
            language: defaults::DEFAULT_LANGUAGE.to_string(),
        }
    }
}

impl Default for PhraseConfig {
    fn default() -> Self {
        Self {
            phrase_timeout_ms: defaults::PHRASE_TIMEOUT_MS,
            poll_interval_ms: defaults::POLL_INTERVAL_MS,
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen: defaults::FEED_ADDR.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// Missing fields use default values; invalid TOML is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration, falling back to defaults when the file is
    /// missing. Invalid TOML still fails.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply environment variable overrides.
    ///
    /// Supported:
    /// - LIVECAP_MODEL → stt.model
    /// - LIVECAP_LANGUAGE → stt.language
    /// - LIVECAP_DEVICE → audio.device
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(model) = std::env::var("LIVECAP_MODEL")
            && !model.is_empty()
        {
            self.stt.model = model;
        }

        if let Ok(language) = std::env::var("LIVECAP_LANGUAGE")
            && !language.is_empty()
        {
            self.stt.language = language;
        }

        if let Ok(device) = std::env::var("LIVECAP_DEVICE")
            && !device.is_empty()
        {
            self.audio.device = Some(device);
        }

        self
    }

    /// Get the default configuration file path.
    ///
    /// `~/.config/livecap/config.toml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("livecap")
            .join("config.toml")
    }
}
