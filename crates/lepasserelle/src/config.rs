// Engine Configuration
//
// *La Configuration* (The Configuration) - Recognition, linking, index and search settings for LeVerbe

use anyhow::{Context, Result};
use lelien::LinkerConfig;
use leparse::{ImplicitVocabulary, TestamentBoundary};
use lerecherche::SearchConfig;
use lestockage::cache::DEFAULT_CACHE_CAPACITY;
use lestockage::IndexConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Directory holding the configuration, relative to the data directory
pub const CONFIG_DIR: &str = ".leverbe";

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = ".leverbe/config.toml";

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Implicit-form vocabulary of the recognizer
    pub recognition: ImplicitVocabulary,

    /// Dictionary linking settings
    pub linking: LinkerConfig,

    /// Testament boundary for lexicon prefixes and Bible filters
    pub testament: TestamentBoundary,

    /// Index builder settings
    pub index: IndexConfig,

    /// Search settings
    pub search: SearchConfig,

    /// Annotation cache settings
    pub cache: CacheConfig,

    /// Reading settings
    pub reading: ReadingConfig,
}

impl EngineConfig {
    /// Load configuration from a data directory
    ///
    /// Looks for `.leverbe/config.toml` in the data directory.
    /// If not found, returns default configuration.
    pub fn load<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let config_path = data_dir.as_ref().join(DEFAULT_CONFIG_FILE);

        if !config_path.exists() {
            return Ok(EngineConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        let config: EngineConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

        Ok(config)
    }

    /// Save configuration to a data directory
    ///
    /// Creates `.leverbe` directory if it doesn't exist.
    pub fn save<P: AsRef<Path>>(&self, data_dir: P) -> Result<()> {
        let config_dir = data_dir.as_ref().join(CONFIG_DIR);
        fs::create_dir_all(&config_dir)
            .with_context(|| format!("Failed to create config directory: {:?}", config_dir))?;

        let config_path = config_dir.join("config.toml");

        let toml_string = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(&config_path, toml_string)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        Ok(())
    }
}

/// Annotation cache configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of cached annotation bundles
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// Reading configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ReadingConfig {
    /// Translation used for verse texts and verse search; the first one when unset
    pub translation: Option<String>,
}
