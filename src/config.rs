//! Preparation configuration
//!
//! Cache and preprocessing settings, loadable from YAML with per-field
//! defaults. Read once at construction; invalid values are fatal at startup.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{PrepError, Result};

/// Configuration for reference-audio preparation
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PrepConfig {
    /// Voice prompt cache settings
    #[serde(default)]
    pub cache: CacheSettings,

    /// Audio preprocessing settings
    #[serde(default)]
    pub preprocessing: PreprocessSettings,
}

/// Voice prompt cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Enable voice prompt caching for faster repeated generations
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Maximum number of voice prompts to cache
    #[serde(default = "default_cache_max_size")]
    pub max_size: usize,

    /// Time-to-live for cached voice prompts in seconds
    #[serde(default = "default_cache_ttl_seconds")]
    pub ttl_seconds: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_size: default_cache_max_size(),
            ttl_seconds: default_cache_ttl_seconds(),
        }
    }
}

/// Audio preprocessing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessSettings {
    /// Enable automatic preprocessing of reference audio
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Maximum duration for reference audio in seconds
    #[serde(default = "default_max_ref_duration")]
    pub max_ref_duration_secs: f64,

    /// Minimum target duration to keep when clipping, in seconds
    #[serde(default = "default_target_min_duration")]
    pub target_min_duration_secs: f64,
}

impl Default for PreprocessSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_ref_duration_secs: default_max_ref_duration(),
            target_min_duration_secs: default_target_min_duration(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_cache_max_size() -> usize {
    100
}

fn default_cache_ttl_seconds() -> u64 {
    3600
}

fn default_max_ref_duration() -> f64 {
    15.0
}

fn default_target_min_duration() -> f64 {
    5.0
}

impl PrepConfig {
    /// Load from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| PrepError::Config {
            message: format!("failed to read config file {:?}: {e}", path),
        })?;
        let config: Self = serde_yaml::from_str(&content).map_err(|e| PrepError::Config {
            message: format!("failed to parse config file {:?}: {e}", path),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate settings, reporting the first configuration error
    pub fn validate(&self) -> Result<()> {
        if self.cache.enabled && self.cache.max_size == 0 {
            return Err(PrepError::Config {
                message: "cache.max_size must be greater than zero".to_string(),
            });
        }
        if self.cache.enabled && self.cache.ttl_seconds == 0 {
            return Err(PrepError::Config {
                message: "cache.ttl_seconds must be greater than zero".to_string(),
            });
        }
        if self.preprocessing.max_ref_duration_secs <= 0.0 {
            return Err(PrepError::Config {
                message: "preprocessing.max_ref_duration_secs must be positive".to_string(),
            });
        }
        if self.preprocessing.target_min_duration_secs < 0.0 {
            return Err(PrepError::Config {
                message: "preprocessing.target_min_duration_secs must not be negative".to_string(),
            });
        }
        if self.preprocessing.target_min_duration_secs > self.preprocessing.max_ref_duration_secs {
            return Err(PrepError::Config {
                message: "preprocessing.target_min_duration_secs exceeds max_ref_duration_secs"
                    .to_string(),
            });
        }
        Ok(())
    }
}
