#![deny(unsafe_code)]

//! Configuration loading and validation for Toolsift.
//!
//! Loads TOML configuration files and validates them before any component
//! is constructed. [`AppConfig`] is the central configuration structure;
//! [`SelectorConfig`] carries the static tuning surface of the tool loader
//! (essential tools, budgets, BM25 constants, cache and usage settings).

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

/// Top-level application configuration.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Tool selection configuration.
    #[serde(default)]
    pub selector: SelectorConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Static configuration for the layered tool loader.
///
/// Read once when the loader is constructed; none of these values change
/// while the loader is running.
///
/// ## TOML Example
///
/// ```toml
/// [selector]
/// essential_tools = ["read_file", "search_tools"]
/// max_layer2_tools = 15
/// max_tokens = 4000
///
/// [selector.bm25]
/// k1 = 1.2
/// b = 0.75
///
/// [selector.cache]
/// ttl_secs = 60
/// capacity = 256
///
/// [selector.usage]
/// boost_weight = 0.1
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Tool names that are always returned in Layer 1, in this order.
    #[serde(default)]
    pub essential_tools: Vec<String>,

    /// Default cap on the number of query-matched (Layer 2) tools.
    #[serde(default = "default_max_layer2_tools")]
    pub max_layer2_tools: usize,

    /// Default token budget for a single result set.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    /// BM25 ranking constants.
    #[serde(default)]
    pub bm25: Bm25Config,

    /// Search cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Usage-boost settings.
    #[serde(default)]
    pub usage: UsageConfig,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            essential_tools: Vec::new(),
            max_layer2_tools: default_max_layer2_tools(),
            max_tokens: default_max_tokens(),
            bm25: Bm25Config::default(),
            cache: CacheConfig::default(),
            usage: UsageConfig::default(),
        }
    }
}

fn default_max_layer2_tools() -> usize {
    15
}

fn default_max_tokens() -> usize {
    4000
}

/// BM25 ranking constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bm25Config {
    /// Term-frequency saturation.
    #[serde(default = "default_bm25_k1")]
    pub k1: f64,

    /// Document-length normalization (0.0–1.0).
    #[serde(default = "default_bm25_b")]
    pub b: f64,
}

impl Default for Bm25Config {
    fn default() -> Self {
        Self {
            k1: default_bm25_k1(),
            b: default_bm25_b(),
        }
    }
}

fn default_bm25_k1() -> f64 {
    1.2
}

fn default_bm25_b() -> f64 {
    0.75
}

/// Search cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Seconds a cached result stays valid.
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,

    /// Maximum number of cached results (least recently used evicted first).
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl_secs(),
            capacity: default_cache_capacity(),
        }
    }
}

fn default_cache_ttl_secs() -> u64 {
    60
}

fn default_cache_capacity() -> usize {
    256
}

/// Usage-boost configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageConfig {
    /// Multiplier applied to `ln(1 + count)`.
    #[serde(default = "default_boost_weight")]
    pub boost_weight: f64,
}

impl Default for UsageConfig {
    fn default() -> Self {
        Self {
            boost_weight: default_boost_weight(),
        }
    }
}

fn default_boost_weight() -> f64 {
    0.1
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g. "info", "debug", "trace").
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl SelectorConfig {
    /// Validate the selector configuration.
    ///
    /// The tool loader calls this on construction, so a loader built from
    /// a hand-assembled config is held to the same rules as one loaded from
    /// TOML.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_layer2_tools == 0 {
            return Err(ConfigError::Validation(
                "selector.max_layer2_tools must be at least 1".to_string(),
            ));
        }
        if self.max_tokens == 0 {
            return Err(ConfigError::Validation(
                "selector.max_tokens must be non-zero".to_string(),
            ));
        }
        if !self.bm25.k1.is_finite() || self.bm25.k1 < 0.0 {
            return Err(ConfigError::Validation(format!(
                "selector.bm25.k1 must be a finite non-negative number, got {}",
                self.bm25.k1
            )));
        }
        if !(0.0..=1.0).contains(&self.bm25.b) {
            return Err(ConfigError::Validation(format!(
                "selector.bm25.b must be in [0.0, 1.0], got {}",
                self.bm25.b
            )));
        }
        if self.cache.ttl_secs == 0 {
            return Err(ConfigError::Validation(
                "selector.cache.ttl_secs must be at least 1".to_string(),
            ));
        }
        if self.cache.capacity == 0 {
            return Err(ConfigError::Validation(
                "selector.cache.capacity must be at least 1".to_string(),
            ));
        }
        if !self.usage.boost_weight.is_finite() || self.usage.boost_weight < 0.0 {
            return Err(ConfigError::Validation(format!(
                "selector.usage.boost_weight must be a finite non-negative number, got {}",
                self.usage.boost_weight
            )));
        }

        let mut seen = HashSet::new();
        for (i, name) in self.essential_tools.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "selector.essential_tools[{i}] must not be empty"
                )));
            }
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "selector.essential_tools[{i}] duplicates {name:?}"
                )));
            }
        }

        Ok(())
    }
}

impl AppConfig {
    /// Load configuration from a TOML file at the given path using async I/O.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.selector.validate()?;

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::Validation(format!(
                "logging.level must be one of {:?}, got {:?}",
                valid_levels, self.logging.level
            )));
        }

        Ok(())
    }
}
