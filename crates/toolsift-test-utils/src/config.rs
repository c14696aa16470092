//! Configuration builders for tests.
//!
//! Use [`TestConfigBuilder`] to create customised [`AppConfig`] values without
//! repeating boilerplate across crate boundaries.

use std::io::Write;

use tempfile::NamedTempFile;
use toolsift_config::{AppConfig, SelectorConfig};

/// Fluent builder for [`AppConfig`] in tests.
///
/// # Example
///
/// ```ignore
/// let selector = TestConfigBuilder::new()
///     .essential_tools(&["read_file"])
///     .max_tokens(2000)
///     .build_selector();
/// ```
pub struct TestConfigBuilder {
    config: AppConfig,
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
        }
    }

    pub fn essential_tools(mut self, names: &[&str]) -> Self {
        self.config.selector.essential_tools = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn max_layer2_tools(mut self, n: usize) -> Self {
        self.config.selector.max_layer2_tools = n;
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.selector.max_tokens = n;
        self
    }

    pub fn bm25(mut self, k1: f64, b: f64) -> Self {
        self.config.selector.bm25.k1 = k1;
        self.config.selector.bm25.b = b;
        self
    }

    pub fn cache_ttl_secs(mut self, secs: u64) -> Self {
        self.config.selector.cache.ttl_secs = secs;
        self
    }

    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.config.selector.cache.capacity = capacity;
        self
    }

    pub fn boost_weight(mut self, weight: f64) -> Self {
        self.config.selector.usage.boost_weight = weight;
        self
    }

    pub fn log_level(mut self, level: &str) -> Self {
        self.config.logging.level = level.to_string();
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }

    /// Just the selector section, as taken by `ToolLoader::new`.
    pub fn build_selector(self) -> SelectorConfig {
        self.config.selector
    }
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Write `contents` to a temporary `.toml` file that lives as long as the
/// returned handle.
pub fn write_temp_toml(contents: &str) -> std::io::Result<NamedTempFile> {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile()?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    Ok(file)
}
