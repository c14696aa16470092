//! Tool catalog files.
//!
//! A catalog is a TOML document with one `[[tools]]` table per tool:
//!
//! ```toml
//! [[tools]]
//! name = "read_file"
//! description = "Read a file from disk"
//! category = "filesystem"
//! keywords = ["cat", "open"]
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use toolsift_core::ToolDescriptor;

#[derive(Debug, Default, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub tools: Vec<ToolDescriptor>,
}

impl Catalog {
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).context("invalid tool catalog")
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read catalog '{}'", path.display()))?;
        Self::parse(&content).with_context(|| format!("in catalog '{}'", path.display()))
    }
}
