//! Tool catalog — descriptors of every callable tool known to the loader.
//!
//! Tools are registered by external sources (MCP servers, feature managers)
//! and looked up by their globally unique name. Each registered tool carries
//! a precomputed token estimate so budget checks on the search path never
//! serialize anything.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::window::TokenBudget;

/// A callable tool as described by its source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Globally unique tool name (e.g. "read_file").
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Optional coarse category (e.g. "filesystem", "communication").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Extra search keywords.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    /// Identifier of the source that registered this tool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            category: None,
            keywords: Vec::new(),
            source: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Text fed to the index: name, description, category and keywords.
    pub fn index_text(&self) -> String {
        let mut text = String::with_capacity(
            self.name.len() + self.description.len() + self.keywords.len() * 8 + 16,
        );
        text.push_str(&self.name);
        text.push(' ');
        text.push_str(&self.description);
        if let Some(category) = &self.category {
            text.push(' ');
            text.push_str(category);
        }
        for keyword in &self.keywords {
            text.push(' ');
            text.push_str(keyword);
        }
        text
    }

    /// Estimated token cost of handing this descriptor to a caller.
    pub fn estimate_tokens(&self) -> usize {
        match serde_json::to_string(self) {
            Ok(json) => TokenBudget::estimate_tokens(&json),
            Err(_) => TokenBudget::estimate_tokens(&self.index_text()),
        }
    }
}

/// A descriptor as stored in the catalog.
#[derive(Debug, Clone)]
pub struct RegisteredTool {
    /// The descriptor as registered.
    pub descriptor: Arc<ToolDescriptor>,
    /// Token estimate computed at registration.
    pub estimated_tokens: usize,
}

impl RegisteredTool {
    pub fn new(descriptor: ToolDescriptor) -> Self {
        let estimated_tokens = descriptor.estimate_tokens();
        Self {
            descriptor: Arc::new(descriptor),
            estimated_tokens,
        }
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }
}

/// Name-keyed catalog of registered tools.
///
/// Iteration order is by name, which keeps listings deterministic.
#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
    tools: BTreeMap<String, RegisteredTool>,
}

impl ToolCatalog {
    /// Create a new empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a tool, returning the descriptor it replaced, if any.
    pub fn insert(&mut self, descriptor: ToolDescriptor) -> Option<Arc<ToolDescriptor>> {
        let tool = RegisteredTool::new(descriptor);
        self.tools
            .insert(tool.name().to_string(), tool)
            .map(|old| old.descriptor)
    }

    /// Remove a tool by name.
    pub fn remove(&mut self, name: &str) -> Option<RegisteredTool> {
        self.tools.remove(name)
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&RegisteredTool> {
        self.tools.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// List all registered tool names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    /// Names of every tool registered by `source`.
    pub fn names_from_source(&self, source: &str) -> Vec<String> {
        self.tools
            .values()
            .filter(|t| t.descriptor.source.as_deref() == Some(source))
            .map(|t| t.name().to_string())
            .collect()
    }

    /// Iterate over all registered tools in name order.
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredTool> {
        self.tools.values()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
