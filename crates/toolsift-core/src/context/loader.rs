//! Layered tool loader — registry ownership and budgeted result assembly.
//!
//! A search returns three layers:
//!
//! 1. **Essential**: the configured essential tools, verbatim and in
//!    configured order, for every query.
//! 2. **Matched**: tools ranked by BM25 relevance plus usage boost, admitted
//!    greedily while the count cap and token budget allow.
//! 3. **Remainder**: everything else; only counted, reachable through an
//!    explicit search.
//!
//! ## Concurrency
//!
//! The registry and its index live in an immutable [`CatalogSnapshot`]
//! behind an [`ArcSwap`]. Searches load the current snapshot without taking
//! any lock and finish against it even if a writer publishes a newer one
//! meanwhile. Writers serialize on a mutex, apply their batch to a private
//! clone, then swap it in and clear the cache. Corpus statistics for a
//! snapshot are built by the first search that needs them.
//!
//! ```text
//! search ─► normalize ─► rank ─► boost ─► dedupe vs layer 1 ─► budget trim ─► cache ─► result
//! ```

use std::collections::HashSet;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};

use toolsift_config::{ConfigError, SelectorConfig};

use super::cache::{CacheKey, SearchCache};
use super::indexer::{Bm25Index, IndexError};
use super::query::{ProcessedQuery, QueryProcessor};
use super::tools::{RegisteredTool, ToolCatalog, ToolDescriptor};
use super::usage::UsageTracker;
use super::window::TokenBudget;

/// Index candidates fetched per Layer 2 slot, leaving room for budget trimming.
const CANDIDATE_MULTIPLIER: usize = 4;

/// Lower bound on index candidates per search.
const MIN_CANDIDATES: usize = 32;

/// Upper bound on index candidates per search.
pub const MAX_CANDIDATES: usize = 1024;

/// Errors from the tool loader.
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    #[error("tool name must not be empty")]
    EmptyName,

    #[error("duplicate tool name in registration batch: {0}")]
    DuplicateName(String),

    #[error("invalid budget: {0}")]
    InvalidBudget(String),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("index error: {0}")]
    Index(#[from] IndexError),
}

/// Per-call limits for [`ToolLoader::load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Maximum number of Layer 2 tools.
    pub max_layer2_tools: usize,
    /// Token budget for Layer 1 and Layer 2 together.
    pub max_tokens: usize,
}

/// Which layer an entry was placed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    Essential,
    Matched,
}

/// Ranking detail for a Layer 2 entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EntryScore {
    /// Relevance plus boost; the value entries are ranked by.
    pub total: f64,
    /// Raw BM25 relevance.
    pub relevance: f64,
    /// Usage boost.
    pub boost: f64,
}

/// One tool in a layered result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayeredEntry {
    pub name: String,
    pub layer: Layer,
    /// `None` for an essential tool that has not been registered yet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descriptor: Option<Arc<ToolDescriptor>>,
    /// `None` for Layer 1, which is not ranked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<EntryScore>,
    pub estimated_tokens: usize,
}

/// The answer to a search.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LayeredResult {
    pub layer1: Vec<LayeredEntry>,
    pub layer2: Vec<LayeredEntry>,
    /// Registered tools not returned in either layer.
    pub layer3_count: usize,
    /// Estimated tokens of everything returned.
    pub estimated_tokens: usize,
    /// Catalog version this result was computed against.
    pub catalog_version: u64,
}

impl LayeredResult {
    /// Layer 1 followed by Layer 2.
    pub fn entries(&self) -> impl Iterator<Item = &LayeredEntry> {
        self.layer1.iter().chain(self.layer2.iter())
    }

    /// Names of all returned tools, Layer 1 first.
    pub fn names(&self) -> Vec<&str> {
        self.entries().map(|e| e.name.as_str()).collect()
    }

    pub fn layer1_names(&self) -> Vec<&str> {
        self.layer1.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn layer2_names(&self) -> Vec<&str> {
        self.layer2.iter().map(|e| e.name.as_str()).collect()
    }

    /// Number of returned entries across both layers.
    pub fn len(&self) -> usize {
        self.layer1.len() + self.layer2.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layer1.is_empty() && self.layer2.is_empty()
    }
}

/// Point-in-time counters for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoaderStats {
    pub tools: usize,
    pub indexed_terms: usize,
    pub avg_doc_len: f64,
    pub catalog_version: u64,
    pub cache_entries: usize,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub tracked_tools: usize,
}

/// An immutable registry generation: descriptors plus their index.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    pub version: u64,
    pub tools: ToolCatalog,
    pub index: Bm25Index,
}

/// A Layer 2 candidate during assembly.
struct Candidate<'a> {
    tool: &'a RegisteredTool,
    score: EntryScore,
    hint_match: bool,
}

/// Reject a batch containing an empty name or the same name twice.
fn validate_batch(descriptors: &[ToolDescriptor]) -> Result<(), LoaderError> {
    let mut seen = HashSet::with_capacity(descriptors.len());
    for descriptor in descriptors {
        if descriptor.name.trim().is_empty() {
            warn!("rejected registration batch: empty tool name");
            return Err(LoaderError::EmptyName);
        }
        if !seen.insert(descriptor.name.as_str()) {
            warn!(name = %descriptor.name, "rejected registration batch: duplicate name");
            return Err(LoaderError::DuplicateName(descriptor.name.clone()));
        }
    }
    Ok(())
}

/// Owns the tool registry and assembles layered results.
#[derive(Debug)]
pub struct ToolLoader {
    config: SelectorConfig,
    processor: QueryProcessor,
    usage: Arc<UsageTracker>,
    cache: SearchCache,
    snapshot: ArcSwap<CatalogSnapshot>,
    /// Serializes registry writers.
    writer: Mutex<()>,
}

impl ToolLoader {
    /// Create a loader with its own usage tracker.
    pub fn new(config: SelectorConfig) -> Result<Self, LoaderError> {
        let usage = Arc::new(UsageTracker::new(config.usage.boost_weight));
        Self::with_usage(config, usage)
    }

    /// Create a loader that shares an existing usage tracker.
    ///
    /// The tracker's boost weight must equal `config.usage.boost_weight`.
    pub fn with_usage(config: SelectorConfig, usage: Arc<UsageTracker>) -> Result<Self, LoaderError> {
        config.validate()?;
        if usage.boost_weight() != config.usage.boost_weight {
            return Err(ConfigError::Validation(format!(
                "usage tracker boost weight {} does not match usage.boost_weight {}",
                usage.boost_weight(),
                config.usage.boost_weight
            ))
            .into());
        }

        let cache = SearchCache::new(
            Duration::from_secs(config.cache.ttl_secs),
            config.cache.capacity,
        );
        let snapshot = CatalogSnapshot {
            version: 0,
            tools: ToolCatalog::new(),
            index: Bm25Index::new(config.bm25),
        };

        debug!(
            essentials = config.essential_tools.len(),
            max_layer2_tools = config.max_layer2_tools,
            max_tokens = config.max_tokens,
            "tool loader initialised"
        );

        Ok(Self {
            config,
            processor: QueryProcessor::new(),
            usage,
            cache,
            snapshot: ArcSwap::from_pointee(snapshot),
            writer: Mutex::new(()),
        })
    }

    // ── Registry mutation ───────────────────────────────────────────

    /// Register (or replace) a batch of tools.
    ///
    /// The whole batch is validated first; if any descriptor is invalid,
    /// nothing is registered.
    pub fn register_tools(&self, descriptors: Vec<ToolDescriptor>) -> Result<(), LoaderError> {
        validate_batch(&descriptors)?;
        if descriptors.is_empty() {
            return Ok(());
        }

        let count = descriptors.len();
        let published = self.publish(|next| {
            for descriptor in descriptors {
                next.index
                    .add_or_replace(&descriptor.name, &descriptor.index_text())?;
                next.tools.insert(descriptor);
            }
            Ok::<_, LoaderError>(Some(()))
        })?;
        if let Some((version, total, ())) = published {
            info!(count, total, version, "registered tools");
        }
        Ok(())
    }

    /// Remove tools by name. Unknown names are ignored.
    ///
    /// Returns the number of tools removed. If nothing was registered under
    /// any of the names, the catalog version and cache are left untouched.
    pub fn unregister_tools<S: AsRef<str>>(&self, names: &[S]) -> usize {
        self.remove_where(|_| names.iter().map(|n| n.as_ref().to_string()).collect())
    }

    /// Remove every tool registered by `source`.
    pub fn unregister_source(&self, source: &str) -> usize {
        self.remove_where(|tools| tools.names_from_source(source))
    }

    fn remove_where(&self, select: impl FnOnce(&ToolCatalog) -> Vec<String>) -> usize {
        let Ok(published) = self.publish(|next| {
            let mut removed = 0;
            for name in select(&next.tools) {
                if next.tools.remove(&name).is_some() {
                    next.index.remove(&name);
                    removed += 1;
                }
            }
            Ok::<_, Infallible>((removed > 0).then_some(removed))
        });
        match published {
            Some((version, total, removed)) => {
                info!(removed, total, version, "unregistered tools");
                removed
            }
            None => 0,
        }
    }

    /// Apply `apply` to a copy of the current snapshot and publish it.
    ///
    /// `apply` returning `Ok(None)` means nothing changed: the copy is
    /// discarded and neither the version nor the cache moves. Otherwise
    /// returns the new version and tool count alongside `apply`'s output.
    fn publish<R, E>(
        &self,
        apply: impl FnOnce(&mut CatalogSnapshot) -> Result<Option<R>, E>,
    ) -> Result<Option<(u64, usize, R)>, E> {
        let _writer = self.writer.lock();
        let mut next = CatalogSnapshot::clone(&self.snapshot.load_full());
        let Some(out) = apply(&mut next)? else {
            return Ok(None);
        };
        next.version += 1;
        let version = next.version;
        let total = next.tools.len();
        self.snapshot.store(Arc::new(next));
        self.cache.invalidate(version);
        Ok(Some((version, total, out)))
    }

    // ── Search ──────────────────────────────────────────────────────

    /// Select tools for `query`, using the cache.
    ///
    /// `limit` caps Layer 1 and Layer 2 together and overrides the configured
    /// `max_layer2_tools`, which only applies to [`default_options`]. Layer 1
    /// is never trimmed, so a `limit` below the essential count yields
    /// Layer 1 alone.
    ///
    /// [`default_options`]: Self::default_options
    pub fn search(
        &self,
        query: &str,
        limit: usize,
        max_tokens: usize,
    ) -> Result<LayeredResult, LoaderError> {
        if max_tokens == 0 {
            return Err(LoaderError::InvalidBudget(
                "max_tokens must be non-zero".to_string(),
            ));
        }
        let started = Instant::now();
        let processed = self.processor.process(query);
        let key = CacheKey::new(processed.normalized(), limit, max_tokens);

        if let Some(hit) = self.cache.get(&key) {
            debug!(query = %key.query, "search cache hit");
            return Ok(LayeredResult::clone(&hit));
        }

        let snapshot = self.snapshot.load_full();
        let options = LoadOptions {
            max_layer2_tools: limit.saturating_sub(self.config.essential_tools.len()),
            max_tokens,
        };
        let result = self.assemble(&snapshot, &processed, options);
        self.cache
            .put(key, Arc::new(result.clone()), snapshot.version);

        debug!(
            query = %processed.normalized(),
            layer1 = result.layer1.len(),
            layer2 = result.layer2.len(),
            layer3 = result.layer3_count,
            tokens = result.estimated_tokens,
            elapsed_us = started.elapsed().as_micros() as u64,
            "search complete"
        );
        Ok(result)
    }

    /// Assemble a layered result for `query` without consulting the cache.
    pub fn load(&self, query: &str, options: LoadOptions) -> Result<LayeredResult, LoaderError> {
        if options.max_tokens == 0 {
            return Err(LoaderError::InvalidBudget(
                "max_tokens must be non-zero".to_string(),
            ));
        }
        let processed = self.processor.process(query);
        let snapshot = self.snapshot.load_full();
        Ok(self.assemble(&snapshot, &processed, options))
    }

    /// Limits taken from configuration.
    pub fn default_options(&self) -> LoadOptions {
        LoadOptions {
            max_layer2_tools: self.config.max_layer2_tools,
            max_tokens: self.config.max_tokens,
        }
    }

    fn assemble(
        &self,
        snapshot: &CatalogSnapshot,
        query: &ProcessedQuery,
        options: LoadOptions,
    ) -> LayeredResult {
        let mut budget = TokenBudget::new(options.max_tokens);
        let mut returned_registered = 0;

        let layer1: Vec<LayeredEntry> = self
            .config
            .essential_tools
            .iter()
            .map(|name| {
                let tool = snapshot.tools.get(name);
                let estimated_tokens = tool.map(|t| t.estimated_tokens).unwrap_or(0);
                if tool.is_some() {
                    returned_registered += 1;
                }
                budget.charge(estimated_tokens);
                LayeredEntry {
                    name: name.clone(),
                    layer: Layer::Essential,
                    descriptor: tool.map(|t| Arc::clone(&t.descriptor)),
                    score: None,
                    estimated_tokens,
                }
            })
            .collect();

        let mut layer2 = Vec::new();
        if !query.is_empty() && options.max_layer2_tools > 0 {
            for candidate in self.rank(snapshot, query, options.max_layer2_tools) {
                if layer2.len() >= options.max_layer2_tools {
                    break;
                }
                if !budget.try_charge(candidate.tool.estimated_tokens) {
                    continue;
                }
                layer2.push(LayeredEntry {
                    name: candidate.tool.name().to_string(),
                    layer: Layer::Matched,
                    descriptor: Some(Arc::clone(&candidate.tool.descriptor)),
                    score: Some(candidate.score),
                    estimated_tokens: candidate.tool.estimated_tokens,
                });
            }
        }
        returned_registered += layer2.len();

        LayeredResult {
            layer1,
            layer2,
            layer3_count: snapshot.tools.len().saturating_sub(returned_registered),
            estimated_tokens: budget.used(),
            catalog_version: snapshot.version,
        }
    }

    /// Rank, boost, and dedupe Layer 2 candidates, best first.
    fn rank<'a>(
        &self,
        snapshot: &'a CatalogSnapshot,
        query: &ProcessedQuery,
        max_layer2_tools: usize,
    ) -> Vec<Candidate<'a>> {
        let essentials: HashSet<&str> = self
            .config
            .essential_tools
            .iter()
            .map(String::as_str)
            .collect();
        let candidate_limit = max_layer2_tools
            .saturating_mul(CANDIDATE_MULTIPLIER)
            .saturating_add(essentials.len())
            .clamp(MIN_CANDIDATES, MAX_CANDIDATES);
        let hint = query.domain_hint.as_deref();

        let mut candidates: Vec<Candidate<'a>> = snapshot
            .index
            .search(&query.expanded_query, candidate_limit)
            .into_iter()
            .filter(|hit| !essentials.contains(hit.id.as_str()))
            .filter_map(|hit| {
                let tool = snapshot.tools.get(&hit.id)?;
                let boost = self.usage.boost(&hit.id);
                let hint_match = match (hint, tool.descriptor.category.as_deref()) {
                    (Some(hint), Some(category)) => hint.eq_ignore_ascii_case(category),
                    _ => false,
                };
                Some(Candidate {
                    tool,
                    score: EntryScore {
                        total: hit.score + boost,
                        relevance: hit.score,
                        boost,
                    },
                    hint_match,
                })
            })
            .collect();

        candidates.sort_by(|a, b| {
            b.score
                .total
                .total_cmp(&a.score.total)
                .then_with(|| b.hint_match.cmp(&a.hint_match))
                .then_with(|| a.tool.name().cmp(b.tool.name()))
        });
        candidates
    }

    // ── Usage ───────────────────────────────────────────────────────

    /// Record a successful invocation of `name`.
    pub fn record_usage(&self, name: &str) {
        self.usage.record(name);
    }

    /// The usage tracker feeding the boost.
    pub fn usage(&self) -> &Arc<UsageTracker> {
        &self.usage
    }

    // ── Introspection ───────────────────────────────────────────────

    /// The current catalog snapshot.
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.snapshot.load_full()
    }

    /// Look up a registered tool.
    pub fn get(&self, name: &str) -> Option<Arc<ToolDescriptor>> {
        self.snapshot
            .load()
            .tools
            .get(name)
            .map(|t| Arc::clone(&t.descriptor))
    }

    /// Names of all registered tools, sorted.
    pub fn names(&self) -> Vec<String> {
        self.snapshot.load().tools.names()
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.snapshot.load().tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Configured essential tool names, in Layer 1 order.
    pub fn essentials(&self) -> &[String] {
        &self.config.essential_tools
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    pub fn stats(&self) -> LoaderStats {
        let snapshot = self.snapshot.load_full();
        LoaderStats {
            tools: snapshot.tools.len(),
            indexed_terms: snapshot.index.term_count(),
            avg_doc_len: snapshot.index.stats().avg_doc_len,
            catalog_version: snapshot.version,
            cache_entries: self.cache.len(),
            cache_hits: self.cache.hits(),
            cache_misses: self.cache.misses(),
            tracked_tools: self.usage.len(),
        }
    }
}
