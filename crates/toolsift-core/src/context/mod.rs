//! Context engine — tool catalog, BM25 indexing, and layered tool loading.
//!
//! The context engine decides which tool descriptors a caller gets to see
//! for a given query:
//!
//! 1. **Tool Catalog**: registered descriptors keyed by unique name, each
//!    with a precomputed token estimate.
//!
//! 2. **BM25 Index**: inverted index over descriptor text with lazily
//!    rebuilt corpus statistics, fed by the shared tokenizer and the query
//!    processor (synonym expansion, domain hint).
//!
//! 3. **Tool Loader**: assembles the essential layer, the ranked and
//!    token-budgeted matched layer, and the remainder count, boosted by
//!    recorded usage and memoized in a short-lived cache.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────┐
//! │                    Tool Loader                     │
//! │                                                    │
//! │  ┌──────────┐  ┌───────────┐  ┌────────┐  ┌──────┐ │
//! │  │ Query    │  │ BM25      │  │ Usage  │  │Search│ │
//! │  │ Processor│─►│ Index     │─►│ Tracker│─►│Cache │ │
//! │  │ ·tokens  │  │ ·postings │  │ ·count │  │ ·TTL │ │
//! │  │ ·synonyms│  │ ·IDF      │  │ ·boost │  │ ·LRU │ │
//! │  │ ·domain  │  │ ·avgdl    │  │        │  │      │ │
//! │  └──────────┘  └───────────┘  └────────┘  └──────┘ │
//! │        ▲             ▲                             │
//! │        └─ Tokenizer ─┘     Tool Catalog · Budget   │
//! └────────────────────────────────────────────────────┘
//! ```

pub mod cache;
pub mod indexer;
pub mod loader;
pub mod query;
pub mod tokenizer;
pub mod tools;
pub mod usage;
pub mod window;

pub use cache::{CacheKey, SearchCache};
pub use indexer::{Bm25Index, CorpusStats, IndexError, ScoredDocument};
pub use loader::{
    CatalogSnapshot, EntryScore, Layer, LayeredEntry, LayeredResult, LoadOptions, LoaderError,
    LoaderStats, ToolLoader,
};
pub use query::{ProcessedQuery, QueryProcessor};
pub use tokenizer::tokenize;
pub use tools::{RegisteredTool, ToolCatalog, ToolDescriptor};
pub use usage::{UsageRecord, UsageTracker};
pub use window::TokenBudget;
