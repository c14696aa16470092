#![deny(unsafe_code)]

//! Toolsift core — relevance-ranked, token-budgeted tool selection.
//!
//! Given a growing catalog of tool descriptors, picks the handful most
//! relevant to a natural-language query while always keeping a configured
//! set of essential tools. Everything here is synchronous and in-memory; the
//! [`ToolLoader`] is `Send + Sync` and meant to be shared behind an `Arc`
//! by whatever transport delivers queries and registrations.
//!
//! ```ignore
//! let loader = ToolLoader::new(config.selector)?;
//! loader.register_tools(vec![ToolDescriptor::new("read_file", "read a file from disk")])?;
//! let result = loader.search("read file", 10, 4000)?;
//! for entry in result.entries() {
//!     println!("{}", entry.name);
//! }
//! ```

/// Tool catalog, BM25 index, query processing, usage boost, and layered loading.
pub mod context;

pub use context::{
    Bm25Index, Layer, LayeredEntry, LayeredResult, LoadOptions, LoaderError, ToolDescriptor,
    ToolLoader, UsageTracker,
};
