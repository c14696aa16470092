//! Usage tracking and popularity boost.
//!
//! Every successful tool invocation is recorded here. The count feeds a
//! logarithmic boost that is *added* to a tool's BM25 score, so frequently
//! used tools drift upward without ever outranking on popularity alone: a
//! tool only reaches the ranking at all if it shares a token with the query.

use std::time::SystemTime;

use dashmap::DashMap;

/// Default multiplier applied to `ln(1 + count)`.
pub const DEFAULT_BOOST_WEIGHT: f64 = 0.1;

/// Invocation history for one tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageRecord {
    /// Number of recorded invocations.
    pub count: u64,
    /// When the most recent invocation was recorded.
    pub last_used: SystemTime,
}

/// Concurrent per-tool usage counters.
///
/// Increments are atomic per tool (each entry is updated under its shard
/// lock) but are not ordered with respect to searches.
#[derive(Debug)]
pub struct UsageTracker {
    records: DashMap<String, UsageRecord>,
    boost_weight: f64,
}

impl UsageTracker {
    /// Create a tracker with the given boost weight.
    pub fn new(boost_weight: f64) -> Self {
        Self {
            records: DashMap::new(),
            boost_weight,
        }
    }

    /// Record one invocation of `name`.
    ///
    /// Names need not be registered: usage may arrive before or after the
    /// tool itself.
    pub fn record(&self, name: &str) {
        let now = SystemTime::now();
        self.records
            .entry(name.to_string())
            .and_modify(|r| {
                r.count += 1;
                r.last_used = now;
            })
            .or_insert(UsageRecord {
                count: 1,
                last_used: now,
            });
    }

    /// Score boost for `name`: `ln(1 + count) · weight`, or 0 if never used.
    pub fn boost(&self, name: &str) -> f64 {
        match self.records.get(name) {
            Some(record) => (record.count as f64).ln_1p() * self.boost_weight,
            None => 0.0,
        }
    }

    /// Number of recorded invocations of `name`.
    pub fn count(&self, name: &str) -> u64 {
        self.records.get(name).map(|r| r.count).unwrap_or(0)
    }

    /// When `name` was last recorded.
    pub fn last_used(&self, name: &str) -> Option<SystemTime> {
        self.records.get(name).map(|r| r.last_used)
    }

    /// The `n` most used tools, highest count first, ties by name.
    pub fn top(&self, n: usize) -> Vec<(String, u64)> {
        let mut all: Vec<(String, u64)> = self
            .records
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().count))
            .collect();
        all.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        all.truncate(n);
        all
    }

    pub fn boost_weight(&self) -> f64 {
        self.boost_weight
    }

    /// Number of distinct tools with recorded usage.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Forget all recorded usage.
    pub fn reset(&self) {
        self.records.clear();
    }
}

impl Default for UsageTracker {
    fn default() -> Self {
        Self::new(DEFAULT_BOOST_WEIGHT)
    }
}
