//! Short-lived memo of recent search results.
//!
//! Entries are keyed on the *normalized* query plus the requested limits and
//! expire after a fixed TTL. Every registry mutation clears the cache and
//! advances its version; a result computed against any other catalog version
//! is refused on insert, so a search racing a registration cannot store a
//! stale ranking.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;

use super::loader::LayeredResult;

/// Cache key: normalized query text plus the limits that shaped the result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub query: String,
    pub limit: usize,
    pub max_tokens: usize,
}

impl CacheKey {
    pub fn new(query: impl Into<String>, limit: usize, max_tokens: usize) -> Self {
        Self {
            query: query.into(),
            limit,
            max_tokens,
        }
    }
}

#[derive(Debug)]
struct CacheEntry {
    result: Arc<LayeredResult>,
    created_at: Instant,
}

#[derive(Debug)]
struct CacheState {
    entries: LruCache<CacheKey, CacheEntry>,
    /// Catalog version the current entries were computed against.
    version: u64,
}

/// TTL + LRU cache of layered search results.
#[derive(Debug)]
pub struct SearchCache {
    state: Mutex<CacheState>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl SearchCache {
    /// Create a cache holding at most `capacity` results for `ttl` each.
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            state: Mutex::new(CacheState {
                entries: LruCache::new(capacity),
                version: 0,
            }),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Look up a fresh result for `key`.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<LayeredResult>> {
        let mut state = self.state.lock();
        let expired = match state.entries.get(key) {
            Some(entry) if entry.created_at.elapsed() < self.ttl => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(Arc::clone(&entry.result));
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            state.entries.pop(key);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Store `result`, computed against catalog `version`.
    ///
    /// Returns `false` (and stores nothing) if the catalog has moved on
    /// since the result was computed.
    pub fn put(&self, key: CacheKey, result: Arc<LayeredResult>, version: u64) -> bool {
        let mut state = self.state.lock();
        if version != state.version {
            tracing::trace!(
                query = %key.query,
                version,
                current = state.version,
                "refusing stale cache entry"
            );
            return false;
        }
        state.entries.put(
            key,
            CacheEntry {
                result,
                created_at: Instant::now(),
            },
        );
        true
    }

    /// Drop every entry and accept only results for catalog `version` from
    /// now on.
    pub fn invalidate(&self, version: u64) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.version = version;
    }

    /// Catalog version entries are currently accepted for.
    pub fn version(&self) -> u64 {
        self.state.lock().version
    }

    /// Number of cached results (including any not yet found expired).
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(layer3_count: usize) -> Arc<LayeredResult> {
        Arc::new(LayeredResult {
            layer3_count,
            ..LayeredResult::default()
        })
    }

    #[test]
    fn test_miss_then_hit() {
        let cache = SearchCache::new(Duration::from_secs(60), 8);
        let key = CacheKey::new("read file", 5, 1000);
        assert!(cache.get(&key).is_none());
        assert!(cache.put(key.clone(), result(3), 0));
        assert_eq!(cache.get(&key).unwrap().layer3_count, 3);
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn test_key_includes_limits() {
        let cache = SearchCache::new(Duration::from_secs(60), 8);
        cache.put(CacheKey::new("read file", 5, 1000), result(1), 0);
        assert!(cache.get(&CacheKey::new("read file", 6, 1000)).is_none());
        assert!(cache.get(&CacheKey::new("read file", 5, 999)).is_none());
    }

    #[test]
    fn test_entries_expire() {
        let cache = SearchCache::new(Duration::from_millis(20), 8);
        let key = CacheKey::new("read file", 5, 1000);
        cache.put(key.clone(), result(1), 0);
        std::thread::sleep(Duration::from_millis(40));
        assert!(cache.get(&key).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidate_clears_everything() {
        let cache = SearchCache::new(Duration::from_secs(60), 8);
        cache.put(CacheKey::new("a", 1, 1), result(1), 0);
        cache.put(CacheKey::new("b", 1, 1), result(1), 0);
        assert_eq!(cache.len(), 2);
        cache.invalidate(1);
        assert!(cache.is_empty());
        assert_eq!(cache.version(), 1);
    }

    #[test]
    fn test_stale_version_refused() {
        let cache = SearchCache::new(Duration::from_secs(60), 8);
        cache.invalidate(4);
        let key = CacheKey::new("a", 1, 1);
        assert!(!cache.put(key.clone(), result(1), 3));
        assert!(cache.get(&key).is_none());
        assert!(cache.put(key.clone(), result(1), 4));
        assert!(cache.get(&key).is_some());
    }

    #[test]
    fn test_lru_capacity() {
        let cache = SearchCache::new(Duration::from_secs(60), 2);
        let a = CacheKey::new("a", 1, 1);
        let b = CacheKey::new("b", 1, 1);
        let c = CacheKey::new("c", 1, 1);
        cache.put(a.clone(), result(1), 0);
        cache.put(b.clone(), result(2), 0);
        // Touch "a" so "b" becomes least recently used.
        assert!(cache.get(&a).is_some());
        cache.put(c.clone(), result(3), 0);
        assert!(cache.get(&a).is_some());
        assert!(cache.get(&b).is_none());
        assert!(cache.get(&c).is_some());
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let cache = SearchCache::new(Duration::from_secs(60), 0);
        let key = CacheKey::new("a", 1, 1);
        assert!(cache.put(key.clone(), result(1), 0));
        assert!(cache.get(&key).is_some());
    }
}
