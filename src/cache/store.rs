//! Bounded page cache.
//!
//! Entries are evicted strictly in insertion order. Lookups go through the
//! non-promoting `peek`/`contains` accessors of [`LruCache`], so the recency
//! list only ever moves on `put` and behaves as a FIFO queue.

use std::num::NonZeroUsize;
use std::time::Instant;

use lru::LruCache;
use metrics::counter;
use tracing::debug;

use super::keys::CacheKey;

pub(crate) const METRIC_CACHE_EVICT: &str = "pager_cache_evict_total";

/// One cached fetch result. Never mutated after insertion.
#[derive(Debug, Clone)]
pub struct CachedPage<T> {
    pub query: String,
    pub page: u32,
    pub items: Vec<T>,
    /// Page count the backend reported alongside these items.
    pub total_pages: u32,
    /// Monotonic insertion time.
    pub timestamp: Instant,
}

/// Page cache keyed by `(query, page)` with FIFO eviction.
pub struct CacheStore<T> {
    entries: LruCache<CacheKey, CachedPage<T>>,
}

impl<T> CacheStore<T> {
    /// Create a store holding at most `capacity` pages. Zero is clamped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    pub fn get(&self, query: &str, page: u32) -> Option<&CachedPage<T>> {
        self.entries.peek(&CacheKey::new(query, page))
    }

    pub fn has(&self, query: &str, page: u32) -> bool {
        self.entries.contains(&CacheKey::new(query, page))
    }

    /// Insert or overwrite the entry for `(query, page)`, stamping it with the
    /// current time. Returns the key evicted to stay within capacity, if any.
    pub fn put(
        &mut self,
        query: &str,
        page: u32,
        items: Vec<T>,
        total_pages: u32,
    ) -> Option<CacheKey> {
        let key = CacheKey::new(query, page);
        let entry = CachedPage {
            query: query.to_string(),
            page,
            items,
            total_pages,
            timestamp: Instant::now(),
        };

        let displaced = self.entries.push(key.clone(), entry);
        match displaced {
            Some((displaced_key, _)) if displaced_key != key => {
                counter!(METRIC_CACHE_EVICT).increment(1);
                debug!(evicted = %displaced_key, inserted = %key, "Evicted oldest cached page");
                Some(displaced_key)
            }
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ascending page numbers cached for `query`.
    pub fn cached_pages_for(&self, query: &str) -> Vec<u32> {
        let mut pages: Vec<u32> = self
            .entries
            .iter()
            .filter(|(key, _)| key.query == query)
            .map(|(key, _)| key.page)
            .collect();
        pages.sort_unstable();
        pages
    }
}
