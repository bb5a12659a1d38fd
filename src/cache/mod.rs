//! Page cache for the remote loader.
//!
//! Holds previously fetched pages keyed by `(query, page)`:
//!
//! - bounded by the loader's `cache_pages` option
//! - evicts the oldest insertion first, never by access recency
//! - purely in-memory and scoped to one loader instance

mod keys;
mod store;

pub use keys::CacheKey;
pub use store::{CacheStore, CachedPage};

pub(crate) use store::METRIC_CACHE_EVICT;
