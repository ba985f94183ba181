//! Response caching layer
//!
//! Memoizes idempotent read responses with a per-entry TTL using Moka.
//! Values cross the cache as JSON so one store can hold every response type.

pub mod key;

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use moka::sync::Cache as MokaCache;
use moka::Expiry;
use serde_json::Value;
use tracing::trace;

pub use key::{CacheKeyBuilder, CachedOperation};

/// Key-value store with per-entry expiration.
///
/// An expired entry behaves exactly like a missing one; callers cannot tell
/// "never set" from "expired". A store that cannot answer must report a
/// miss, never an error.
pub trait Cache: Send + Sync {
    /// The stored value, if present and not yet expired
    fn get(&self, key: &str) -> Option<Value>;

    /// Store `value` under `key` for `ttl`, replacing any prior entry
    /// and its remaining lifetime unconditionally.
    fn set(&self, key: &str, value: Value, ttl: Duration);
}

/// Cached value plus the lifetime chosen when it was stored.
#[derive(Clone, Debug)]
struct CacheEntry {
    value: Value,
    ttl: Duration,
}

/// Reads each entry's TTL back out of the entry itself, on insert and on
/// overwrite, so `set` always restarts the clock.
struct PerEntryTtl;

impl Expiry<String, CacheEntry> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &CacheEntry,
        _updated_at: Instant,
        _remaining: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// In-memory TTL cache backed by Moka.
///
/// Expiration is lazy; entries past their TTL simply stop being returned.
/// There is no size bound and no eviction beyond expiry.
pub struct InMemoryCache {
    entries: MokaCache<String, CacheEntry>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl InMemoryCache {
    pub fn new() -> Self {
        let entries = MokaCache::builder()
            .expire_after(PerEntryTtl)
            .name("response_cache")
            .build();

        Self {
            entries,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Cache statistics: (hits, misses)
    pub fn stats(&self) -> (u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl Cache for InMemoryCache {
    fn get(&self, key: &str) -> Option<Value> {
        match self.entries.get(key) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                trace!(key = key, "cache HIT");
                Some(entry.value)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                trace!(key = key, "cache MISS");
                None
            }
        }
    }

    fn set(&self, key: &str, value: Value, ttl: Duration) {
        self.entries
            .insert(key.to_string(), CacheEntry { value, ttl });
        trace!(key = key, ttl_ms = ttl.as_millis() as u64, "cached response");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn get_returns_stored_value() {
        let cache = InMemoryCache::new();
        assert!(cache.get("k").is_none());

        cache.set("k", json!({"name": "A_NAME"}), Duration::from_secs(60));
        assert_eq!(cache.get("k"), Some(json!({"name": "A_NAME"})));

        let (hits, misses) = cache.stats();
        assert_eq!(hits, 1);
        assert_eq!(misses, 1);
    }

    #[test]
    fn expired_entry_behaves_as_absent() {
        let cache = InMemoryCache::new();
        cache.set("k", json!(1), Duration::from_millis(5));
        std::thread::sleep(Duration::from_millis(30));
        assert!(cache.get("k").is_none());
    }

    #[test]
    fn set_replaces_value_and_restarts_ttl() {
        let cache = InMemoryCache::new();
        cache.set("k", json!("old"), Duration::from_millis(5));
        cache.set("k", json!("new"), Duration::from_secs(60));
        std::thread::sleep(Duration::from_millis(30));
        // The second set's TTL governs, not the first's.
        assert_eq!(cache.get("k"), Some(json!("new")));
    }

    #[test]
    fn keys_are_independent() {
        let cache = InMemoryCache::new();
        cache.set("a", json!(1), Duration::from_secs(60));
        cache.set("b", json!(2), Duration::from_secs(60));
        assert_eq!(cache.get("a"), Some(json!(1)));
        assert_eq!(cache.get("b"), Some(json!(2)));
    }
}
