//! Bounded in-process TTL cache, used as the front tier of [`crate::NearCache`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

#[derive(Clone)]
struct Entry {
    value: String,
    inserted: Instant,
    ttl: Duration,
}

impl Entry {
    fn is_live(&self) -> bool {
        self.inserted.elapsed() < self.ttl
    }
}

/// A thread-safe TTL cache backed by `DashMap` with a maximum entry count.
///
/// Entries expire after their TTL and are lazily evicted on access. When the
/// cache is full, expired entries are purged first; if that frees nothing,
/// the oldest entry is dropped.
#[derive(Clone)]
pub struct LocalCache {
    inner: Arc<DashMap<String, Entry>>,
    ttl: Duration,
    max_entries: usize,
}

impl LocalCache {
    /// Create a cache. `max_entries` is floored at 1.
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    /// Default time-to-live applied by [`LocalCache::insert`].
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get a cached value if it exists and hasn't expired.
    pub fn get(&self, key: &str) -> Option<String> {
        if let Some(entry) = self.inner.get(key) {
            if entry.is_live() {
                return Some(entry.value.clone());
            }
            drop(entry);
            self.inner.remove(key);
        }
        None
    }

    /// Insert with the cache's default TTL.
    pub fn insert(&self, key: &str, value: String) {
        self.insert_with_ttl(key, value, self.ttl);
    }

    /// Insert with `min(ttl, default TTL)`, so the local tier never outlives
    /// its configured staleness bound.
    pub fn insert_with_ttl(&self, key: &str, value: String, ttl: Duration) {
        if !self.inner.contains_key(key) && self.inner.len() >= self.max_entries {
            self.make_room();
        }
        self.inner.insert(
            key.to_string(),
            Entry {
                value,
                inserted: Instant::now(),
                ttl: ttl.min(self.ttl),
            },
        );
    }

    pub fn remove(&self, key: &str) {
        self.inner.remove(key);
    }

    pub fn remove_by_prefix(&self, prefix: &str) {
        self.inner.retain(|k, _| !k.starts_with(prefix));
    }

    pub fn clear(&self) {
        self.inner.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Remove all expired entries.
    pub fn evict_expired(&self) {
        self.inner.retain(|_, entry| entry.is_live());
    }

    fn make_room(&self) {
        self.evict_expired();
        if self.inner.len() < self.max_entries {
            return;
        }

        let oldest = self
            .inner
            .iter()
            .min_by_key(|e| e.value().inserted)
            .map(|e| e.key().clone());
        if let Some(key) = oldest {
            self.inner.remove(&key);
        }
    }
}
