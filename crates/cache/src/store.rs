//! The [`CacheStore`] back-end trait and the default in-memory store.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::CacheError;

/// Pluggable cache back end storing string values under string keys.
///
/// Values are opaque to the store; [`crate::TypedCache`] layers a JSON codec
/// on top. Implementations must be safe to share across tasks.
#[async_trait]
pub trait CacheStore: Send + Sync + 'static {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    async fn remove(&self, key: &str) -> Result<(), CacheError>;

    /// Remove every entry whose key starts with `prefix`.
    async fn remove_by_prefix(&self, prefix: &str) -> Result<(), CacheError>;

    async fn clear(&self) -> Result<(), CacheError>;
}

/// In-process store backed by `DashMap`.
///
/// Each entry stores `(value, inserted_at, ttl)` and is lazily evicted on access.
/// Stands in for a distributed cache in development and tests.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<DashMap<String, (String, Instant, Duration)>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[async_trait]
impl CacheStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        if let Some(entry) = self.inner.get(key) {
            let (val, inserted, ttl) = entry.value();
            if inserted.elapsed() < *ttl {
                return Ok(Some(val.clone()));
            }
            // Expired: drop the read guard before removing.
            drop(entry);
            self.inner.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        self.inner
            .insert(key.to_string(), (value, Instant::now(), ttl));
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        self.inner.remove(key);
        Ok(())
    }

    async fn remove_by_prefix(&self, prefix: &str) -> Result<(), CacheError> {
        self.inner.retain(|k, _| !k.starts_with(prefix));
        Ok(())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.inner.clear();
        Ok(())
    }
}
