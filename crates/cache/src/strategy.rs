//! Cache strategies layered over a loader and an optional writer.
//!
//! - **Read-through**: misses are loaded from the source and cached.
//! - **Write-through**: writes go to the source first, then to the cache.
//! - **Write-behind**: writes go to the cache and are queued for the source.

use std::fmt::Display;
use std::hash::Hash;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CacheError;
use crate::typed::TypedCache;
use crate::write_behind::{WriteBehindQueue, WriteOp};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStrategy {
    ReadThrough,
    WriteThrough,
    WriteBehind,
}

impl CacheStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheStrategy::ReadThrough => "read_through",
            CacheStrategy::WriteThrough => "write_through",
            CacheStrategy::WriteBehind => "write_behind",
        }
    }
}

/// Loads a single value from the source of truth.
#[async_trait]
pub trait CacheLoader<K, V>: Send + Sync {
    async fn load(&self, key: &K) -> Result<Option<V>, CacheError>;
}

/// Persists values to the source of truth.
#[async_trait]
pub trait CacheWriter<K, V>: Send + Sync {
    async fn write(&self, key: &K, value: &V) -> Result<(), CacheError>;

    /// Persist several entries. Must be idempotent: a failed batch is
    /// retried as a whole.
    async fn write_batch(&self, entries: &[(K, V)]) -> Result<(), CacheError>;

    async fn delete(&self, key: &K) -> Result<(), CacheError>;
}

/// Where writes end up.
enum Sink<K, V> {
    Direct(Arc<dyn CacheWriter<K, V>>),
    Queued(WriteBehindQueue<K, V>),
}

impl<K, V> Clone for Sink<K, V> {
    fn clone(&self) -> Self {
        match self {
            Sink::Direct(writer) => Sink::Direct(Arc::clone(writer)),
            Sink::Queued(queue) => Sink::Queued(queue.clone()),
        }
    }
}

/// A cache in front of a data source, driven by one [`CacheStrategy`].
pub struct CachedRepository<K, V> {
    cache: TypedCache<V>,
    loader: Arc<dyn CacheLoader<K, V>>,
    sink: Sink<K, V>,
    strategy: CacheStrategy,
}

impl<K, V> Clone for CachedRepository<K, V> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            loader: Arc::clone(&self.loader),
            sink: self.sink.clone(),
            strategy: self.strategy,
        }
    }
}

impl<K, V> CachedRepository<K, V>
where
    K: Display + Eq + Hash + Clone + Send + Sync + 'static,
    V: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Cache reads only. `put` writes to the source and drops the cached copy.
    pub fn read_through(
        cache: TypedCache<V>,
        loader: Arc<dyn CacheLoader<K, V>>,
        writer: Arc<dyn CacheWriter<K, V>>,
    ) -> Self {
        Self {
            cache,
            loader,
            sink: Sink::Direct(writer),
            strategy: CacheStrategy::ReadThrough,
        }
    }

    pub fn write_through(
        cache: TypedCache<V>,
        loader: Arc<dyn CacheLoader<K, V>>,
        writer: Arc<dyn CacheWriter<K, V>>,
    ) -> Self {
        Self {
            cache,
            loader,
            sink: Sink::Direct(writer),
            strategy: CacheStrategy::WriteThrough,
        }
    }

    /// Writes are acknowledged once cached; `queue` persists them later.
    pub fn write_behind(
        cache: TypedCache<V>,
        loader: Arc<dyn CacheLoader<K, V>>,
        queue: WriteBehindQueue<K, V>,
    ) -> Self {
        Self {
            cache,
            loader,
            sink: Sink::Queued(queue),
            strategy: CacheStrategy::WriteBehind,
        }
    }

    pub fn strategy(&self) -> CacheStrategy {
        self.strategy
    }

    pub fn name(&self) -> &str {
        self.cache.name()
    }

    /// Return the cached value or load it from the source and cache it.
    ///
    /// A failing cache is logged and bypassed; only loader errors propagate.
    /// Under write-behind a key whose delete is still queued reads as absent,
    /// and nothing loaded while such a delete is queued gets cached.
    pub async fn get(&self, key: &K) -> Result<Option<V>, CacheError> {
        match self.cache.get(key).await {
            Ok(Some(value)) => {
                tracing::debug!(cache = self.name(), key = %key, "Cache hit");
                return Ok(Some(value));
            }
            Ok(None) => {
                tracing::debug!(cache = self.name(), key = %key, "Cache miss");
            }
            Err(e) => {
                tracing::warn!(cache = self.name(), key = %key, error = %e, "Cache read failed, loading from source");
            }
        }

        if self.is_delete_pending(key) {
            tracing::debug!(cache = self.name(), key = %key, "Delete pending, not loading");
            return Ok(None);
        }

        let Some(value) = self.loader.load(key).await? else {
            return Ok(None);
        };

        if self.is_delete_pending(key) {
            return Ok(None);
        }
        if let Err(e) = self.cache.set(key, &value).await {
            tracing::warn!(cache = self.name(), key = %key, error = %e, "Failed to populate cache");
        }
        Ok(Some(value))
    }

    fn is_delete_pending(&self, key: &K) -> bool {
        match &self.sink {
            Sink::Queued(queue) => queue.is_delete_pending(key),
            Sink::Direct(_) => false,
        }
    }

    /// Store `value` under `key` according to the strategy.
    pub async fn put(&self, key: &K, value: &V) -> Result<(), CacheError> {
        match &self.sink {
            Sink::Direct(writer) => {
                writer.write(key, value).await?;
                if self.strategy == CacheStrategy::WriteThrough {
                    self.cache.set(key, value).await
                } else {
                    self.cache.remove(key).await
                }
            }
            Sink::Queued(queue) => {
                self.cache.set(key, value).await?;
                queue
                    .enqueue(WriteOp::Upsert(key.clone(), value.clone()))
                    .await
            }
        }
    }

    /// Delete `key` from the source and the cache.
    ///
    /// Under write-behind the delete is queued behind earlier writes of the
    /// same key, so it cannot be overtaken by a pending upsert. Until it is
    /// flushed, [`get`](Self::get) reports the key as absent.
    pub async fn remove(&self, key: &K) -> Result<(), CacheError> {
        match &self.sink {
            Sink::Direct(writer) => writer.delete(key).await?,
            Sink::Queued(queue) => queue.enqueue(WriteOp::Delete(key.clone())).await?,
        }
        self.cache.remove(key).await
    }

    /// Cache a value that was just persisted elsewhere.
    pub async fn refresh(&self, key: &K, value: &V) -> Result<(), CacheError> {
        self.cache.set(key, value).await
    }

    pub async fn invalidate(&self, key: &K) -> Result<(), CacheError> {
        self.cache.remove(key).await
    }

    /// Drop every entry of this cache.
    pub async fn evict_all(&self) -> Result<(), CacheError> {
        tracing::info!(cache = self.name(), "Evicting all cache entries");
        self.cache.clear().await
    }
}
