//! Two-tier cache: a bounded in-process tier in front of a shared store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::CacheError;
use crate::local::LocalCache;
use crate::store::CacheStore;

/// A [`LocalCache`] in front of any remote [`CacheStore`].
///
/// Reads are served locally when possible and fall back to the remote tier,
/// populating the local tier on a remote hit. Writes and invalidations go to
/// the remote tier first, then the local one. Other instances are not
/// notified of invalidations; their local copies expire after the local TTL.
#[derive(Clone)]
pub struct NearCache {
    local: LocalCache,
    remote: Arc<dyn CacheStore>,
}

impl NearCache {
    pub fn new(remote: Arc<dyn CacheStore>, local_ttl: Duration, local_max_entries: usize) -> Self {
        Self {
            local: LocalCache::new(local_ttl, local_max_entries),
            remote,
        }
    }

    /// The in-process tier, exposed for diagnostics and tests.
    pub fn local(&self) -> &LocalCache {
        &self.local
    }
}

#[async_trait]
impl CacheStore for NearCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        if let Some(value) = self.local.get(key) {
            tracing::trace!(key, "Near cache local hit");
            return Ok(Some(value));
        }

        let value = self.remote.get(key).await?;
        if let Some(value) = &value {
            self.local.insert(key, value.clone());
        }
        Ok(value)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        if let Err(e) = self.remote.set(key, value.clone(), ttl).await {
            // Never keep a local copy the remote tier does not have.
            self.local.remove(key);
            return Err(e);
        }
        self.local.insert_with_ttl(key, value, ttl);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        self.local.remove(key);
        self.remote.remove(key).await
    }

    async fn remove_by_prefix(&self, prefix: &str) -> Result<(), CacheError> {
        self.local.remove_by_prefix(prefix);
        self.remote.remove_by_prefix(prefix).await
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.local.clear();
        self.remote.clear().await
    }
}
