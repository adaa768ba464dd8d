//! JSON codec and key namespace over a [`CacheStore`].

use std::fmt::Display;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CacheError;
use crate::store::CacheStore;

/// A named cache of `V` values stored as JSON under `{name}:{key}`.
pub struct TypedCache<V> {
    store: Arc<dyn CacheStore>,
    name: String,
    ttl: Duration,
    _marker: PhantomData<fn() -> V>,
}

impl<V> Clone for TypedCache<V> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            name: self.name.clone(),
            ttl: self.ttl,
            _marker: PhantomData,
        }
    }
}

impl<V> TypedCache<V>
where
    V: Serialize + DeserializeOwned + Send + Sync,
{
    pub fn new(store: Arc<dyn CacheStore>, name: impl Into<String>, ttl: Duration) -> Self {
        Self {
            store,
            name: name.into(),
            ttl,
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn key(&self, key: &impl Display) -> String {
        format!("{}:{key}", self.name)
    }

    /// Fetch and decode a value.
    ///
    /// An entry that no longer decodes (e.g. written by an older version of
    /// the type) is removed and reported as a miss.
    pub async fn get(&self, key: &impl Display) -> Result<Option<V>, CacheError> {
        let key = self.key(key);
        let Some(raw) = self.store.get(&key).await? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Dropping undecodable cache entry");
                self.store.remove(&key).await?;
                Ok(None)
            }
        }
    }

    pub async fn set(&self, key: &impl Display, value: &V) -> Result<(), CacheError> {
        let raw = serde_json::to_string(value)?;
        self.store.set(&self.key(key), raw, self.ttl).await
    }

    pub async fn remove(&self, key: &impl Display) -> Result<(), CacheError> {
        self.store.remove(&self.key(key)).await
    }

    /// Remove every entry of this cache, leaving other caches in the store alone.
    pub async fn clear(&self) -> Result<(), CacheError> {
        self.store.remove_by_prefix(&format!("{}:", self.name)).await
    }
}
