//! Repository-backed loaders and writers, and the named caches built on them.
//!
//! | Cache       | Key          | Strategy                         |
//! |-------------|--------------|----------------------------------|
//! | `customers` | customer id  | write-through                    |
//! | `countries` | country code | read-through over a near cache   |
//! | `comments`  | comment id   | write-behind, batched inserts    |

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use workshop_cache::{
    CacheError, CacheLoader, CacheStore, CacheWriter, CachedRepository, NearCache, TypedCache,
    WriteBehindQueue,
};
use workshop_core::types::DbId;
use workshop_db::models::comment::Comment;
use workshop_db::models::country::Country;
use workshop_db::models::customer::Customer;
use workshop_db::repositories::{CommentRepo, CountryRepo, CustomerRepo};
use workshop_db::DbPool;

use crate::config::CacheConfig;

pub const CUSTOMERS: &str = "customers";
pub const COUNTRIES: &str = "countries";
pub const COMMENTS: &str = "comments";

// ---------------------------------------------------------------------------
// Customers
// ---------------------------------------------------------------------------

pub struct CustomerSource {
    pool: DbPool,
}

#[async_trait]
impl CacheLoader<DbId, Customer> for CustomerSource {
    async fn load(&self, id: &DbId) -> Result<Option<Customer>, CacheError> {
        CustomerRepo::find_by_id(&self.pool, *id)
            .await
            .map_err(CacheError::source)
    }
}

#[async_trait]
impl CacheWriter<DbId, Customer> for CustomerSource {
    async fn write(&self, _id: &DbId, customer: &Customer) -> Result<(), CacheError> {
        CustomerRepo::upsert(&self.pool, customer)
            .await
            .map_err(CacheError::source)?;
        Ok(())
    }

    async fn write_batch(&self, entries: &[(DbId, Customer)]) -> Result<(), CacheError> {
        let mut tx = self.pool.begin().await.map_err(CacheError::source)?;
        for (_, customer) in entries {
            CustomerRepo::upsert(&mut *tx, customer)
                .await
                .map_err(CacheError::source)?;
        }
        tx.commit().await.map_err(CacheError::source)
    }

    async fn delete(&self, id: &DbId) -> Result<(), CacheError> {
        CustomerRepo::delete(&self.pool, *id)
            .await
            .map_err(CacheError::source)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Countries
// ---------------------------------------------------------------------------

pub struct CountrySource {
    pool: DbPool,
}

#[async_trait]
impl CacheLoader<String, Country> for CountrySource {
    async fn load(&self, code: &String) -> Result<Option<Country>, CacheError> {
        CountryRepo::find_by_code(&self.pool, code)
            .await
            .map_err(CacheError::source)
    }
}

#[async_trait]
impl CacheWriter<String, Country> for CountrySource {
    async fn write(&self, _code: &String, country: &Country) -> Result<(), CacheError> {
        CountryRepo::upsert(&self.pool, country)
            .await
            .map_err(CacheError::source)?;
        Ok(())
    }

    async fn write_batch(&self, entries: &[(String, Country)]) -> Result<(), CacheError> {
        let mut tx = self.pool.begin().await.map_err(CacheError::source)?;
        for (_, country) in entries {
            CountryRepo::upsert(&mut *tx, country)
                .await
                .map_err(CacheError::source)?;
        }
        tx.commit().await.map_err(CacheError::source)
    }

    async fn delete(&self, code: &String) -> Result<(), CacheError> {
        CountryRepo::delete(&self.pool, code)
            .await
            .map_err(CacheError::source)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------------

pub struct CommentSource {
    pool: DbPool,
}

#[async_trait]
impl CacheLoader<Uuid, Comment> for CommentSource {
    async fn load(&self, id: &Uuid) -> Result<Option<Comment>, CacheError> {
        CommentRepo::find_by_id(&self.pool, *id)
            .await
            .map_err(CacheError::source)
    }
}

#[async_trait]
impl CacheWriter<Uuid, Comment> for CommentSource {
    async fn write(&self, _id: &Uuid, comment: &Comment) -> Result<(), CacheError> {
        CommentRepo::insert_batch(&self.pool, std::slice::from_ref(comment))
            .await
            .map_err(CacheError::source)?;
        Ok(())
    }

    async fn write_batch(&self, entries: &[(Uuid, Comment)]) -> Result<(), CacheError> {
        let comments: Vec<Comment> = entries.iter().map(|(_, c)| c.clone()).collect();
        let inserted = CommentRepo::insert_batch(&self.pool, &comments)
            .await
            .map_err(CacheError::source)?;
        if inserted < comments.len() as u64 {
            tracing::debug!(
                queued = comments.len(),
                inserted,
                "Skipped comments that already exist or whose post was deleted"
            );
        }
        Ok(())
    }

    async fn delete(&self, id: &Uuid) -> Result<(), CacheError> {
        CommentRepo::delete(&self.pool, *id)
            .await
            .map_err(CacheError::source)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Named caches
// ---------------------------------------------------------------------------

/// The named caches exposed to handlers.
#[derive(Clone)]
pub struct Caches {
    pub customers: CachedRepository<DbId, Customer>,
    pub countries: CachedRepository<String, Country>,
    pub comments: CachedRepository<Uuid, Comment>,
}

/// Background tasks owned by the caches.
pub struct CacheTasks {
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl CacheTasks {
    /// Stop the write-behind flushers, waiting up to `timeout` for pending
    /// writes to drain.
    pub async fn shutdown(self, timeout: Duration) {
        self.cancel.cancel();
        for handle in self.handles {
            if tokio::time::timeout(timeout, handle).await.is_err() {
                tracing::warn!("Write-behind flusher did not stop in time");
            }
        }
    }
}

impl Caches {
    /// Build every named cache over `store` and start the write-behind
    /// flusher. Must be called inside a tokio runtime.
    pub fn build(pool: DbPool, store: Arc<dyn CacheStore>, config: &CacheConfig) -> (Self, CacheTasks) {
        let cancel = CancellationToken::new();

        let customer_source = Arc::new(CustomerSource { pool: pool.clone() });
        let customers: CachedRepository<DbId, Customer> = CachedRepository::write_through(
            TypedCache::new(Arc::clone(&store), CUSTOMERS, config.ttl),
            customer_source.clone(),
            customer_source,
        );

        let near: Arc<dyn CacheStore> = Arc::new(NearCache::new(
            Arc::clone(&store),
            config.near_ttl,
            config.near_max_entries,
        ));
        let country_source = Arc::new(CountrySource { pool: pool.clone() });
        let countries: CachedRepository<String, Country> = CachedRepository::read_through(
            TypedCache::new(near, COUNTRIES, config.ttl),
            country_source.clone(),
            country_source,
        );

        let comment_source = Arc::new(CommentSource { pool });
        let (queue, flusher) = WriteBehindQueue::<Uuid, Comment>::spawn(
            COMMENTS,
            comment_source.clone(),
            config.write_behind.clone(),
            cancel.clone(),
        );
        let comments: CachedRepository<Uuid, Comment> = CachedRepository::write_behind(
            TypedCache::new(store, COMMENTS, config.ttl),
            comment_source,
            queue,
        );

        let caches = Self {
            customers,
            countries,
            comments,
        };
        let tasks = CacheTasks {
            cancel,
            handles: vec![flusher],
        };
        (caches, tasks)
    }

    /// Evict every entry of the cache called `name`.
    ///
    /// Returns `false` when no cache has that name.
    pub async fn evict(&self, name: &str) -> Result<bool, CacheError> {
        match name {
            CUSTOMERS => self.customers.evict_all().await?,
            COUNTRIES => self.countries.evict_all().await?,
            COMMENTS => self.comments.evict_all().await?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    pub fn names() -> [&'static str; 3] {
        [CUSTOMERS, COUNTRIES, COMMENTS]
    }
}
