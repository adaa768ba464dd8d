//! Caching building blocks: pluggable stores, a near cache, a typed JSON
//! layer, and the read-through / write-through / write-behind strategies.
//!
//! ```text
//! CachedRepository ── TypedCache ── CacheStore
//!        │                             ├── InMemoryStore
//!        │                             ├── RedisStore
//!        │                             └── NearCache (LocalCache + any CacheStore)
//!        ├── CacheLoader   (read path)
//!        └── CacheWriter   (write path, direct or via WriteBehindQueue)
//! ```

pub mod error;
pub mod local;
pub mod near;
pub mod redis_store;
pub mod store;
pub mod strategy;
pub mod typed;
pub mod write_behind;

pub use error::CacheError;
pub use local::LocalCache;
pub use near::NearCache;
pub use redis_store::RedisStore;
pub use store::{CacheStore, InMemoryStore};
pub use strategy::{CacheLoader, CacheStrategy, CacheWriter, CachedRepository};
pub use typed::TypedCache;
pub use write_behind::{WriteBehindConfig, WriteBehindQueue, WriteOp};
