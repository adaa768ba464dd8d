/// Errors raised by cache stores, codecs and strategies.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The Redis back end failed.
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// A value could not be encoded for storage.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The write-behind queue no longer accepts entries (shutdown).
    #[error("Write-behind queue is closed")]
    QueueClosed,

    /// A loader or writer failed. The original error is kept as the source
    /// so callers can recover it with `downcast`.
    #[error("Cache source error: {0}")]
    Source(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl CacheError {
    /// Wrap a loader/writer error.
    pub fn source<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        CacheError::Source(Box::new(err))
    }
}
