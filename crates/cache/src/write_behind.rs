//! Asynchronous, batched persistence for the write-behind strategy.
//!
//! Writes are acknowledged as soon as they are cached and queued. A flusher
//! task drains the queue into the [`CacheWriter`] in batches, either when a
//! batch fills up or when the flush interval elapses.
//!
//! Deletes that have not reached the writer yet are tracked per key, so
//! readers can tell a queued delete apart from a row that still exists.

use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::CacheError;
use crate::strategy::CacheWriter;

/// `tokio::time::interval` rejects a zero period.
const MIN_FLUSH_INTERVAL: Duration = Duration::from_millis(1);

/// A pending write.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp<K, V> {
    Upsert(K, V),
    Delete(K),
}

/// Tuning knobs for the flusher.
#[derive(Debug, Clone)]
pub struct WriteBehindConfig {
    /// Flush as soon as this many operations are pending.
    pub batch_size: usize,
    /// Flush whatever is pending at least this often.
    pub flush_interval: Duration,
    /// Additional attempts after a failed flush before the batch is dropped.
    pub max_retries: u32,
    /// Pause between flush attempts.
    pub retry_delay: Duration,
    /// Queue capacity; producers wait when it is full.
    pub capacity: usize,
}

impl Default for WriteBehindConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            flush_interval: Duration::from_secs(1),
            max_retries: 3,
            retry_delay: Duration::from_millis(200),
            capacity: 10_000,
        }
    }
}

/// Keys with a queued delete, mapped to the sequence number of the latest one.
struct PendingDeletes<K> {
    keys: DashMap<K, u64>,
    next_seq: AtomicU64,
}

impl<K: Eq + Hash> PendingDeletes<K> {
    fn new() -> Self {
        Self {
            keys: DashMap::new(),
            next_seq: AtomicU64::new(0),
        }
    }

    fn mark(&self, key: K) -> u64 {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.keys.insert(key, seq);
        seq
    }

    /// Clear the marker unless a newer delete of the same key replaced it.
    fn settle(&self, key: &K, seq: u64) {
        self.keys.remove_if(key, |_, latest| *latest == seq);
    }
}

/// An operation on its way to the flusher. `seq` tags deletes.
struct Queued<K, V> {
    op: WriteOp<K, V>,
    seq: Option<u64>,
}

/// Producer side of the write-behind queue. Cheap to clone.
pub struct WriteBehindQueue<K, V> {
    sender: mpsc::Sender<Queued<K, V>>,
    pending: Arc<PendingDeletes<K>>,
}

impl<K, V> Clone for WriteBehindQueue<K, V> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            pending: Arc::clone(&self.pending),
        }
    }
}

impl<K, V> WriteBehindQueue<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Start the flusher task and return the queue feeding it.
    ///
    /// The task runs until `cancel` fires or every queue handle is dropped;
    /// either way it flushes what is still pending before exiting.
    pub fn spawn(
        name: impl Into<String>,
        writer: Arc<dyn CacheWriter<K, V>>,
        config: WriteBehindConfig,
        cancel: CancellationToken,
    ) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(config.capacity.max(1));
        let pending = Arc::new(PendingDeletes::new());
        let flusher = Flusher {
            name: name.into(),
            writer,
            pending: Arc::clone(&pending),
            config,
        };
        let handle = tokio::spawn(flusher.run(receiver, cancel));
        (Self { sender, pending }, handle)
    }

    /// Queue `op`. An upsert supersedes any delete of the same key that is
    /// still queued.
    pub async fn enqueue(&self, op: WriteOp<K, V>) -> Result<(), CacheError> {
        let seq = match &op {
            WriteOp::Upsert(key, _) => {
                self.pending.keys.remove(key);
                None
            }
            WriteOp::Delete(key) => Some(self.pending.mark(key.clone())),
        };

        if let Err(mpsc::error::SendError(rejected)) = self.sender.send(Queued { op, seq }).await {
            if let (WriteOp::Delete(key), Some(seq)) = (&rejected.op, rejected.seq) {
                self.pending.settle(key, seq);
            }
            return Err(CacheError::QueueClosed);
        }
        Ok(())
    }

    /// Whether a delete of `key` is queued but not yet flushed.
    pub fn is_delete_pending(&self, key: &K) -> bool {
        self.pending.keys.contains_key(key)
    }
}

struct Flusher<K, V> {
    name: String,
    writer: Arc<dyn CacheWriter<K, V>>,
    pending: Arc<PendingDeletes<K>>,
    config: WriteBehindConfig,
}

impl<K, V> Flusher<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    async fn run(self, mut receiver: mpsc::Receiver<Queued<K, V>>, cancel: CancellationToken) {
        let batch_size = self.config.batch_size.max(1);
        let flush_interval = self.config.flush_interval.max(MIN_FLUSH_INTERVAL);
        let mut batch: Vec<Queued<K, V>> = Vec::with_capacity(batch_size);
        let mut interval = tokio::time::interval(flush_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately.
        interval.tick().await;

        tracing::info!(
            cache = %self.name,
            batch_size,
            flush_interval_ms = flush_interval.as_millis() as u64,
            "Write-behind flusher started"
        );

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    receiver.close();
                    while let Ok(queued) = receiver.try_recv() {
                        batch.push(queued);
                    }
                    self.flush(&mut batch).await;
                    break;
                }
                maybe_queued = receiver.recv() => match maybe_queued {
                    Some(queued) => {
                        batch.push(queued);
                        if batch.len() >= batch_size {
                            self.flush(&mut batch).await;
                        }
                    }
                    None => {
                        self.flush(&mut batch).await;
                        break;
                    }
                },
                _ = interval.tick() => {
                    self.flush(&mut batch).await;
                }
            }
        }

        tracing::info!(cache = %self.name, "Write-behind flusher stopped");
    }

    /// Flush `batch`, retrying the whole batch on failure. Writers must be
    /// idempotent because a retried batch may have partially succeeded.
    ///
    /// Delete markers are cleared afterwards whatever the outcome: once a
    /// batch is dropped the source is authoritative again.
    async fn flush(&self, batch: &mut Vec<Queued<K, V>>) {
        if batch.is_empty() {
            return;
        }

        let queued = std::mem::take(batch);
        let ops: Vec<WriteOp<K, V>> = queued.iter().map(|q| q.op.clone()).collect();
        self.apply_with_retries(&ops).await;

        for q in &queued {
            if let (WriteOp::Delete(key), Some(seq)) = (&q.op, q.seq) {
                self.pending.settle(key, seq);
            }
        }
    }

    async fn apply_with_retries(&self, ops: &[WriteOp<K, V>]) {
        let attempts = self.config.max_retries + 1;

        for attempt in 1..=attempts {
            match apply(self.writer.as_ref(), ops).await {
                Ok(()) => {
                    tracing::debug!(cache = %self.name, ops = ops.len(), attempt, "Write-behind batch flushed");
                    return;
                }
                Err(e) if attempt < attempts => {
                    tracing::warn!(cache = %self.name, error = %e, attempt, "Write-behind flush failed, retrying");
                    tokio::time::sleep(self.config.retry_delay).await;
                }
                Err(e) => {
                    tracing::error!(
                        cache = %self.name,
                        error = %e,
                        dropped = ops.len(),
                        "Write-behind flush failed, dropping batch"
                    );
                }
            }
        }
    }
}

/// Apply operations in order, grouping consecutive upserts into one batch write.
async fn apply<K, V>(writer: &dyn CacheWriter<K, V>, ops: &[WriteOp<K, V>]) -> Result<(), CacheError>
where
    K: Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    let mut upserts: Vec<(K, V)> = Vec::new();
    for op in ops {
        match op {
            WriteOp::Upsert(k, v) => upserts.push((k.clone(), v.clone())),
            WriteOp::Delete(k) => {
                if !upserts.is_empty() {
                    writer.write_batch(&upserts).await?;
                    upserts.clear();
                }
                writer.delete(k).await?;
            }
        }
    }
    if !upserts.is_empty() {
        writer.write_batch(&upserts).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    /// Records every call; fails the first `failures` calls.
    #[derive(Default)]
    struct RecordingWriter {
        calls: Mutex<Vec<String>>,
        failures: AtomicU32,
    }

    impl RecordingWriter {
        fn failing(times: u32) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                failures: AtomicU32::new(times),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn maybe_fail(&self) -> Result<(), CacheError> {
            let remaining = self.failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures.store(remaining - 1, Ordering::SeqCst);
                return Err(CacheError::QueueClosed);
            }
            Ok(())
        }
    }

    #[async_trait]
    impl CacheWriter<u32, String> for RecordingWriter {
        async fn write(&self, key: &u32, value: &String) -> Result<(), CacheError> {
            self.maybe_fail()?;
            self.calls.lock().unwrap().push(format!("write {key}={value}"));
            Ok(())
        }

        async fn write_batch(&self, entries: &[(u32, String)]) -> Result<(), CacheError> {
            self.maybe_fail()?;
            let keys: Vec<String> = entries.iter().map(|(k, _)| k.to_string()).collect();
            self.calls
                .lock()
                .unwrap()
                .push(format!("batch {}", keys.join(",")));
            Ok(())
        }

        async fn delete(&self, key: &u32) -> Result<(), CacheError> {
            self.maybe_fail()?;
            self.calls.lock().unwrap().push(format!("delete {key}"));
            Ok(())
        }
    }

    fn config(batch_size: usize, flush_interval: Duration) -> WriteBehindConfig {
        WriteBehindConfig {
            batch_size,
            flush_interval,
            max_retries: 2,
            retry_delay: Duration::from_millis(5),
            capacity: 100,
        }
    }

    async fn wait_for_calls(writer: &RecordingWriter, n: usize) {
        for _ in 0..200 {
            if writer.calls().len() >= n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("expected {n} writer calls, got {:?}", writer.calls());
    }

    #[tokio::test]
    async fn full_batch_flushes_without_waiting_for_interval() {
        let writer = Arc::new(RecordingWriter::default());
        let cancel = CancellationToken::new();
        let (queue, _handle) = WriteBehindQueue::<u32, String>::spawn(
            "test",
            writer.clone(),
            config(3, Duration::from_secs(3600)),
            cancel.clone(),
        );

        for k in 1..=3 {
            queue.enqueue(WriteOp::Upsert(k, format!("v{k}"))).await.unwrap();
        }

        wait_for_calls(&writer, 1).await;
        assert_eq!(writer.calls(), vec!["batch 1,2,3"]);
        cancel.cancel();
    }

    #[tokio::test]
    async fn interval_flushes_partial_batches() {
        let writer = Arc::new(RecordingWriter::default());
        let cancel = CancellationToken::new();
        let (queue, _handle) = WriteBehindQueue::<u32, String>::spawn(
            "test",
            writer.clone(),
            config(100, Duration::from_millis(20)),
            cancel.clone(),
        );

        queue.enqueue(WriteOp::Upsert(1, "a".into())).await.unwrap();

        wait_for_calls(&writer, 1).await;
        assert_eq!(writer.calls(), vec!["batch 1"]);
        cancel.cancel();
    }

    #[tokio::test]
    async fn cancellation_drains_pending_operations() {
        let writer = Arc::new(RecordingWriter::default());
        let cancel = CancellationToken::new();
        let (queue, handle) = WriteBehindQueue::<u32, String>::spawn(
            "test",
            writer.clone(),
            config(100, Duration::from_secs(3600)),
            cancel.clone(),
        );

        queue.enqueue(WriteOp::Upsert(1, "a".into())).await.unwrap();
        queue.enqueue(WriteOp::Upsert(2, "b".into())).await.unwrap();
        cancel.cancel();
        handle.await.unwrap();

        assert_eq!(writer.calls(), vec!["batch 1,2"]);
        assert!(matches!(
            queue.enqueue(WriteOp::Delete(1)).await,
            Err(CacheError::QueueClosed)
        ));
    }

    #[tokio::test]
    async fn operations_keep_their_order_around_deletes() {
        let writer = Arc::new(RecordingWriter::default());
        let cancel = CancellationToken::new();
        let (queue, handle) = WriteBehindQueue::<u32, String>::spawn(
            "test",
            writer.clone(),
            config(100, Duration::from_secs(3600)),
            cancel.clone(),
        );

        queue.enqueue(WriteOp::Upsert(1, "a".into())).await.unwrap();
        queue.enqueue(WriteOp::Delete(1)).await.unwrap();
        queue.enqueue(WriteOp::Upsert(2, "b".into())).await.unwrap();
        cancel.cancel();
        handle.await.unwrap();

        assert_eq!(writer.calls(), vec!["batch 1", "delete 1", "batch 2"]);
    }

    #[tokio::test]
    async fn failed_flush_is_retried() {
        let writer = Arc::new(RecordingWriter::failing(2));
        let cancel = CancellationToken::new();
        let (queue, handle) = WriteBehindQueue::<u32, String>::spawn(
            "test",
            writer.clone(),
            config(100, Duration::from_secs(3600)),
            cancel.clone(),
        );

        queue.enqueue(WriteOp::Upsert(7, "x".into())).await.unwrap();
        cancel.cancel();
        handle.await.unwrap();

        assert_eq!(writer.calls(), vec!["batch 7"]);
    }

    #[tokio::test]
    async fn batch_is_dropped_after_retries_are_exhausted() {
        let writer = Arc::new(RecordingWriter::failing(10));
        let cancel = CancellationToken::new();
        let (queue, handle) = WriteBehindQueue::<u32, String>::spawn(
            "test",
            writer.clone(),
            config(100, Duration::from_secs(3600)),
            cancel.clone(),
        );

        queue.enqueue(WriteOp::Upsert(7, "x".into())).await.unwrap();
        cancel.cancel();
        handle.await.unwrap();

        assert!(writer.calls().is_empty());
        // 1 attempt + 2 retries consumed three of the ten failures.
        assert_eq!(writer.failures.load(Ordering::SeqCst), 7);
    }

    #[tokio::test]
    async fn dropping_every_queue_handle_stops_the_flusher() {
        let writer = Arc::new(RecordingWriter::default());
        let (queue, handle) = WriteBehindQueue::<u32, String>::spawn(
            "test",
            writer.clone(),
            config(100, Duration::from_secs(3600)),
            CancellationToken::new(),
        );

        queue.enqueue(WriteOp::Upsert(3, "c".into())).await.unwrap();
        drop(queue);
        handle.await.unwrap();

        assert_eq!(writer.calls(), vec!["batch 3"]);
    }

    #[tokio::test]
    async fn queued_delete_is_pending_until_flushed() {
        let writer = Arc::new(RecordingWriter::default());
        let cancel = CancellationToken::new();
        let (queue, handle) = WriteBehindQueue::<u32, String>::spawn(
            "test",
            writer.clone(),
            config(100, Duration::from_secs(3600)),
            cancel.clone(),
        );

        queue.enqueue(WriteOp::Delete(4)).await.unwrap();
        assert!(queue.is_delete_pending(&4));
        assert!(!queue.is_delete_pending(&5));

        cancel.cancel();
        handle.await.unwrap();

        assert_eq!(writer.calls(), vec!["delete 4"]);
        assert!(!queue.is_delete_pending(&4));
    }

    #[tokio::test]
    async fn upsert_after_delete_clears_the_pending_delete() {
        let writer = Arc::new(RecordingWriter::default());
        let cancel = CancellationToken::new();
        let (queue, _handle) = WriteBehindQueue::<u32, String>::spawn(
            "test",
            writer.clone(),
            config(100, Duration::from_secs(3600)),
            cancel.clone(),
        );

        queue.enqueue(WriteOp::Delete(4)).await.unwrap();
        queue.enqueue(WriteOp::Upsert(4, "back".into())).await.unwrap();

        assert!(!queue.is_delete_pending(&4));
        cancel.cancel();
    }

    #[tokio::test]
    async fn dropped_batch_clears_pending_deletes() {
        let writer = Arc::new(RecordingWriter::failing(10));
        let cancel = CancellationToken::new();
        let (queue, handle) = WriteBehindQueue::<u32, String>::spawn(
            "test",
            writer.clone(),
            config(100, Duration::from_secs(3600)),
            cancel.clone(),
        );

        queue.enqueue(WriteOp::Delete(4)).await.unwrap();
        cancel.cancel();
        handle.await.unwrap();

        assert!(writer.calls().is_empty());
        assert!(!queue.is_delete_pending(&4));
    }

    #[tokio::test]
    async fn zero_flush_interval_does_not_kill_the_flusher() {
        let writer = Arc::new(RecordingWriter::default());
        let cancel = CancellationToken::new();
        let (queue, handle) = WriteBehindQueue::<u32, String>::spawn(
            "test",
            writer.clone(),
            config(100, Duration::ZERO),
            cancel.clone(),
        );

        queue.enqueue(WriteOp::Upsert(1, "a".into())).await.unwrap();
        wait_for_calls(&writer, 1).await;
        assert_eq!(writer.calls(), vec!["batch 1"]);

        cancel.cancel();
        handle.await.unwrap();
    }
}
