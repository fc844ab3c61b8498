//! Handoff of assembled chunks to the downstream consumer
//!
//! Request handlers are the only producers; a single consumer task drains the queue.
//! The queue is bounded, and [`QueueFullPolicy`] decides what a handler does when the
//! consumer falls behind.

use crate::config::{QueueConfig, QueueFullPolicy};
use crate::error::{Error, Result};
use crate::types::Chunk;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::SendTimeoutError, error::TrySendError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Receiving half of the handoff queue
pub type ChunkReceiver = mpsc::Receiver<Chunk>;

/// Producer half of the handoff queue, cloned into every request handler
#[derive(Debug, Clone)]
pub struct ChunkSender {
    tx: mpsc::Sender<Chunk>,
    policy: QueueFullPolicy,
}

/// Create the bounded handoff queue
pub fn chunk_queue(config: &QueueConfig) -> (ChunkSender, ChunkReceiver) {
    let (tx, rx) = mpsc::channel(config.capacity.max(1));
    (
        ChunkSender {
            tx,
            policy: config.full_policy,
        },
        rx,
    )
}

impl ChunkSender {
    /// Queue a chunk for the consumer
    ///
    /// Never waits for the consumer to process the chunk. Under
    /// [`QueueFullPolicy::Reject`] it does not wait at all; under
    /// [`QueueFullPolicy::Wait`] it waits at most the configured timeout for a free slot.
    ///
    /// # Errors
    ///
    /// - [`Error::QueueFull`] when no slot became available
    /// - [`Error::QueueClosed`] when the consumer has stopped
    pub async fn dispatch(&self, chunk: Chunk) -> Result<()> {
        match self.policy.timeout() {
            None => self.tx.try_send(chunk).map_err(|e| match e {
                TrySendError::Full(_) => Error::QueueFull,
                TrySendError::Closed(_) => Error::QueueClosed,
            }),
            Some(timeout) => self
                .tx
                .send_timeout(chunk, timeout)
                .await
                .map_err(|e| match e {
                    SendTimeoutError::Timeout(_) => Error::QueueFull,
                    SendTimeoutError::Closed(_) => Error::QueueClosed,
                }),
        }
    }

    /// Free slots in the queue right now
    pub fn available(&self) -> usize {
        self.tx.capacity()
    }

    /// Total number of slots in the queue
    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }

    /// Whether the consumer has dropped its receiver
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Downstream processing of assembled chunks (reassembly, storage, ...)
#[async_trait]
pub trait ChunkHandler: Send + Sync {
    /// Process one chunk; chunks of the same upload may arrive in any order
    async fn handle(&self, chunk: Chunk);
}

/// Handler that only records each chunk in the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingHandler;

#[async_trait]
impl ChunkHandler for LoggingHandler {
    async fn handle(&self, chunk: Chunk) {
        tracing::info!(
            upload_id = %chunk.upload_id(),
            filename = %chunk.filename(),
            offset = chunk.offset(),
            size = chunk.body().len(),
            is_final = chunk.is_final(),
            "Received chunk"
        );
    }
}

/// Spawn the consumer task
///
/// The task runs until the queue closes (every [`ChunkSender`] dropped) or `cancel_token`
/// fires. On cancellation, chunks already in the queue are still handed to `handler`.
pub fn spawn_consumer(
    mut rx: ChunkReceiver,
    handler: Arc<dyn ChunkHandler>,
    cancel_token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                msg = rx.recv() => {
                    let Some(chunk) = msg else {
                        tracing::debug!("Chunk queue closed, consumer stopping");
                        break;
                    };
                    handler.handle(chunk).await;
                }
                _ = cancel_token.cancelled() => {
                    rx.close();
                    let mut drained = 0usize;
                    while let Some(chunk) = rx.recv().await {
                        handler.handle(chunk).await;
                        drained += 1;
                    }
                    tracing::debug!(drained, "Chunk consumer cancelled");
                    break;
                }
            }
        }
    })
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;
    use tokio::sync::Mutex;

    fn chunk(id: &str, offset: i64) -> Chunk {
        Chunk::new(
            "a.bin".to_string(),
            id.to_string(),
            offset,
            100,
            vec![1, 2, 3],
            HashMap::new(),
        )
    }

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<(String, i64)>>,
    }

    #[async_trait]
    impl ChunkHandler for Recorder {
        async fn handle(&self, chunk: Chunk) {
            self.seen
                .lock()
                .await
                .push((chunk.upload_id().to_string(), chunk.offset()));
        }
    }

    #[tokio::test]
    async fn dispatch_delivers_to_receiver() {
        let (tx, mut rx) = chunk_queue(&QueueConfig::default());
        tx.dispatch(chunk("abc", 0)).await.unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received.upload_id(), "abc");
        assert_eq!(tx.capacity(), 64);
    }

    #[tokio::test]
    async fn reject_policy_fails_fast_when_full() {
        let config = QueueConfig {
            capacity: 1,
            full_policy: QueueFullPolicy::Reject,
        };
        let (tx, _rx) = chunk_queue(&config);

        tx.dispatch(chunk("abc", 0)).await.unwrap();
        assert_eq!(tx.available(), 0);

        let err = tx.dispatch(chunk("abc", 3)).await.unwrap_err();
        assert!(matches!(err, Error::QueueFull));
    }

    #[tokio::test]
    async fn wait_policy_times_out_when_consumer_stalls() {
        let config = QueueConfig {
            capacity: 1,
            full_policy: QueueFullPolicy::Wait { timeout_ms: 20 },
        };
        let (tx, _rx) = chunk_queue(&config);

        tx.dispatch(chunk("abc", 0)).await.unwrap();
        let err = tx.dispatch(chunk("abc", 3)).await.unwrap_err();
        assert!(matches!(err, Error::QueueFull));
    }

    #[tokio::test]
    async fn wait_policy_succeeds_once_consumer_drains() {
        let config = QueueConfig {
            capacity: 1,
            full_policy: QueueFullPolicy::Wait { timeout_ms: 1000 },
        };
        let (tx, mut rx) = chunk_queue(&config);
        tx.dispatch(chunk("abc", 0)).await.unwrap();

        let drain = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let first = rx.recv().await.unwrap();
            let second = rx.recv().await.unwrap();
            (first.offset(), second.offset())
        });

        tx.dispatch(chunk("abc", 3)).await.unwrap();
        assert_eq!(drain.await.unwrap(), (0, 3));
    }

    #[tokio::test]
    async fn closed_queue_is_reported() {
        let (tx, rx) = chunk_queue(&QueueConfig::default());
        drop(rx);

        assert!(tx.is_closed());
        let err = tx.dispatch(chunk("abc", 0)).await.unwrap_err();
        assert!(matches!(err, Error::QueueClosed));
    }

    #[tokio::test]
    async fn consumer_stops_when_senders_drop() {
        let (tx, rx) = chunk_queue(&QueueConfig::default());
        let recorder = Arc::new(Recorder::default());
        let handle = spawn_consumer(rx, recorder.clone(), CancellationToken::new());

        tx.dispatch(chunk("abc", 0)).await.unwrap();
        tx.dispatch(chunk("abc", 3)).await.unwrap();
        drop(tx);

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("consumer should stop once the queue closes")
            .unwrap();

        let seen = recorder.seen.lock().await;
        assert_eq!(
            *seen,
            vec![("abc".to_string(), 0), ("abc".to_string(), 3)]
        );
    }

    #[tokio::test]
    async fn cancelled_consumer_drains_queued_chunks() {
        let (tx, rx) = chunk_queue(&QueueConfig::default());
        for offset in 0..5 {
            tx.dispatch(chunk("abc", offset)).await.unwrap();
        }

        let recorder = Arc::new(Recorder::default());
        let cancel_token = CancellationToken::new();
        cancel_token.cancel();
        let handle = spawn_consumer(rx, recorder.clone(), cancel_token);

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("consumer should stop after cancellation")
            .unwrap();

        assert_eq!(recorder.seen.lock().await.len(), 5);
        let err = tx.dispatch(chunk("abc", 9)).await.unwrap_err();
        assert!(matches!(err, Error::QueueClosed));
    }

    #[tokio::test]
    async fn logging_handler_accepts_chunks() {
        LoggingHandler.handle(chunk("abc", 0)).await;
    }
}
