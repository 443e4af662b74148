//! Bounded pool of generation workers.
//!
//! Job ids are pushed onto a bounded channel and picked up by a fixed number
//! of tokio tasks, each running [`GenerationWorker::run`]. Submission never
//! waits: a full queue is reported back to the caller immediately.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;
use tokio::sync::{Mutex, broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::job::WorkerOutcome;
use crate::worker::GenerationWorker;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("worker queue is full")]
    QueueFull,

    #[error("worker pool is shut down")]
    Closed,
}

/// Counters describing what the pool has done so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub generated: u64,
    pub skipped: u64,
    pub failed: u64,
}

impl PoolStats {
    pub fn total_processed(&self) -> u64 {
        self.generated + self.skipped + self.failed
    }
}

#[derive(Default)]
struct SharedStats {
    generated: AtomicU64,
    skipped: AtomicU64,
    failed: AtomicU64,
}

impl SharedStats {
    fn record(&self, outcome: &WorkerOutcome) {
        let counter = match outcome {
            WorkerOutcome::Generated { .. } => &self.generated,
            WorkerOutcome::Skipped(_) => &self.skipped,
            WorkerOutcome::Failed(_) => &self.failed,
        };
        counter.fetch_add(1, Ordering::SeqCst);
    }

    fn snapshot(&self) -> PoolStats {
        PoolStats {
            generated: self.generated.load(Ordering::SeqCst),
            skipped: self.skipped.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
        }
    }
}

pub struct WorkerPool {
    sender: mpsc::Sender<String>,
    shutdown_tx: broadcast::Sender<()>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    stats: Arc<SharedStats>,
}

impl WorkerPool {
    /// Spawn `pool_size` workers sharing a queue of `queue_capacity` job ids.
    pub fn start(worker: GenerationWorker, pool_size: usize, queue_capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel::<String>(queue_capacity.max(1));
        let receiver = Arc::new(Mutex::new(receiver));
        let (shutdown_tx, _) = broadcast::channel(1);
        let stats = Arc::new(SharedStats::default());

        let handles = (0..pool_size.max(1))
            .map(|worker_id| {
                let worker = worker.clone();
                let receiver = Arc::clone(&receiver);
                let stats = Arc::clone(&stats);
                let mut shutdown_rx = shutdown_tx.subscribe();
                tokio::spawn(async move {
                    debug!(worker_id, "generation worker started");
                    loop {
                        let next = tokio::select! {
                            _ = shutdown_rx.recv() => None,
                            job_id = async { receiver.lock().await.recv().await } => job_id,
                        };
                        let Some(job_id) = next else { break };
                        let outcome = worker.run(&job_id).await;
                        stats.record(&outcome);
                    }
                    debug!(worker_id, "generation worker stopped");
                })
            })
            .collect();

        info!(pool_size, queue_capacity, "worker pool started");
        Self {
            sender,
            shutdown_tx,
            handles: Mutex::new(handles),
            stats,
        }
    }

    /// Queue a job id for generation without waiting.
    pub fn submit(&self, job_id: impl Into<String>) -> Result<(), PoolError> {
        self.sender.try_send(job_id.into()).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => PoolError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => PoolError::Closed,
        })
    }

    pub fn stats(&self) -> PoolStats {
        self.stats.snapshot()
    }

    /// Stop all workers. A job already being generated finishes first;
    /// queued ids that were not started are dropped.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
        let handles = std::mem::take(&mut *self.handles.lock().await);
        for handle in handles {
            let _ = handle.await;
        }
        info!("worker pool stopped");
    }
}
