//! Persistence Notifier - background audit writes
//!
//! Handlers hand records to a bounded queue and return immediately. A fixed
//! pool of workers drains the queue, resolves the latest tracking run and
//! writes each record once. Failures are logged and never retried.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::sync::mpsc::error::TrySendError;

use crate::error::PersistenceError;
use crate::models::AuditRecord;
use crate::registry::ModelRegistry;
use super::PredictionStore;

/// Outcome of one background write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    Attempted,
    Failed,
}

/// Sender side of the audit queue. Cheap to clone.
#[derive(Clone)]
pub struct PersistenceNotifier {
    tx: mpsc::Sender<AuditRecord>,
    dropped: Arc<AtomicU64>,
}

impl PersistenceNotifier {
    /// Spawn `workers` writer tasks behind a queue of `capacity` records.
    /// Must be called inside a Tokio runtime.
    pub fn start(
        store: Arc<dyn PredictionStore>,
        registry: Arc<dyn ModelRegistry>,
        capacity: usize,
        workers: usize,
    ) -> Self {
        let (tx, rx) = mpsc::channel::<AuditRecord>(capacity.max(1));
        let shared_rx = Arc::new(Mutex::new(rx));

        for worker_id in 0..workers.max(1) {
            let rx = shared_rx.clone();
            let store = store.clone();
            let registry = registry.clone();

            tokio::spawn(async move {
                loop {
                    let record = {
                        let mut guard = rx.lock().await;
                        guard.recv().await
                    };

                    match record {
                        Some(record) => {
                            persist(store.as_ref(), registry.as_ref(), record).await;
                        }
                        None => break,
                    }
                }
                tracing::debug!(worker_id, "Audit worker stopped");
            });
        }

        tracing::info!(capacity, workers, "Audit queue started");
        Self {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Queue a record without waiting. A full queue drops the record and
    /// bumps the drop counter.
    pub fn notify(&self, record: AuditRecord) -> Result<(), PersistenceError> {
        let (record, err) = match self.tx.try_send(record) {
            Ok(()) => return Ok(()),
            Err(TrySendError::Full(record)) => (record, PersistenceError::QueueFull),
            Err(TrySendError::Closed(record)) => (record, PersistenceError::QueueClosed),
        };

        let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::error!(
            client_id = %record.client_id,
            dropped_total = dropped,
            "Prediction not stored: {}",
            err
        );
        Err(err)
    }

    /// Records dropped since startup
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Records waiting for a worker
    pub fn pending(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }
}

/// Resolve the run id at write time, then store the record once
pub async fn persist(
    store: &dyn PredictionStore,
    registry: &dyn ModelRegistry,
    mut record: AuditRecord,
) -> PersistOutcome {
    record.run_id = match registry.latest_run_id().await {
        Ok(run_id) => run_id,
        Err(e) => {
            tracing::error!("Error fetching tracking run ID: {}", e);
            None
        }
    };

    match store.store_prediction(&record).await {
        Ok(()) => {
            tracing::info!(client_id = %record.client_id, "Prediction stored");
            PersistOutcome::Attempted
        }
        Err(e) => {
            tracing::error!(client_id = %record.client_id, "Failed to store prediction: {}", e);
            PersistOutcome::Failed
        }
    }
}
