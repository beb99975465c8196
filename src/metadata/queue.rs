//! Background re-enrichment queue.
//!
//! [`EnrichmentQueue`] is the fire-and-forget side: [`JobEnqueuer::enqueue`]
//! never waits and never blocks a library run. [`QueueWorker`] drains the
//! channel on a spawned task and calls
//! [`EnrichmentService::re_enrich`] for each job, one at a time.
//!
//! # Example
//!
//! ```rust,ignore
//! let (queue, worker) = EnrichmentQueue::channel(100);
//! let service = Arc::new(EnrichmentService::new(repo, registry).with_enqueuer(Arc::new(queue)));
//! let handle = worker.spawn(service.clone(), cancel.child_token());
//! ```

use std::sync::Arc;

use reelmatch_common::{Error, RecordId, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::enrichment::EnrichmentService;

/// A request to refresh one record from its provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentJob {
    pub record_id: RecordId,
    /// Title at enqueue time, for logs.
    pub title: String,
}

/// Fire-and-forget submission of re-enrichment jobs.
pub trait JobEnqueuer: Send + Sync {
    /// Submit a job without waiting. Fails if the queue is full or closed.
    fn enqueue(&self, job: EnrichmentJob) -> Result<()>;
}

/// Sending half of the in-process queue.
#[derive(Debug, Clone)]
pub struct EnrichmentQueue {
    sender: mpsc::Sender<EnrichmentJob>,
}

/// Receiving half; spawn it once the service exists.
#[derive(Debug)]
pub struct QueueWorker {
    receiver: mpsc::Receiver<EnrichmentJob>,
}

impl EnrichmentQueue {
    /// Create a bounded queue holding at most `capacity` pending jobs.
    pub fn channel(capacity: usize) -> (Self, QueueWorker) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, QueueWorker { receiver })
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

impl JobEnqueuer for EnrichmentQueue {
    fn enqueue(&self, job: EnrichmentJob) -> Result<()> {
        debug!(record_id = %job.record_id, title = %job.title, "Queueing re-enrichment");
        self.sender.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(job) => Error::Unavailable(format!(
                "enrichment queue is full, dropped record {}",
                job.record_id
            )),
            mpsc::error::TrySendError::Closed(_) => {
                Error::Unavailable("enrichment queue is closed".to_string())
            }
        })
    }
}

impl QueueWorker {
    /// Spawn the worker. It runs until `cancel` fires or every sender is
    /// dropped.
    pub fn spawn(self, service: Arc<EnrichmentService>, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(process_jobs(self.receiver, service, cancel))
    }
}

async fn process_jobs(
    mut receiver: mpsc::Receiver<EnrichmentJob>,
    service: Arc<EnrichmentService>,
    cancel: CancellationToken,
) {
    info!("Enrichment queue worker started");

    loop {
        let job = tokio::select! {
            _ = cancel.cancelled() => break,
            job = receiver.recv() => match job {
                Some(job) => job,
                None => break,
            },
        };

        match service.re_enrich(job.record_id, &cancel).await {
            Ok(record) => {
                info!(record_id = %record.id, title = %record.title, "Re-enrichment succeeded");
            }
            Err(e) if e.is_cancelled() => break,
            Err(e) => {
                warn!(
                    record_id = %job.record_id,
                    title = %job.title,
                    error = %e,
                    "Re-enrichment failed; continuing with next job"
                );
            }
        }
    }

    info!("Enrichment queue worker stopped");
}
