//! Bounded in-process job queue.
//!
//! A single bounded channel connects submitters (the HTTP layer, the
//! CLI) to the one worker task. Capacity is the backpressure mechanism:
//! when the channel is full, submission waits rather than growing an
//! unbounded backlog. Receiving a message removes it from the channel,
//! so a crashed worker drops at most the job it was holding; the job
//! record itself survives in the store.

use tokio::sync::mpsc;

use crate::error::AppError;
use crate::job::RetrievalParams;

pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// The unit of work handed to the worker. Deliberately small: the full
/// job record lives in the store, keyed by `job_id`.
#[derive(Debug, Clone)]
pub struct QueuedJob {
    pub job_id: String,
    pub query: String,
    pub params: RetrievalParams,
}

/// Submission side of the queue. Cheap to clone.
#[derive(Clone)]
pub struct JobQueue {
    tx: mpsc::Sender<QueuedJob>,
}

/// Consumption side, owned by the single worker task.
pub struct JobReceiver {
    rx: mpsc::Receiver<QueuedJob>,
}

impl JobQueue {
    pub fn new(capacity: usize) -> (Self, JobReceiver) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, JobReceiver { rx })
    }

    /// Enqueue a job, waiting for capacity if the queue is full.
    ///
    /// Fails only when the worker side has shut down.
    pub async fn submit(&self, job: QueuedJob) -> Result<(), AppError> {
        let job_id = job.job_id.clone();
        self.tx
            .send(job)
            .await
            .map_err(|_| AppError::Generic(format!("Job queue closed; cannot enqueue {job_id}")))
    }
}

impl JobReceiver {
    /// Next queued job, or `None` once every submitter has been dropped.
    pub async fn recv(&mut self) -> Option<QueuedJob> {
        self.rx.recv().await
    }
}
