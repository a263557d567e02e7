//! The single consumer of the job queue.
//!
//! One worker task drains the queue in FIFO order and runs each job to a
//! terminal status. Failures inside a job never kill the loop: a search
//! error fails that job, a per-target failure is recorded in the job's
//! outcomes, and the worker moves on either way.

use tokio_util::sync::CancellationToken;

use crate::cascade::{AcquisitionCascade, Resolution, artifact_blob_key};
use crate::error::AppError;
use crate::job::{JobResult, Progress, ResultSummary, StatusUpdate, TargetOutcome, TargetStatus};
use crate::queue::{JobReceiver, QueuedJob};
use crate::store::JobStore;
use crate::traits::{BlobStore, Searcher};

/// Events emitted by the worker for monitoring/logging.
#[derive(Debug, Clone)]
pub enum WorkerEvent<'a> {
    Started,
    JobStarted {
        job_id: &'a str,
        query: &'a str,
    },
    TargetProcessed {
        job_id: &'a str,
        paper_id: &'a str,
        status: TargetStatus,
    },
    JobCompleted {
        job_id: &'a str,
        summary: &'a ResultSummary,
    },
    JobFailed {
        job_id: &'a str,
        error: &'a str,
    },
    Stopped,
}

/// Trait for receiving worker events (decoupled logging).
pub trait WorkerReporter: Send + Sync {
    fn report(&self, event: WorkerEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingWorkerReporter;

impl WorkerReporter for TracingWorkerReporter {
    fn report(&self, event: WorkerEvent<'_>) {
        match event {
            WorkerEvent::Started => {
                tracing::info!("Worker started");
            }
            WorkerEvent::JobStarted { job_id, query } => {
                tracing::info!(%job_id, %query, "Processing job");
            }
            WorkerEvent::TargetProcessed {
                job_id,
                paper_id,
                status,
            } => {
                tracing::debug!(%job_id, %paper_id, ?status, "Target processed");
            }
            WorkerEvent::JobCompleted { job_id, summary } => {
                tracing::info!(
                    %job_id,
                    total = summary.total,
                    succeeded = summary.succeeded,
                    failed = summary.failed,
                    "Job completed"
                );
            }
            WorkerEvent::JobFailed { job_id, error } => {
                tracing::warn!(%job_id, %error, "Job failed");
            }
            WorkerEvent::Stopped => {
                tracing::info!("Worker stopped");
            }
        }
    }
}

/// Worker that drains the job queue and runs retrieval jobs.
pub struct WorkerService<S, B>
where
    S: Searcher,
    B: BlobStore,
{
    searcher: S,
    cascade: AcquisitionCascade<B>,
    store: JobStore<B>,
    blobs: B,
}

impl<S, B> WorkerService<S, B>
where
    S: Searcher,
    B: BlobStore,
{
    pub fn new(searcher: S, cascade: AcquisitionCascade<B>, store: JobStore<B>, blobs: B) -> Self {
        Self {
            searcher,
            cascade,
            store,
            blobs,
        }
    }

    /// Run the worker loop until the queue closes or cancellation fires.
    pub async fn run<WR: WorkerReporter>(
        &self,
        mut receiver: JobReceiver,
        cancel_token: CancellationToken,
        reporter: &WR,
    ) {
        reporter.report(WorkerEvent::Started);

        loop {
            let job = tokio::select! {
                job = receiver.recv() => job,
                () = cancel_token.cancelled() => break,
            };
            let Some(job) = job else { break };
            self.process_job(&job, reporter).await;
        }

        reporter.report(WorkerEvent::Stopped);
    }

    /// Drive one job to a terminal status. Never propagates errors: any
    /// failure the job cannot absorb per-target fails the job record.
    pub async fn process_job<WR: WorkerReporter>(&self, job: &QueuedJob, reporter: &WR) {
        reporter.report(WorkerEvent::JobStarted {
            job_id: &job.job_id,
            query: &job.query,
        });
        self.store.update_status(&job.job_id, StatusUpdate::Running).await;

        match self.run_job(job, reporter).await {
            Ok(result) => {
                reporter.report(WorkerEvent::JobCompleted {
                    job_id: &job.job_id,
                    summary: &result.summary,
                });
                self.store
                    .update_status(&job.job_id, StatusUpdate::Completed(result))
                    .await;
            }
            Err(e) => {
                let message = e.to_string();
                reporter.report(WorkerEvent::JobFailed {
                    job_id: &job.job_id,
                    error: &message,
                });
                self.store
                    .update_status(&job.job_id, StatusUpdate::Failed(message))
                    .await;
            }
        }
    }

    async fn run_job<WR: WorkerReporter>(
        &self,
        job: &QueuedJob,
        reporter: &WR,
    ) -> Result<JobResult, AppError> {
        let targets = self.searcher.search(&job.query, &job.params).await?;
        let total = targets.len();

        let mut outcomes = Vec::with_capacity(total);
        for (index, target) in targets.iter().enumerate() {
            self.store
                .update_progress(
                    &job.job_id,
                    Progress {
                        total,
                        processed: index,
                        current_item: Some(target.title.clone()),
                    },
                )
                .await;

            let acquisition = self.cascade.resolve(target).await;
            let mut attempts: Vec<String> =
                acquisition.attempts.iter().map(|a| a.label()).collect();

            let (status, provider) = match acquisition.resolution {
                Resolution::Acquired { provider, payload } => {
                    let key = artifact_blob_key(target);
                    match self.blobs.put(&key, &payload).await {
                        Ok(()) => (TargetStatus::Acquired, Some(provider)),
                        // Downloaded but not stored is still a failure for
                        // this target; the next job can re-acquire it.
                        Err(e) => {
                            tracing::warn!(
                                job_id = %job.job_id,
                                paper_id = %target.paper_id,
                                error = %e,
                                "Artifact write failed"
                            );
                            attempts.push(format!("{provider}: store_write_failed"));
                            (TargetStatus::Failed, None)
                        }
                    }
                }
                Resolution::AlreadyStored => (TargetStatus::Exists, None),
                Resolution::Unresolved => (TargetStatus::Failed, None),
            };

            reporter.report(WorkerEvent::TargetProcessed {
                job_id: &job.job_id,
                paper_id: &target.paper_id,
                status,
            });
            outcomes.push(TargetOutcome {
                paper_id: target.paper_id.clone(),
                title: target.title.clone(),
                status,
                provider,
                attempts,
            });
        }

        self.store
            .update_progress(
                &job.job_id,
                Progress {
                    total,
                    processed: total,
                    current_item: None,
                },
            )
            .await;

        Ok(JobResult::from_outcomes(outcomes))
    }
}
