//! Job records: in-memory cache with write-through blob persistence.
//!
//! The cache is the source of truth while the process lives; the blob
//! store is a best-effort durable mirror at `jobs/{job_id}.json`.
//! Persistence failures degrade durability, never availability: they are
//! logged and swallowed, and the in-memory update stands. Blob I/O
//! always happens outside the cache mutex.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;

use crate::error::AppError;
use crate::job::{Job, Progress, RetrievalParams, StatusUpdate, new_job_id};
use crate::traits::BlobStore;

fn job_blob_key(job_id: &str) -> String {
    format!("jobs/{job_id}.json")
}

/// Tracks every job this process knows about.
///
/// Cheap to clone; clones share the cache.
#[derive(Clone)]
pub struct JobStore<B: BlobStore> {
    cache: Arc<Mutex<HashMap<String, Job>>>,
    blobs: B,
}

impl<B: BlobStore> JobStore<B> {
    pub fn new(blobs: B) -> Self {
        Self {
            cache: Arc::new(Mutex::new(HashMap::new())),
            blobs,
        }
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, HashMap<String, Job>> {
        self.cache.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Recovered from poisoned job cache mutex");
            poisoned.into_inner()
        })
    }

    /// Create a new queued job and persist its initial snapshot.
    pub async fn create(&self, query: String, params: RetrievalParams) -> Job {
        let job = Job::new(new_job_id(Utc::now()), query, params);
        {
            let mut cache = self.lock_cache();
            cache.insert(job.job_id.clone(), job.clone());
        }
        self.persist(&job).await;
        job
    }

    /// Look up a job, falling back to the blob store on a cache miss
    /// (e.g. after a restart). A blob hit repopulates the cache.
    pub async fn get(&self, job_id: &str) -> Option<Job> {
        if let Some(job) = self.lock_cache().get(job_id).cloned() {
            return Some(job);
        }

        let bytes = match self.blobs.get(&job_blob_key(job_id)).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(%job_id, error = %e, "Job blob read failed");
                return None;
            }
        };

        match serde_json::from_slice::<Job>(&bytes) {
            Ok(job) => {
                let mut cache = self.lock_cache();
                // Another task may have raced the load; keep the cached copy.
                Some(
                    cache
                        .entry(job.job_id.clone())
                        .or_insert(job)
                        .clone(),
                )
            }
            Err(e) => {
                tracing::warn!(%job_id, error = %e, "Job blob is not valid JSON");
                None
            }
        }
    }

    /// Replace a running job's progress and persist the snapshot.
    pub async fn update_progress(&self, job_id: &str, progress: Progress) {
        let snapshot = {
            let mut cache = self.lock_cache();
            let Some(job) = cache.get_mut(job_id) else {
                tracing::warn!(%job_id, "Progress update for unknown job");
                return;
            };
            if job.status.is_terminal() {
                tracing::warn!(%job_id, status = %job.status, "Ignoring progress update on terminal job");
                return;
            }
            job.progress = progress;
            job.updated_at = Utc::now();
            job.clone()
        };
        self.persist(&snapshot).await;
    }

    /// Apply a status transition. Terminal jobs absorb further updates.
    pub async fn update_status(&self, job_id: &str, update: StatusUpdate) {
        let snapshot = {
            let mut cache = self.lock_cache();
            let Some(job) = cache.get_mut(job_id) else {
                tracing::warn!(%job_id, "Status update for unknown job");
                return;
            };
            if job.status.is_terminal() {
                tracing::warn!(
                    %job_id,
                    current = %job.status,
                    attempted = %update.status(),
                    "Ignoring status update on terminal job"
                );
                return;
            }
            job.status = update.status();
            match update {
                StatusUpdate::Running => {}
                StatusUpdate::Completed(results) => {
                    job.results = Some(results);
                    job.error = None;
                }
                StatusUpdate::Failed(message) => {
                    job.error = Some(message);
                    job.results = None;
                }
            }
            job.updated_at = Utc::now();
            job.clone()
        };
        self.persist(&snapshot).await;
    }

    /// Write-through to the blob store. Failures are logged and swallowed;
    /// the in-memory record already reflects the update.
    async fn persist(&self, job: &Job) {
        let bytes = match serde_json::to_vec_pretty(job) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(job_id = %job.job_id, error = %e, "Job snapshot serialization failed");
                return;
            }
        };
        if let Err(e) = self.blobs.put(&job_blob_key(&job.job_id), &bytes).await {
            tracing::warn!(job_id = %job.job_id, error = %e, "Job snapshot persistence failed");
        }
    }

    /// Direct blob read without touching the cache, for tests and tooling.
    pub async fn load_snapshot(&self, job_id: &str) -> Result<Option<Job>, AppError> {
        match self.blobs.get(&job_blob_key(job_id)).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{JobResult, JobStatus};
    use crate::testutil::MemoryBlobStore;

    fn store() -> JobStore<MemoryBlobStore> {
        JobStore::new(MemoryBlobStore::new())
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let store = store();
        let job = store.create("spider silk".into(), RetrievalParams::default()).await;

        let fetched = store.get(&job.job_id).await.unwrap();
        assert_eq!(fetched.status, JobStatus::Queued);
        assert_eq!(fetched.query, "spider silk");
    }

    #[tokio::test]
    async fn test_create_persists_snapshot() {
        let store = store();
        let job = store.create("q".into(), RetrievalParams::default()).await;

        let snapshot = store.load_snapshot(&job.job_id).await.unwrap().unwrap();
        assert_eq!(snapshot.job_id, job.job_id);
        assert_eq!(snapshot.status, JobStatus::Queued);
    }

    #[tokio::test]
    async fn test_get_unknown_job_is_none() {
        assert!(store().get("job_nope").await.is_none());
    }

    #[tokio::test]
    async fn test_status_transition_updates_cache_and_blob() {
        let store = store();
        let job = store.create("q".into(), RetrievalParams::default()).await;

        store.update_status(&job.job_id, StatusUpdate::Running).await;
        assert_eq!(store.get(&job.job_id).await.unwrap().status, JobStatus::Running);

        store
            .update_status(&job.job_id, StatusUpdate::Completed(JobResult::from_outcomes(vec![])))
            .await;
        let done = store.get(&job.job_id).await.unwrap();
        assert_eq!(done.status, JobStatus::Completed);
        assert!(done.results.is_some());
        assert!(done.error.is_none());

        let snapshot = store.load_snapshot(&job.job_id).await.unwrap().unwrap();
        assert_eq!(snapshot.status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn test_failed_carries_error_not_results() {
        let store = store();
        let job = store.create("q".into(), RetrievalParams::default()).await;

        store
            .update_status(&job.job_id, StatusUpdate::Failed("search exploded".into()))
            .await;
        let failed = store.get(&job.job_id).await.unwrap();
        assert_eq!(failed.status, JobStatus::Failed);
        assert_eq!(failed.error.as_deref(), Some("search exploded"));
        assert!(failed.results.is_none());
    }

    #[tokio::test]
    async fn test_terminal_jobs_absorb_updates() {
        let store = store();
        let job = store.create("q".into(), RetrievalParams::default()).await;
        store
            .update_status(&job.job_id, StatusUpdate::Failed("boom".into()))
            .await;

        store.update_status(&job.job_id, StatusUpdate::Running).await;
        store
            .update_progress(
                &job.job_id,
                Progress {
                    total: 5,
                    processed: 1,
                    current_item: Some("late".into()),
                },
            )
            .await;

        let fetched = store.get(&job.job_id).await.unwrap();
        assert_eq!(fetched.status, JobStatus::Failed);
        assert_eq!(fetched.progress, Progress::default());
    }

    #[tokio::test]
    async fn test_persistence_outage_does_not_fail_updates() {
        let blobs = MemoryBlobStore::new();
        let store = JobStore::new(blobs.clone());
        let job = store.create("q".into(), RetrievalParams::default()).await;

        blobs.set_failing(true);
        store.update_status(&job.job_id, StatusUpdate::Running).await;

        // In-memory view moved on despite the outage.
        assert_eq!(store.get(&job.job_id).await.unwrap().status, JobStatus::Running);

        // Durable copy is stale, not corrupt.
        blobs.set_failing(false);
        let snapshot = store.load_snapshot(&job.job_id).await.unwrap().unwrap();
        assert_eq!(snapshot.status, JobStatus::Queued);
    }

    #[tokio::test]
    async fn test_cache_miss_falls_back_to_blob() {
        let blobs = MemoryBlobStore::new();
        let job = {
            let store = JobStore::new(blobs.clone());
            store.create("q".into(), RetrievalParams::default()).await
        };

        // Fresh store simulates a restart with an empty cache.
        let store = JobStore::new(blobs);
        let fetched = store.get(&job.job_id).await.unwrap();
        assert_eq!(fetched.job_id, job.job_id);

        // Second read is served from the repopulated cache.
        assert!(store.get(&job.job_id).await.is_some());
    }
}
