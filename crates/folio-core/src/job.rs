use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of a retrieval job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "queued" => Ok(JobStatus::Queued),
            "running" => Ok(JobStatus::Running),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            _ => Err(format!("Unknown job status: {}", s)),
        }
    }
}

/// Search filters carried alongside the query.
///
/// Mirrors the bibliographic search surface: year range, citation floor,
/// and an open-access gate. All optional except `max_results`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalParams {
    pub max_results: usize,
    pub year_min: Option<i32>,
    pub year_max: Option<i32>,
    pub min_citations: Option<u32>,
    pub open_access_only: bool,
}

impl Default for RetrievalParams {
    fn default() -> Self {
        Self {
            max_results: 20,
            year_min: None,
            year_max: None,
            min_citations: None,
            open_access_only: true,
        }
    }
}

/// Sub-job progress visible to pollers: counts plus the label of the
/// target currently (or last) worked on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub total: usize,
    pub processed: usize,
    pub current_item: Option<String>,
}

/// How a single target ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetStatus {
    /// Downloaded from a provider during this job.
    Acquired,
    /// Artifact was already in storage; no provider was called.
    Exists,
    /// Every applicable provider failed or was skipped.
    Failed,
}

/// Per-target outcome recorded in the job's aggregate results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetOutcome {
    pub paper_id: String,
    pub title: String,
    pub status: TargetStatus,
    /// Provider that produced the artifact, when `status` is `acquired`.
    pub provider: Option<String>,
    /// Compact attempt trail, e.g. `["semantic_scholar: rate_limited", "unpaywall: success"]`.
    pub attempts: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Downloads per provider, keyed by provider name. Targets that
    /// already existed in storage are not attributed to any provider.
    pub by_provider: BTreeMap<String, usize>,
}

/// Aggregate result of a completed job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    pub summary: ResultSummary,
    pub outcomes: Vec<TargetOutcome>,
}

impl JobResult {
    pub fn from_outcomes(outcomes: Vec<TargetOutcome>) -> Self {
        let total = outcomes.len();
        let succeeded = outcomes
            .iter()
            .filter(|o| matches!(o.status, TargetStatus::Acquired | TargetStatus::Exists))
            .count();
        let mut by_provider = BTreeMap::new();
        for outcome in &outcomes {
            if outcome.status == TargetStatus::Acquired
                && let Some(provider) = &outcome.provider
            {
                *by_provider.entry(provider.clone()).or_insert(0) += 1;
            }
        }
        Self {
            summary: ResultSummary {
                total,
                succeeded,
                failed: total - succeeded,
                by_provider,
            },
            outcomes,
        }
    }
}

/// A retrieval job tracked by the [`JobStore`](crate::store::JobStore).
///
/// `results` and `error` are mutually exclusive; each implies its
/// terminal status. Mutations go through [`StatusUpdate`], which makes
/// the pairing impossible to get wrong at the call site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub job_id: String,
    pub status: JobStatus,
    pub query: String,
    pub params: RetrievalParams,
    pub progress: Progress,
    pub results: Option<JobResult>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn new(job_id: String, query: String, params: RetrievalParams) -> Self {
        let now = Utc::now();
        Self {
            job_id,
            status: JobStatus::Queued,
            query,
            params,
            progress: Progress::default(),
            results: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A status transition together with the data that terminal states carry.
#[derive(Debug, Clone)]
pub enum StatusUpdate {
    Running,
    Completed(JobResult),
    Failed(String),
}

impl StatusUpdate {
    pub fn status(&self) -> JobStatus {
        match self {
            StatusUpdate::Running => JobStatus::Running,
            StatusUpdate::Completed(_) => JobStatus::Completed,
            StatusUpdate::Failed(_) => JobStatus::Failed,
        }
    }
}

/// Generate a lexicographically sortable job id.
///
/// Timestamp prefix keeps ids ordered by submission time; the UUID
/// suffix disambiguates submissions within the same second.
pub fn new_job_id(now: DateTime<Utc>) -> String {
    format!(
        "job_{}_{}",
        now.format("%Y%m%dT%H%M%SZ"),
        &Uuid::new_v4().simple().to_string()[..8]
    )
}
