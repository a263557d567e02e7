use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use folio_core::job::{Job, JobResult, Progress, ResultSummary, TargetOutcome};
use folio_core::{AppError, RetrievalParams};

// ---------------------------------------------------------------------------
// Retrievals
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateRetrievalRequest {
    /// Free-text search query
    pub query: String,
    /// Maximum number of targets to retrieve (default 20, capped at 100)
    pub max_results: Option<usize>,
    /// Earliest publication year
    pub year_min: Option<i32>,
    /// Latest publication year
    pub year_max: Option<i32>,
    /// Minimum citation count
    pub min_citations: Option<u32>,
    /// Restrict search to open access works (default true)
    pub open_access_only: Option<bool>,
}

impl CreateRetrievalRequest {
    pub fn validate(&self) -> Result<RetrievalParams, AppError> {
        if self.query.trim().is_empty() {
            return Err(AppError::Generic("Query must not be empty".into()));
        }
        let defaults = RetrievalParams::default();
        let max_results = self.max_results.unwrap_or(defaults.max_results);
        if max_results == 0 || max_results > 100 {
            return Err(AppError::Generic(
                "max_results must be between 1 and 100".into(),
            ));
        }
        if let (Some(min), Some(max)) = (self.year_min, self.year_max)
            && min > max
        {
            return Err(AppError::Generic(
                "year_min must not exceed year_max".into(),
            ));
        }
        Ok(RetrievalParams {
            max_results,
            year_min: self.year_min,
            year_max: self.year_max,
            min_citations: self.min_citations,
            open_access_only: self.open_access_only.unwrap_or(defaults.open_access_only),
        })
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CreateRetrievalResponse {
    pub job_id: String,
    pub status: String,
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct JobResponse {
    pub job_id: String,
    pub status: String,
    pub query: String,
    pub progress: ProgressResponse,
    pub results: Option<JobResultResponse>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Job> for JobResponse {
    fn from(job: Job) -> Self {
        Self {
            job_id: job.job_id,
            status: job.status.to_string(),
            query: job.query,
            progress: job.progress.into(),
            results: job.results.map(JobResultResponse::from),
            error: job.error,
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ProgressResponse {
    pub total: usize,
    pub processed: usize,
    pub current_item: Option<String>,
}

impl From<Progress> for ProgressResponse {
    fn from(p: Progress) -> Self {
        Self {
            total: p.total,
            processed: p.processed,
            current_item: p.current_item,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct JobResultResponse {
    pub summary: SummaryResponse,
    pub outcomes: Vec<TargetOutcomeResponse>,
}

impl From<JobResult> for JobResultResponse {
    fn from(r: JobResult) -> Self {
        Self {
            summary: r.summary.into(),
            outcomes: r.outcomes.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SummaryResponse {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Downloads per provider; targets that already existed are not counted.
    pub by_provider: std::collections::BTreeMap<String, usize>,
}

impl From<ResultSummary> for SummaryResponse {
    fn from(s: ResultSummary) -> Self {
        Self {
            total: s.total,
            succeeded: s.succeeded,
            failed: s.failed,
            by_provider: s.by_provider,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct TargetOutcomeResponse {
    pub paper_id: String,
    pub title: String,
    pub status: String,
    pub provider: Option<String>,
    pub attempts: Vec<String>,
}

impl From<TargetOutcome> for TargetOutcomeResponse {
    fn from(o: TargetOutcome) -> Self {
        let status = match o.status {
            folio_core::job::TargetStatus::Acquired => "acquired",
            folio_core::job::TargetStatus::Exists => "exists",
            folio_core::job::TargetStatus::Failed => "failed",
        };
        Self {
            paper_id: o.paper_id,
            title: o.title,
            status: status.to_string(),
            provider: o.provider,
            attempts: o.attempts,
        }
    }
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub store: &'static str,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
