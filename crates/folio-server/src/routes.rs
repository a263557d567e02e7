use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use folio_core::QueuedJob;

use crate::auth::require_api_key;
use crate::dto::{CreateRetrievalRequest, CreateRetrievalResponse, HealthResponse, JobResponse};
use crate::error::ApiError;
use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Build the full router with all routes and middleware.
pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/v1/retrievals", post(create_retrieval))
        .route("/v1/jobs/{job_id}", get(get_job))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ));

    let public = Router::new()
        .route("/health", get(health))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    public.merge(api).with_state(state)
}

// ---------------------------------------------------------------------------
// Retrievals
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/v1/retrievals",
    request_body = CreateRetrievalRequest,
    responses(
        (status = 202, description = "Retrieval job accepted", body = CreateRetrievalResponse),
        (status = 400, description = "Bad request", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "retrievals"
)]
pub async fn create_retrieval(
    State(state): State<Arc<AppState>>,
    axum::Json(body): axum::Json<CreateRetrievalRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let params = body.validate()?;
    let job = state.jobs.create(body.query, params).await;

    state
        .queue
        .submit(QueuedJob {
            job_id: job.job_id.clone(),
            query: job.query.clone(),
            params: job.params.clone(),
        })
        .await?;

    let response = CreateRetrievalResponse {
        job_id: job.job_id,
        status: job.status.to_string(),
    };

    Ok((StatusCode::ACCEPTED, axum::Json(response)))
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/v1/jobs/{job_id}",
    params(
        ("job_id" = String, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Job details", body = JobResponse),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "jobs"
)]
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    match state.jobs.get(&job_id).await {
        Some(job) => Ok(axum::Json(JobResponse::from(job)).into_response()),
        None => {
            let body = crate::dto::ErrorResponse {
                error: "not_found".to_string(),
                message: format!("Job not found: {job_id}"),
            };
            Ok((StatusCode::NOT_FOUND, axum::Json(body)).into_response())
        }
    }
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Service is unhealthy", body = HealthResponse),
    ),
    tag = "system"
)]
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    use folio_core::BlobStore;

    let store_status = match state.blobs.exists("jobs").await {
        Ok(_) => "ok",
        Err(_) => "error",
    };

    let status = if store_status == "ok" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = HealthResponse {
        status: if store_status == "ok" {
            "healthy"
        } else {
            "unhealthy"
        },
        store: store_status,
    };

    (status, axum::Json(response))
}
