use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use folio_client::{
    OpenAlexPdfProvider, OpenAlexSearcher, ReqwestHttp, RetryPolicy, RetryingTransport,
    SemanticScholarProvider, UnpaywallProvider,
};
use folio_core::{
    AcquisitionCascade, DEFAULT_QUEUE_CAPACITY, JobQueue, JobStore, Provider, ProviderBreakers,
    TracingWorkerReporter, WorkerService,
};
use folio_server::routes;
use folio_server::state::AppState;
use folio_store::{FsBlobStore, StoreConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("folio=info".parse()?))
        .with_target(false)
        .init();

    let api_key = std::env::var("FOLIO_SERVER_API_KEY").expect("FOLIO_SERVER_API_KEY must be set");
    let port = std::env::var("FOLIO_SERVER_PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("0.0.0.0:{port}");
    let mailto = std::env::var("FOLIO_MAILTO").ok();
    let ss_api_key = std::env::var("SEMANTIC_SCHOLAR_KEY").ok();

    let blobs = FsBlobStore::new(&StoreConfig::from_env()?);
    let jobs = JobStore::new(blobs.clone());
    let (queue, receiver) = JobQueue::new(DEFAULT_QUEUE_CAPACITY);

    let transport = RetryingTransport::new(ReqwestHttp::new()?, RetryPolicy::default());
    let searcher = OpenAlexSearcher::new(transport.clone(), mailto.clone());

    // Provider priority order: Semantic Scholar, then the locations the
    // search already found, then Unpaywall as last resort.
    let mut providers: Vec<Arc<dyn Provider>> = vec![
        Arc::new(SemanticScholarProvider::new(transport.clone(), ss_api_key)),
        Arc::new(OpenAlexPdfProvider::new(transport.clone())),
    ];
    match &mailto {
        Some(email) => providers.push(Arc::new(UnpaywallProvider::new(
            transport.clone(),
            email.clone(),
        ))),
        None => tracing::warn!("FOLIO_MAILTO not set; Unpaywall provider disabled"),
    }

    let cascade = AcquisitionCascade::new(providers, ProviderBreakers::default(), blobs.clone());
    let worker = WorkerService::new(searcher, cascade, jobs.clone(), blobs.clone());

    let cancel_token = CancellationToken::new();
    let worker_token = cancel_token.clone();
    let worker_handle = tokio::spawn(async move {
        worker
            .run(receiver, worker_token, &TracingWorkerReporter)
            .await;
    });

    let state = Arc::new(AppState {
        jobs,
        blobs,
        queue,
        api_key,
    });

    let app = routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    tracing::info!("Starting server on {addr}");
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cancel_token.cancel();
    worker_handle.await?;

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C handler");
    tracing::info!("Shutdown signal received");
}
