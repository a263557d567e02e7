use folio_core::{JobQueue, JobStore};
use folio_store::FsBlobStore;

/// Shared application state, available to all route handlers via `State<Arc<AppState>>`.
pub struct AppState {
    pub jobs: JobStore<FsBlobStore>,
    pub blobs: FsBlobStore,
    pub queue: JobQueue,
    /// API key for protecting the retrieval endpoints.
    pub api_key: String,
}
