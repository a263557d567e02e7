//! Shared setup for server integration tests.
//!
//! The app runs against a real filesystem blob store in a tempdir. No
//! worker is spawned: submitted jobs stay queued, which is exactly what
//! the API-level tests need to observe.

use std::sync::Arc;

use axum::Router;
use tempfile::TempDir;

use folio_core::{JobQueue, JobReceiver, JobStore};
use folio_server::routes;
use folio_server::state::AppState;
use folio_store::FsBlobStore;

pub const TEST_API_KEY: &str = "test-key-123";

pub struct TestApp {
    pub router: Router,
    /// Held so queue submissions succeed; dropping it would close the queue.
    pub _receiver: JobReceiver,
    _data_dir: TempDir,
}

pub fn setup_test_app() -> TestApp {
    let data_dir = tempfile::tempdir().expect("tempdir");
    let blobs = FsBlobStore::at(data_dir.path());
    let jobs = JobStore::new(blobs.clone());
    let (queue, receiver) = JobQueue::new(8);

    let state = Arc::new(AppState {
        jobs,
        blobs,
        queue,
        api_key: TEST_API_KEY.to_string(),
    });

    TestApp {
        router: routes::router(state),
        _receiver: receiver,
        _data_dir: data_dir,
    }
}
