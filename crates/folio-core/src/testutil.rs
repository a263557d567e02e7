//! Test utilities: mock implementations of all core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::cascade::{AttemptOutcome, ProviderAttemptResult};
use crate::error::AppError;
use crate::job::RetrievalParams;
use crate::target::AcquisitionTarget;
use crate::traits::{BlobStore, Provider, Searcher};
use crate::worker::{WorkerEvent, WorkerReporter};

// ---------------------------------------------------------------------------
// MockSearcher
// ---------------------------------------------------------------------------

/// Mock searcher with a queue of scripted responses. Each call pops the
/// first element; an empty queue returns an empty target list.
#[derive(Clone)]
pub struct MockSearcher {
    responses: Arc<Mutex<Vec<Result<Vec<AcquisitionTarget>, AppError>>>>,
}

impl MockSearcher {
    pub fn returning(targets: Vec<AcquisitionTarget>) -> Self {
        Self::scripted(vec![Ok(targets)])
    }

    pub fn failing(message: &str) -> Self {
        Self::scripted(vec![Err(AppError::SearchError(message.to_string()))])
    }

    pub fn scripted(responses: Vec<Result<Vec<AcquisitionTarget>, AppError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
        }
    }
}

impl Searcher for MockSearcher {
    async fn search(
        &self,
        _query: &str,
        _params: &RetrievalParams,
    ) -> Result<Vec<AcquisitionTarget>, AppError> {
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(vec![])
        } else {
            responses.remove(0)
        }
    }
}

// ---------------------------------------------------------------------------
// MockProvider
// ---------------------------------------------------------------------------

/// Mock provider with scripted attempt outcomes and a call counter.
///
/// Scripted outcomes are consumed in order; once exhausted, every further
/// attempt returns the fallback outcome.
#[derive(Clone)]
pub struct MockProvider {
    name: String,
    applicable: bool,
    scripted: Arc<Mutex<Vec<AttemptOutcome>>>,
    fallback: AttemptOutcome,
    calls: Arc<Mutex<u32>>,
}

impl MockProvider {
    /// Provider that succeeds on every attempt with the given payload.
    pub fn succeeding(name: &str, payload: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            applicable: true,
            scripted: Arc::new(Mutex::new(vec![])),
            fallback: AttemptOutcome::Success {
                locator: format!("https://{name}.test/pdf"),
                payload,
            },
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Provider that declines every target.
    pub fn inapplicable(name: &str) -> Self {
        Self {
            name: name.to_string(),
            applicable: false,
            scripted: Arc::new(Mutex::new(vec![])),
            fallback: AttemptOutcome::NotFound,
            calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_outcomes(name: &str, outcomes: Vec<AttemptOutcome>) -> Self {
        Self {
            name: name.to_string(),
            applicable: true,
            scripted: Arc::new(Mutex::new(outcomes)),
            fallback: AttemptOutcome::NotFound,
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Number of times `attempt` was called (applicability checks and
    /// breaker skips do not count).
    pub fn calls(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn applicable(&self, _target: &AcquisitionTarget) -> bool {
        self.applicable
    }

    async fn attempt(&self, _target: &AcquisitionTarget) -> ProviderAttemptResult {
        *self.calls.lock().unwrap() += 1;
        let mut scripted = self.scripted.lock().unwrap();
        let outcome = if scripted.is_empty() {
            self.fallback.clone()
        } else {
            scripted.remove(0)
        };
        ProviderAttemptResult {
            provider: self.name.clone(),
            outcome,
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryBlobStore
// ---------------------------------------------------------------------------

/// In-memory blob store with a switchable outage mode for persistence
/// failure tests.
#[derive(Clone, Default)]
pub struct MemoryBlobStore {
    data: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    failing: Arc<AtomicBool>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While failing, every store operation returns `StorageError`.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn put_sync(&self, key: &str, bytes: Vec<u8>) {
        self.data.lock().unwrap().insert(key.to_string(), bytes);
    }

    pub fn get_sync(&self, key: &str) -> Option<Vec<u8>> {
        self.data.lock().unwrap().get(key).cloned()
    }

    fn check(&self) -> Result<(), AppError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(AppError::StorageError("simulated outage".to_string()))
        } else {
            Ok(())
        }
    }
}

impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), AppError> {
        self.check()?;
        self.data
            .lock()
            .unwrap()
            .insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, AppError> {
        self.check()?;
        Ok(self.data.lock().unwrap().get(key).cloned())
    }

    async fn exists(&self, key: &str) -> Result<bool, AppError> {
        self.check()?;
        Ok(self.data.lock().unwrap().contains_key(key))
    }
}

// ---------------------------------------------------------------------------
// Reporters
// ---------------------------------------------------------------------------

/// Reporter that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl WorkerReporter for NoopReporter {}

/// Mock worker reporter that records event labels.
#[derive(Default)]
pub struct MockReporter {
    pub events: Arc<Mutex<Vec<String>>>,
}

impl MockReporter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WorkerReporter for MockReporter {
    fn report(&self, event: WorkerEvent<'_>) {
        let label = match &event {
            WorkerEvent::Started => "Started",
            WorkerEvent::JobStarted { .. } => "JobStarted",
            WorkerEvent::TargetProcessed { .. } => "TargetProcessed",
            WorkerEvent::JobCompleted { .. } => "JobCompleted",
            WorkerEvent::JobFailed { .. } => "JobFailed",
            WorkerEvent::Stopped => "Stopped",
        };
        self.events.lock().unwrap().push(label.to_string());
    }
}

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

/// Create a target with a DOI and one candidate URL.
pub fn make_test_target(paper_id: &str) -> AcquisitionTarget {
    AcquisitionTarget {
        paper_id: paper_id.to_string(),
        doi: Some(format!("10.1000/{}", paper_id.to_lowercase())),
        title: format!("Paper {paper_id}"),
        year: Some(2024),
        authors: "Doe, Roe".to_string(),
        cited_by_count: 12,
        relevance_score: 42.5,
        venue: Some("Test Letters".to_string()),
        open_access_status: Some("gold".to_string()),
        abstract_text: None,
        candidate_urls: vec![format!("https://repo.test/{paper_id}.pdf")],
    }
}
