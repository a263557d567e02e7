pub mod cascade;
pub mod circuit_breaker;
pub mod error;
pub mod job;
pub mod queue;
pub mod store;
pub mod target;
pub mod traits;
pub mod worker;

#[cfg(test)]
pub(crate) mod testutil;

pub use cascade::{AcquisitionCascade, AcquisitionOutcome, AttemptOutcome, Resolution};
pub use circuit_breaker::{CircuitBreakerConfig, FailureKind, ProviderBreakers};
pub use error::AppError;
pub use job::{Job, JobResult, JobStatus, Progress, RetrievalParams, StatusUpdate};
pub use queue::{DEFAULT_QUEUE_CAPACITY, JobQueue, JobReceiver, QueuedJob};
pub use store::JobStore;
pub use target::AcquisitionTarget;
pub use traits::{BlobStore, Provider, Searcher};
pub use worker::{TracingWorkerReporter, WorkerReporter, WorkerService};
