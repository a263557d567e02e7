use std::future::Future;

use crate::cascade::ProviderAttemptResult;
use crate::error::AppError;
use crate::job::RetrievalParams;
use crate::target::AcquisitionTarget;

/// Resolves a free-text query into acquisition targets.
///
/// The production implementation talks to a bibliographic search API;
/// the core treats it as an opaque collaborator that either produces a
/// target list or fails (which fails the whole job).
pub trait Searcher: Send + Sync + Clone {
    fn search(
        &self,
        query: &str,
        params: &RetrievalParams,
    ) -> impl Future<Output = Result<Vec<AcquisitionTarget>, AppError>> + Send;
}

/// One upstream source capable of resolving a target to a retrievable
/// artifact.
///
/// Providers are registered with the cascade in a fixed priority order;
/// adding or reordering providers is wiring, not cascade code. Object
/// safety (`dyn Provider`) is required so the list can mix concrete
/// implementations.
#[async_trait::async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;

    /// Whether this provider can even try this target (e.g. a DOI-keyed
    /// provider declines targets without a DOI). A `false` here means no
    /// network call and no circuit-breaker interaction.
    fn applicable(&self, target: &AcquisitionTarget) -> bool;

    /// Try to resolve the target. Failure kinds are data in the returned
    /// result, never `Err`; the error channel is reserved for bugs-level
    /// conditions the cascade cannot classify.
    async fn attempt(&self, target: &AcquisitionTarget) -> ProviderAttemptResult;
}

/// Durable key-value blob storage.
///
/// Backs both the job-record snapshots (write-through from the
/// [`JobStore`](crate::store::JobStore)) and the acquired artifacts.
/// Implementations must tolerate concurrent callers; keys are flat
/// strings with `/` separators.
pub trait BlobStore: Send + Sync + Clone {
    fn put(
        &self,
        key: &str,
        bytes: &[u8],
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>, AppError>> + Send;

    fn exists(&self, key: &str) -> impl Future<Output = Result<bool, AppError>> + Send;
}
