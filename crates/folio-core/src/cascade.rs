//! Ordered multi-provider acquisition with circuit-breaker gating.
//!
//! For a single target the cascade walks the registered providers in
//! priority order and stops at the first success. Providers that declare
//! themselves inapplicable cost nothing; providers whose breaker is open
//! are skipped without a network call. Rate-limit failures feed the
//! breaker, everything else just moves the cascade along. Priority order
//! is fixed; there is no dynamic reordering based on historical success
//! rate.

use std::sync::Arc;

use crate::circuit_breaker::{FailureKind, ProviderBreakers};
use crate::target::AcquisitionTarget;
use crate::traits::{BlobStore, Provider};

/// Outcome of one provider attempt on one target.
///
/// Failure kinds are data, not control flow: the cascade inspects the
/// variant to decide breaker updates and continuation. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Provider produced the artifact bytes from the given locator.
    Success { locator: String, payload: Vec<u8> },
    /// Provider answered definitively: it does not have this target.
    NotFound,
    /// HTTP 429 survived the transport's retries.
    RateLimited,
    /// Network trouble or 5xx after retries were exhausted.
    TransientError(String),
    /// Provider declared itself inapplicable; no network call was made.
    Inapplicable,
    /// Breaker was open; no network call was made.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderAttemptResult {
    pub provider: String,
    pub outcome: AttemptOutcome,
}

impl ProviderAttemptResult {
    /// Compact `provider: outcome` label for attempt trails in job results.
    pub fn label(&self) -> String {
        let outcome = match &self.outcome {
            AttemptOutcome::Success { .. } => "success",
            AttemptOutcome::NotFound => "not_found",
            AttemptOutcome::RateLimited => "rate_limited",
            AttemptOutcome::TransientError(_) => "transient_error",
            AttemptOutcome::Inapplicable => "inapplicable",
            AttemptOutcome::Skipped => "skipped",
        };
        format!("{}: {}", self.provider, outcome)
    }
}

/// How a target was (or was not) resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A provider produced the artifact during this call.
    Acquired { provider: String, payload: Vec<u8> },
    /// The artifact was already in storage; no provider was called.
    AlreadyStored,
    /// Every provider was exhausted without success.
    Unresolved,
}

/// Result of [`AcquisitionCascade::resolve`] with the full attempt trail
/// for diagnostics.
#[derive(Debug, Clone)]
pub struct AcquisitionOutcome {
    pub resolution: Resolution,
    pub attempts: Vec<ProviderAttemptResult>,
}

impl AcquisitionOutcome {
    pub fn succeeded(&self) -> bool {
        !matches!(self.resolution, Resolution::Unresolved)
    }

    pub fn provider_used(&self) -> Option<&str> {
        match &self.resolution {
            Resolution::Acquired { provider, .. } => Some(provider),
            _ => None,
        }
    }
}

/// The ordered fallback strategy across providers for a single target.
pub struct AcquisitionCascade<A: BlobStore> {
    providers: Vec<Arc<dyn Provider>>,
    breakers: ProviderBreakers,
    artifacts: A,
}

impl<A: BlobStore> AcquisitionCascade<A> {
    /// Providers are tried in the order given; registration order is the
    /// priority order.
    pub fn new(providers: Vec<Arc<dyn Provider>>, breakers: ProviderBreakers, artifacts: A) -> Self {
        Self {
            providers,
            breakers,
            artifacts,
        }
    }

    pub fn breakers(&self) -> &ProviderBreakers {
        &self.breakers
    }

    /// Resolve one target through the provider chain.
    ///
    /// If the artifact already exists in storage the chain is bypassed
    /// entirely and `AlreadyStored` is returned with an empty trail.
    pub async fn resolve(&self, target: &AcquisitionTarget) -> AcquisitionOutcome {
        let key = artifact_blob_key(target);
        match self.artifacts.exists(&key).await {
            Ok(true) => {
                tracing::debug!(paper_id = %target.paper_id, "Artifact already stored; skipping providers");
                return AcquisitionOutcome {
                    resolution: Resolution::AlreadyStored,
                    attempts: Vec::new(),
                };
            }
            Ok(false) => {}
            // An unreachable store must not block acquisition; treat as absent.
            Err(e) => {
                tracing::warn!(paper_id = %target.paper_id, error = %e, "Artifact existence check failed");
            }
        }

        let mut attempts = Vec::with_capacity(self.providers.len());

        for provider in &self.providers {
            let name = provider.name().to_string();

            if !provider.applicable(target) {
                attempts.push(ProviderAttemptResult {
                    provider: name,
                    outcome: AttemptOutcome::Inapplicable,
                });
                continue;
            }

            if self.breakers.is_open(&name) {
                tracing::debug!(provider = %name, paper_id = %target.paper_id, "Breaker open; skipping provider");
                attempts.push(ProviderAttemptResult {
                    provider: name,
                    outcome: AttemptOutcome::Skipped,
                });
                continue;
            }

            let result = provider.attempt(target).await;
            match &result.outcome {
                AttemptOutcome::Success { payload, locator } => {
                    self.breakers.record_success(&name);
                    tracing::info!(
                        provider = %name,
                        paper_id = %target.paper_id,
                        bytes = payload.len(),
                        %locator,
                        "Target acquired"
                    );
                    let payload = payload.clone();
                    attempts.push(result);
                    return AcquisitionOutcome {
                        resolution: Resolution::Acquired {
                            provider: name,
                            payload,
                        },
                        attempts,
                    };
                }
                AttemptOutcome::RateLimited => {
                    self.breakers.record_failure(&name, FailureKind::RateLimited);
                    attempts.push(result);
                }
                AttemptOutcome::NotFound | AttemptOutcome::TransientError(_) => {
                    // Terminal for this provider on this target; the
                    // breaker only cares about rate limits.
                    attempts.push(result);
                }
                AttemptOutcome::Inapplicable | AttemptOutcome::Skipped => {
                    attempts.push(result);
                }
            }
        }

        tracing::debug!(paper_id = %target.paper_id, attempts = attempts.len(), "No provider resolved target");
        AcquisitionOutcome {
            resolution: Resolution::Unresolved,
            attempts,
        }
    }
}

/// Blob key under which a target's artifact is stored.
pub fn artifact_blob_key(target: &AcquisitionTarget) -> String {
    format!("artifacts/{}.pdf", target.artifact_key())
}
