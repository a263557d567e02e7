//! Direct download from the PDF locations the search already discovered.
//!
//! No extra lookup round-trip: the searcher embeds candidate URLs in the
//! target, in preference order, and this provider just works down the
//! list.

use folio_core::{
    AcquisitionTarget, AttemptOutcome, Provider, cascade::ProviderAttemptResult,
};

use super::outcome_from_error;
use crate::transport::{HttpGet, RetryingTransport};

#[derive(Clone)]
pub struct OpenAlexPdfProvider<H: HttpGet> {
    transport: RetryingTransport<H>,
}

impl<H: HttpGet> OpenAlexPdfProvider<H> {
    pub fn new(transport: RetryingTransport<H>) -> Self {
        Self { transport }
    }
}

#[async_trait::async_trait]
impl<H: HttpGet> Provider for OpenAlexPdfProvider<H> {
    fn name(&self) -> &str {
        "openalex"
    }

    fn applicable(&self, target: &AcquisitionTarget) -> bool {
        !target.candidate_urls.is_empty()
    }

    async fn attempt(&self, target: &AcquisitionTarget) -> ProviderAttemptResult {
        let mut rate_limited = false;
        let mut last_error: Option<AttemptOutcome> = None;

        for url in &target.candidate_urls {
            match self.transport.get_bytes(url, &[]).await {
                Ok(payload) => {
                    return ProviderAttemptResult {
                        provider: self.name().to_string(),
                        outcome: AttemptOutcome::Success {
                            locator: url.clone(),
                            payload,
                        },
                    };
                }
                Err(e) => {
                    tracing::debug!(%url, error = %e, "Candidate URL failed");
                    let outcome = outcome_from_error(&e);
                    rate_limited |= outcome == AttemptOutcome::RateLimited;
                    last_error = Some(outcome);
                }
            }
        }

        // A rate limit anywhere in the list dominates so the breaker
        // hears about it.
        let outcome = if rate_limited {
            AttemptOutcome::RateLimited
        } else {
            last_error.unwrap_or(AttemptOutcome::Inapplicable)
        };
        ProviderAttemptResult {
            provider: self.name().to_string(),
            outcome,
        }
    }
}
