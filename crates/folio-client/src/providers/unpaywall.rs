//! Unpaywall provider, last in the default cascade.
//!
//! Unpaywall aggregates open access locations by DOI. The best location
//! is tried first, then the rest of the list; locations without a direct
//! PDF link are skipped.

use folio_core::{
    AcquisitionTarget, AttemptOutcome, Provider, cascade::ProviderAttemptResult,
};
use serde::Deserialize;

use super::outcome_from_error;
use crate::transport::{HttpGet, RetryingTransport};

const UNPAYWALL_API: &str = "https://api.unpaywall.org/v2";

#[derive(Clone)]
pub struct UnpaywallProvider<H: HttpGet> {
    transport: RetryingTransport<H>,
    /// Contact address, required by the Unpaywall terms of use.
    email: String,
}

impl<H: HttpGet> UnpaywallProvider<H> {
    pub fn new(transport: RetryingTransport<H>, email: String) -> Self {
        Self { transport, email }
    }
}

#[derive(Debug, Deserialize)]
struct UnpaywallResponse {
    best_oa_location: Option<OaLocation>,
    #[serde(default)]
    oa_locations: Vec<OaLocation>,
}

#[derive(Debug, Deserialize)]
struct OaLocation {
    url_for_pdf: Option<String>,
}

#[async_trait::async_trait]
impl<H: HttpGet> Provider for UnpaywallProvider<H> {
    fn name(&self) -> &str {
        "unpaywall"
    }

    fn applicable(&self, target: &AcquisitionTarget) -> bool {
        target.doi.is_some()
    }

    async fn attempt(&self, target: &AcquisitionTarget) -> ProviderAttemptResult {
        let outcome = self.try_acquire(target).await;
        ProviderAttemptResult {
            provider: self.name().to_string(),
            outcome,
        }
    }
}

impl<H: HttpGet> UnpaywallProvider<H> {
    async fn try_acquire(&self, target: &AcquisitionTarget) -> AttemptOutcome {
        let Some(doi) = target.doi.as_deref() else {
            return AttemptOutcome::Inapplicable;
        };

        let lookup_url = format!("{UNPAYWALL_API}/{doi}?email={}", self.email);
        let record: UnpaywallResponse = match self.transport.get_json(&lookup_url, &[]).await {
            Ok(record) => record,
            Err(e) => return outcome_from_error(&e),
        };

        let pdf_urls: Vec<String> = record
            .best_oa_location
            .into_iter()
            .chain(record.oa_locations)
            .filter_map(|l| l.url_for_pdf)
            .collect();

        if pdf_urls.is_empty() {
            tracing::debug!(%doi, "Unpaywall has no PDF location");
            return AttemptOutcome::NotFound;
        }

        let mut last_error = AttemptOutcome::NotFound;
        for url in pdf_urls {
            match self.transport.get_bytes(&url, &[]).await {
                Ok(payload) => {
                    return AttemptOutcome::Success {
                        locator: url,
                        payload,
                    };
                }
                Err(e) => {
                    tracing::debug!(%url, error = %e, "Unpaywall location failed");
                    last_error = outcome_from_error(&e);
                }
            }
        }
        last_error
    }
}
