//! Semantic Scholar Graph API provider.
//!
//! Two-step acquisition: look up the paper by DOI to find its open
//! access PDF location, then download from that location. Both steps go
//! through the retrying transport; the free tier rate-limits hard, so
//! this provider is the main customer of the circuit breaker.

use folio_core::{
    AcquisitionTarget, AttemptOutcome, Provider, cascade::ProviderAttemptResult,
};
use serde::Deserialize;

use super::outcome_from_error;
use crate::transport::{HttpGet, RetryingTransport};

const GRAPH_API: &str = "https://api.semanticscholar.org/graph/v1/paper";

#[derive(Clone)]
pub struct SemanticScholarProvider<H: HttpGet> {
    transport: RetryingTransport<H>,
    api_key: Option<String>,
}

impl<H: HttpGet> SemanticScholarProvider<H> {
    /// An API key raises the rate limit considerably; without one the
    /// shared anonymous pool applies.
    pub fn new(transport: RetryingTransport<H>, api_key: Option<String>) -> Self {
        Self { transport, api_key }
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        match &self.api_key {
            Some(key) => vec![("x-api-key", key.as_str())],
            None => vec![],
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaperResponse {
    open_access_pdf: Option<OpenAccessPdf>,
}

#[derive(Debug, Deserialize)]
struct OpenAccessPdf {
    url: Option<String>,
}

#[async_trait::async_trait]
impl<H: HttpGet> Provider for SemanticScholarProvider<H> {
    fn name(&self) -> &str {
        "semantic_scholar"
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

impl<H: HttpGet> SemanticScholarProvider<H> {
    async fn try_acquire(&self, target: &AcquisitionTarget) -> AttemptOutcome {
        // applicable() guarantees a DOI
        let Some(doi) = target.doi.as_deref() else {
            return AttemptOutcome::Inapplicable;
        };

        let lookup_url = format!("{GRAPH_API}/DOI:{doi}?fields=isOpenAccess,openAccessPdf");
        let paper: PaperResponse = match self
            .transport
            .get_json(&lookup_url, &self.headers())
            .await
        {
            Ok(paper) => paper,
            Err(e) => return outcome_from_error(&e),
        };

        let Some(pdf_url) = paper.open_access_pdf.and_then(|pdf| pdf.url) else {
            tracing::debug!(%doi, "Semantic Scholar has no open access PDF");
            return AttemptOutcome::NotFound;
        };

        match self.transport.get_bytes(&pdf_url, &[]).await {
            Ok(payload) => AttemptOutcome::Success {
                locator: pdf_url,
                payload,
            },
            Err(e) => outcome_from_error(&e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{MockHttp, bytes_response, json_response, status_response};
    use crate::transport::RetryPolicy;
    use folio_core::AppError;

    fn provider(
        responses: Vec<Result<crate::transport::HttpResponse, AppError>>,
    ) -> (SemanticScholarProvider<MockHttp>, MockHttp) {
        let http = MockHttp::with_responses(responses);
        let transport = RetryingTransport::new(http.clone(), RetryPolicy::immediate(1));
        (SemanticScholarProvider::new(transport, None), http)
    }

    fn doi_target() -> AcquisitionTarget {
        crate::testutil::make_target_with("W1", Some("10.1000/abc"), vec![])
    }

    #[test]
    fn test_applicability_requires_doi() {
        let (p, _) = provider(vec![]);
        assert!(p.applicable(&doi_target()));
        assert!(!p.applicable(&crate::testutil::make_target_with("W2", None, vec![])));
    }

    #[tokio::test]
    async fn test_lookup_then_download() {
        let (p, http) = provider(vec![
            json_response(
                200,
                serde_json::json!({"openAccessPdf": {"url": "https://pdfs.test/abc.pdf"}}),
            ),
            bytes_response(200, b"%PDF-1.4"),
        ]);

        let result = p.attempt(&doi_target()).await;
        assert_eq!(
            result.outcome,
            AttemptOutcome::Success {
                locator: "https://pdfs.test/abc.pdf".into(),
                payload: b"%PDF-1.4".to_vec(),
            }
        );
        assert_eq!(http.calls(), 2);
        let urls = http.requested_urls();
        assert!(urls[0].contains("/DOI:10.1000/abc"));
    }

    #[tokio::test]
    async fn test_api_key_header_is_sent() {
        let http = MockHttp::with_responses(vec![json_response(200, serde_json::json!({}))]);
        let transport = RetryingTransport::new(http.clone(), RetryPolicy::immediate(1));
        let p = SemanticScholarProvider::new(transport, Some("sekrit".into()));

        p.attempt(&doi_target()).await;
        assert!(
            http.requested_headers()[0]
                .iter()
                .any(|(k, v)| k == "x-api-key" && v == "sekrit")
        );
    }

    #[tokio::test]
    async fn test_no_open_access_pdf_is_not_found() {
        let (p, _) = provider(vec![json_response(
            200,
            serde_json::json!({"isOpenAccess": false}),
        )]);
        let result = p.attempt(&doi_target()).await;
        assert_eq!(result.outcome, AttemptOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_rate_limit_surfaces_as_rate_limited() {
        let (p, _) = provider(vec![status_response(429)]);
        let result = p.attempt(&doi_target()).await;
        assert_eq!(result.outcome, AttemptOutcome::RateLimited);
    }

    #[tokio::test]
    async fn test_unknown_doi_is_not_found() {
        let (p, _) = provider(vec![status_response(404)]);
        let result = p.attempt(&doi_target()).await;
        assert_eq!(result.outcome, AttemptOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_download_failure_is_transient() {
        let (p, _) = provider(vec![
            json_response(
                200,
                serde_json::json!({"openAccessPdf": {"url": "https://pdfs.test/abc.pdf"}}),
            ),
            status_response(500),
        ]);
        let result = p.attempt(&doi_target()).await;
        assert!(matches!(result.outcome, AttemptOutcome::TransientError(_)));
    }
}
