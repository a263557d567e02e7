//! HTTP transport with bounded retries.
//!
//! One attempt either succeeds, fails terminally, or fails retryably.
//! Retryable failures (429, 500, 502, 503, 504, timeouts, connection
//! errors) are re-tried with doubling backoff plus jitter until the
//! attempt budget runs out, at which point the last failure surfaces
//! unchanged so callers can tell a rate limit from a flaky network.
//! A 404 is an answer, not a failure, and is never retried.

use std::future::Future;
use std::time::Duration;

use folio_core::AppError;
use reqwest::Client;
use serde::de::DeserializeOwned;

/// One HTTP response, already drained.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// A single-attempt HTTP GET. The retry layer sits on top of this seam,
/// which is also where tests inject scripted responses.
pub trait HttpGet: Send + Sync + Clone {
    fn get(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> impl Future<Output = Result<HttpResponse, AppError>> + Send;
}

/// reqwest-backed [`HttpGet`] with a per-attempt timeout.
#[derive(Clone)]
pub struct ReqwestHttp {
    client: Client,
    timeout_secs: u64,
}

impl ReqwestHttp {
    pub fn new() -> Result<Self, AppError> {
        Self::with_timeout(Duration::from_secs(30))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, AppError> {
        let timeout_secs = timeout.as_secs();
        let client = Client::builder()
            .user_agent("Folio/0.2 (document retriever)")
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::NetworkError(e.to_string()))?;
        Ok(Self {
            client,
            timeout_secs,
        })
    }
}

impl HttpGet for ReqwestHttp {
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse, AppError> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout(self.timeout_secs)
            } else if e.is_connect() {
                AppError::NetworkError(format!("Connection failed: {e}"))
            } else {
                AppError::NetworkError(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| AppError::NetworkError(format!("Failed to read response body: {e}")))?
            .to_vec();

        Ok(HttpResponse { status, body })
    }
}

/// Retry budget and pacing.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,

    /// Backoff before the second attempt; doubles each retry, with
    /// uniform jitter of up to half the step added on top.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Policy with no sleeping, for tests.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
        }
    }

    fn backoff(&self, completed_attempts: u32) -> Duration {
        let step = self.base_delay * 2u32.saturating_pow(completed_attempts.saturating_sub(1));
        let jitter_ms = rand_jitter_ms(step.as_millis() as u64 / 2);
        step + Duration::from_millis(jitter_ms)
    }
}

/// [`HttpGet`] wrapper that retries retryable failures.
#[derive(Clone)]
pub struct RetryingTransport<H: HttpGet> {
    inner: H,
    policy: RetryPolicy,
}

impl<H: HttpGet> RetryingTransport<H> {
    pub fn new(inner: H, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// GET the URL, retrying per policy. Returns the body on 2xx and an
    /// [`AppError`] classifying the final failure otherwise.
    pub async fn get_bytes(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<Vec<u8>, AppError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let error = match self.inner.get(url, headers).await {
                Ok(response) => match classify_status(response.status, url) {
                    Ok(()) => return Ok(response.body),
                    Err(e) => e,
                },
                Err(e) => e,
            };

            if !error.is_retryable() || attempt >= self.policy.max_attempts {
                return Err(error);
            }

            let backoff = self.policy.backoff(attempt);
            tracing::debug!(
                %url,
                attempt,
                backoff_ms = backoff.as_millis() as u64,
                error = %error,
                "Retrying request"
            );
            tokio::time::sleep(backoff).await;
        }
    }

    /// GET and deserialize a JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<T, AppError> {
        let body = self.get_bytes(url, headers).await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

fn classify_status(status: u16, url: &str) -> Result<(), AppError> {
    match status {
        200..=299 => Ok(()),
        404 => Err(AppError::NotFound),
        429 => Err(AppError::RateLimitExceeded),
        _ => Err(AppError::HttpStatus {
            status,
            url: url.to_string(),
        }),
    }
}

// Hand-rolled jitter so the transport does not need the `rand` crate.
// Uses a simple xorshift seeded from the current time.
fn rand_jitter_ms(max_ms: u64) -> u64 {
    if max_ms == 0 {
        return 0;
    }
    let mut x = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64;
    // xorshift64
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    x % max_ms
}
