//! Per-provider circuit breaking for upstream rate limits.
//!
//! Each provider gets its own failure tracker, created lazily on first
//! use and shared across all jobs: a rate limit is a property of the
//! upstream service, not of any one job. Only rate-limit failures count
//! toward opening a breaker; generic transient errors are the
//! transport's problem and never trip it.
//!
//! # States
//!
//! ```text
//! CLOSED --[threshold consecutive 429s]--> OPEN --[cooldown elapses]--> (half-open)
//!   ^                                                                       |
//!   |                      success                                          |
//!   +--------------------------<--------------------------------------------+
//!                                         rate-limit failure re-opens with a fresh timestamp
//! ```
//!
//! Half-open is implicit: once the cooldown has elapsed, `is_open`
//! returns false and the next call is allowed through as a probe. State
//! is per-process and never persisted; a restart starts every breaker
//! closed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Classification of a recorded failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// HTTP 429 after the transport exhausted its retries.
    RateLimited,
    /// Anything else that went wrong; tracked for logging only.
    Transient,
}

/// Configuration for breaker behavior, shared by all providers.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive rate-limit failures before a provider's breaker opens.
    pub failure_threshold: u32,

    /// How long an open breaker rejects calls before allowing a probe.
    pub cooldown: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            cooldown: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Default)]
struct BreakerState {
    consecutive_failures: u32,
    opened_at: Option<Instant>,
}

/// Thread-safe registry of per-provider breakers.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct ProviderBreakers {
    config: CircuitBreakerConfig,
    inner: Arc<Mutex<HashMap<String, BreakerState>>>,
}

impl ProviderBreakers {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Acquires the registry lock, recovering from poison if necessary.
    fn lock_inner(&self) -> std::sync::MutexGuard<'_, HashMap<String, BreakerState>> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Recovered from poisoned breaker mutex");
            poisoned.into_inner()
        })
    }

    /// Whether calls to this provider should currently be skipped.
    ///
    /// Returns false once the cooldown has elapsed even though the
    /// breaker has not been reset: the next call is the probe that
    /// decides whether it closes (via [`record_success`](Self::record_success))
    /// or re-opens.
    pub fn is_open(&self, provider: &str) -> bool {
        let inner = self.lock_inner();
        match inner.get(provider).and_then(|s| s.opened_at) {
            Some(opened_at) => opened_at.elapsed() <= self.config.cooldown,
            None => false,
        }
    }

    /// Record a successful call: closes the breaker and forgives any
    /// accumulated failures.
    pub fn record_success(&self, provider: &str) {
        let mut inner = self.lock_inner();
        let state = inner.entry(provider.to_string()).or_default();
        if state.opened_at.is_some() {
            tracing::info!(%provider, "Circuit breaker closing after successful probe");
        }
        state.consecutive_failures = 0;
        state.opened_at = None;
    }

    /// Record a failed call. Only `FailureKind::RateLimited` moves the
    /// counter; reaching the threshold opens (or re-opens) the breaker
    /// with a fresh timestamp.
    pub fn record_failure(&self, provider: &str, kind: FailureKind) {
        if kind != FailureKind::RateLimited {
            return;
        }

        let mut inner = self.lock_inner();
        let state = inner.entry(provider.to_string()).or_default();
        state.consecutive_failures += 1;

        if state.consecutive_failures >= self.config.failure_threshold {
            if state.opened_at.is_none() {
                tracing::warn!(
                    %provider,
                    failures = state.consecutive_failures,
                    cooldown_secs = self.config.cooldown.as_secs(),
                    "Circuit breaker opening after consecutive rate limits"
                );
            }
            state.opened_at = Some(Instant::now());
        }
    }

    /// Consecutive rate-limit failures recorded for a provider.
    pub fn failure_count(&self, provider: &str) -> u32 {
        let inner = self.lock_inner();
        inner
            .get(provider)
            .map(|s| s.consecutive_failures)
            .unwrap_or(0)
    }
}

impl Default for ProviderBreakers {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}
