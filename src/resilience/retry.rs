//! Cold-start-aware retry executor for upstream requests.
//!
//! # Responsibilities
//! - Wrap one logical upstream call with a per-attempt deadline
//! - Retry transport-level failures while budget remains
//! - Return HTTP error responses untouched (never retried)
//!
//! # Design Decisions
//! - First attempt gets a long deadline: the backend's free-tier host
//!   suspends idle instances and needs time to wake
//! - Retries use a shorter deadline; the failed attempt already woke it
//! - Backoff grows as the budget drains; no jitter, the sequence is
//!   per-call and never synchronized across clients

use std::time::Duration;

use reqwest::{RequestBuilder, Response};
use thiserror::Error;

use crate::config::RetryConfig;

/// Deadline for the first attempt against a possibly sleeping backend.
pub const COLD_START_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Deadline for retry attempts once the backend is presumed warm.
pub const WARM_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Default number of additional attempts after the first failure.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Retry policy for a single logical upstream call.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Additional attempts after the first failure.
    pub max_retries: u32,

    /// Deadline for the first attempt.
    pub cold_start_timeout: Duration,

    /// Deadline for every retry attempt.
    pub warm_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            cold_start_timeout: COLD_START_TIMEOUT,
            warm_timeout: WARM_TIMEOUT,
        }
    }
}

impl From<RetryConfig> for RetryPolicy {
    fn from(config: RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            cold_start_timeout: Duration::from_millis(config.cold_start_timeout_ms),
            warm_timeout: Duration::from_millis(config.warm_timeout_ms),
        }
    }
}

/// Failure to obtain any response from the upstream.
///
/// HTTP error statuses are not represented here; a response with a 5xx status
/// is still a successful fetch from this module's point of view.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The attempt did not complete before its deadline. Dropping the send
    /// future aborts the in-flight request.
    #[error("upstream request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// The transport failed before a response arrived, or the request could
    /// not be built at all.
    #[error("upstream transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl FetchError {
    /// Whether this failure looks like a sleeping backend rather than a
    /// caller bug. Only these failures are worth a retry.
    pub fn is_cold_start_symptom(&self) -> bool {
        match self {
            FetchError::Timeout(_) => true,
            FetchError::Transport(e) => {
                if e.is_builder() || e.is_redirect() || e.is_decode() {
                    return false;
                }
                e.is_timeout() || e.is_connect() || e.is_request()
            }
        }
    }
}

/// Delay inserted after a failed attempt, computed from the budget before it
/// is spent: `1000 * (3 - retries_remaining)` ms, so the wait grows as the
/// budget drains. Saturates at zero for budgets larger than three.
pub fn retry_backoff(retries_remaining: u32) -> Duration {
    Duration::from_millis(1_000 * 3u64.saturating_sub(u64::from(retries_remaining)))
}

/// Execute a request with a per-attempt deadline and bounded retries.
///
/// An attempt succeeds the moment the transport returns a response, whatever
/// the HTTP status; callers interpret non-2xx themselves. Only failures
/// classified by [`FetchError::is_cold_start_symptom`] consume retry budget,
/// and the error that exhausts the budget propagates unchanged.
///
/// A request whose body cannot be replayed (streaming) gets exactly one
/// attempt.
pub async fn fetch_with_retry(
    request: RequestBuilder,
    policy: &RetryPolicy,
) -> Result<Response, FetchError> {
    let mut retries_remaining = policy.max_retries;
    let mut attempt_timeout = policy.cold_start_timeout;

    loop {
        let attempt = match request.try_clone() {
            Some(builder) => builder,
            // Streaming body: nothing to replay, single shot.
            None => return send_once(request, attempt_timeout).await,
        };

        match send_once(attempt, attempt_timeout).await {
            Ok(response) => return Ok(response),
            Err(err) if retries_remaining > 0 && err.is_cold_start_symptom() => {
                let delay = retry_backoff(retries_remaining);
                tracing::info!(
                    retries_remaining,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Upstream attempt failed, retrying"
                );
                crate::observability::metrics::record_upstream_retry();
                tokio::time::sleep(delay).await;
                retries_remaining -= 1;
                attempt_timeout = policy.warm_timeout;
            }
            Err(err) => return Err(err),
        }
    }
}

async fn send_once(attempt: RequestBuilder, deadline: Duration) -> Result<Response, FetchError> {
    match tokio::time::timeout(deadline, attempt.send()).await {
        Ok(Ok(response)) => Ok(response),
        Ok(Err(e)) => Err(FetchError::Transport(e)),
        Err(_) => Err(FetchError::Timeout(deadline)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_as_budget_drains() {
        // Default budget of 2: first retry waits 1s, second waits 2s.
        assert_eq!(retry_backoff(2), Duration::from_millis(1_000));
        assert_eq!(retry_backoff(1), Duration::from_millis(2_000));
        assert_eq!(retry_backoff(0), Duration::from_millis(3_000));
    }

    #[test]
    fn backoff_clamps_for_oversized_budgets() {
        assert_eq!(retry_backoff(3), Duration::ZERO);
        assert_eq!(retry_backoff(10), Duration::ZERO);
    }

    #[test]
    fn timeout_is_cold_start_symptom() {
        assert!(FetchError::Timeout(WARM_TIMEOUT).is_cold_start_symptom());
    }

    #[test]
    fn policy_from_config() {
        let policy = RetryPolicy::from(crate::config::RetryConfig::default());
        assert_eq!(policy.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(policy.cold_start_timeout, COLD_START_TIMEOUT);
        assert_eq!(policy.warm_timeout, WARM_TIMEOUT);
    }
}
