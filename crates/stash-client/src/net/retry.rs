//! Bounded retries with full-jitter exponential backoff.
//!
//! Every attempt runs under an absolute per-attempt timeout merged with the
//! caller's cancellation token. Attempts are strictly sequential — a retry is
//! only scheduled after the previous attempt has fully failed, so no two
//! requests for the same logical call are ever in flight at once.
//!
//! The retry predicate is narrow: HTTP 500/502/503/504, or a transport error
//! that [`classify`](super::classify::classify) recognises as transient.
//! Everything else — 4xx responses included — propagates immediately.

use std::time::Duration;

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use hyper_util::client::legacy::{connect::Connect, Client};
use rand::Rng;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::classify::{classify, TransientFault};

/// Absolute time budget for a single attempt.
pub const ATTEMPT_TIMEOUT: Duration = Duration::from_secs(15);

/// Upper bound on any single backoff delay.
pub const MAX_BACKOFF: Duration = Duration::from_secs(10);

/// Upper bound on the uniform jitter added to each delay, in milliseconds.
pub const MAX_JITTER_MS: u64 = 1000;

/// Retry tuning: how many retries beyond the first attempt, and the backoff
/// base. Constructed once at startup and passed in explicitly.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the initial attempt; total attempts = `max_retries + 1`.
    pub max_retries: u32,
    /// Backoff base; the delay before retry `n` starts at `base * 2^n`.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Total number of attempts this policy allows.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

/// Errors surfaced by [`send`] once retries are settled.
#[derive(Debug, Error)]
pub enum RequestError {
    /// A transient fault persisted through every attempt.
    #[error("{fault} after {attempts} attempts")]
    Transient {
        fault: TransientFault,
        attempts: u32,
    },

    /// The backend kept answering with a retryable 5xx status.
    #[error("HTTP {status} after {attempts} attempts")]
    ExhaustedStatus { status: u16, attempts: u32 },

    /// A non-retryable transport failure.
    #[error("request failed: {0}")]
    Fatal(String),

    /// The caller's cancellation token fired.
    #[error("request cancelled")]
    Cancelled,
}

impl From<RequestError> for common::StashError {
    fn from(e: RequestError) -> Self {
        match e {
            RequestError::Cancelled => common::StashError::Cancelled,
            RequestError::ExhaustedStatus { status, attempts } => {
                common::StashError::Remote { status, attempts }
            }
            other => common::StashError::Network(other.to_string()),
        }
    }
}

/// Compute the backoff delay before retry number `attempt` (zero-indexed).
///
/// `min(base * 2^attempt + jitter, MAX_BACKOFF)` — full jitter plus a cap,
/// so concurrent clients spread out without unbounded worst-case latency.
/// Pure so the bounds are unit-testable; [`send`] draws `jitter_ms` fresh
/// per retry.
pub fn backoff_delay(base: Duration, attempt: u32, jitter_ms: u64) -> Duration {
    let exponential = base.saturating_mul(2u32.saturating_pow(attempt));
    exponential
        .saturating_add(Duration::from_millis(jitter_ms))
        .min(MAX_BACKOFF)
}

fn jitter_ms() -> u64 {
    rand::thread_rng().gen_range(0..=MAX_JITTER_MS)
}

fn is_retryable_status(status: StatusCode) -> bool {
    matches!(status.as_u16(), 500 | 502 | 503 | 504)
}

/// Execute a request with retries, backoff, per-attempt timeout, and
/// cooperative cancellation.
///
/// `make_request` is invoked once per attempt so each retry carries a fresh
/// body. An already-cancelled token fails before any request is issued.
/// Non-2xx statuses outside the 5xx retry set are **returned**, not raised —
/// mapping them is the caller's concern.
///
/// # Errors
///
/// [`RequestError::Cancelled`] when the token fires at any suspension point;
/// [`RequestError::Transient`] / [`RequestError::ExhaustedStatus`] when
/// retries run out; [`RequestError::Fatal`] for non-retryable failures.
pub async fn send<C, F>(
    client: &Client<C, Full<Bytes>>,
    make_request: F,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
) -> Result<Response<Incoming>, RequestError>
where
    C: Connect + Clone + Send + Sync + 'static,
    F: Fn() -> Result<Request<Full<Bytes>>, hyper::http::Error>,
{
    let max_attempts = policy.max_attempts();
    let mut attempt = 0u32;

    loop {
        if cancel.is_cancelled() {
            return Err(RequestError::Cancelled);
        }

        let request = make_request().map_err(|e| RequestError::Fatal(e.to_string()))?;

        let outcome = tokio::select! {
            _ = cancel.cancelled() => return Err(RequestError::Cancelled),
            result = tokio::time::timeout(ATTEMPT_TIMEOUT, client.request(request)) => result,
        };

        let fault = match outcome {
            Ok(Ok(response)) => {
                let status = response.status();
                if !is_retryable_status(status) {
                    return Ok(response);
                }
                if attempt + 1 >= max_attempts {
                    return Err(RequestError::ExhaustedStatus {
                        status: status.as_u16(),
                        attempts: max_attempts,
                    });
                }
                debug!(status = status.as_u16(), attempt, "retryable status");
                None
            }
            Ok(Err(error)) => match classify(&error) {
                Some(fault) if attempt + 1 < max_attempts => Some(fault),
                Some(fault) => {
                    return Err(RequestError::Transient {
                        fault,
                        attempts: max_attempts,
                    })
                }
                None => return Err(RequestError::Fatal(error.to_string())),
            },
            Err(_elapsed) => {
                if attempt + 1 < max_attempts {
                    Some(TransientFault::Timeout)
                } else {
                    return Err(RequestError::Transient {
                        fault: TransientFault::Timeout,
                        attempts: max_attempts,
                    });
                }
            }
        };

        let delay = backoff_delay(policy.base_delay, attempt, jitter_ms());
        warn!(
            ?fault,
            attempt,
            delay_ms = delay.as_millis() as u64,
            "attempt failed; backing off"
        );
        tokio::select! {
            _ = cancel.cancelled() => return Err(RequestError::Cancelled),
            _ = tokio::time::sleep(delay) => {}
        }
        attempt += 1;
    }
}
