//! HTTP plumbing shared by the catalog clients: client construction and
//! bounded retries with capped exponential backoff.

use std::time::Duration;

use reelmatch_common::{Error, Result};
use reqwest::{RequestBuilder, Response, StatusCode};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::rate_limit::RateLimiter;

/// Upper bound for any single backoff sleep, including `Retry-After`.
pub const MAX_BACKOFF: Duration = Duration::from_secs(10);

const USER_AGENT: &str = concat!("reelmatch/", env!("CARGO_PKG_VERSION"));

/// When and how often to retry a request.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
    /// Retry on 429 as well as on 5xx and transport failures.
    pub retry_rate_limited: bool,
}

impl RetryPolicy {
    /// Backoff before retry number `attempt` (0-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.backoff.saturating_mul(factor).min(MAX_BACKOFF)
    }

    fn should_retry(&self, status: StatusCode) -> bool {
        status.is_server_error() || (self.retry_rate_limited && status == StatusCode::TOO_MANY_REQUESTS)
    }
}

/// Build a reqwest client with the given per-request timeout.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| Error::internal(format!("failed to build HTTP client: {e}")))
}

/// Send a request, retrying transport failures and retryable statuses.
///
/// `make` builds a fresh request for each attempt. When a limiter is given,
/// every attempt acquires from it first. The final response is returned
/// whatever its status; classification is left to the caller. Transport
/// failures that outlast the retries become [`Error::Unavailable`].
pub async fn send_with_retry<F>(
    label: &str,
    policy: RetryPolicy,
    limiter: Option<&RateLimiter>,
    cancel: &CancellationToken,
    mut make: F,
) -> Result<Response>
where
    F: FnMut() -> RequestBuilder,
{
    let mut attempt = 0u32;
    loop {
        if let Some(limiter) = limiter {
            limiter.acquire(cancel).await?;
        } else if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let sent = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            r = make().send() => r,
        };

        let wait = match sent {
            Ok(resp) if attempt < policy.max_retries && policy.should_retry(resp.status()) => {
                let wait = retry_after(&resp).unwrap_or_else(|| policy.delay(attempt));
                warn!(
                    request = label,
                    status = resp.status().as_u16(),
                    retry = attempt + 1,
                    wait_ms = wait.as_millis() as u64,
                    "Retryable response, backing off"
                );
                wait
            }
            Ok(resp) => {
                debug!(request = label, status = resp.status().as_u16(), "Response received");
                return Ok(resp);
            }
            Err(e) if attempt < policy.max_retries => {
                let wait = policy.delay(attempt);
                warn!(
                    request = label,
                    error = %e,
                    retry = attempt + 1,
                    wait_ms = wait.as_millis() as u64,
                    "Request failed, backing off"
                );
                wait
            }
            Err(e) => {
                return Err(Error::Unavailable(format!("{label}: {e}")));
            }
        };

        attempt += 1;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            _ = tokio::time::sleep(wait) => {}
        }
    }
}

/// Parse a `Retry-After` header given in seconds, capped at [`MAX_BACKOFF`].
fn retry_after(resp: &Response) -> Option<Duration> {
    resp.headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(|secs| Duration::from_secs(secs).min(MAX_BACKOFF))
}
