//! Token-bucket rate limiting for outbound catalog requests.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::Quota;
use reelmatch_common::{Error, Result};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

type DirectLimiter = governor::RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Shared request limiter: `rate` requests per second steady state, with
/// bursts of up to `burst` requests.
///
/// Waiters are served in arrival order. A waiter whose cancellation token
/// fires gives up its place and gets [`Error::Cancelled`].
pub struct RateLimiter {
    limiter: DirectLimiter,
    // tokio's mutex is FIFO, which makes token acquisition fair.
    gate: Mutex<()>,
}

impl RateLimiter {
    pub fn new(rate: f64, burst: u32) -> Result<Self> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(Error::validation(format!(
                "rate limit must be positive, got {rate}"
            )));
        }
        let burst = NonZeroU32::new(burst)
            .ok_or_else(|| Error::validation("burst must be at least 1"))?;

        let quota = Quota::with_period(Duration::from_secs_f64(1.0 / rate))
            .ok_or_else(|| Error::validation(format!("rate limit {rate} is too high")))?
            .allow_burst(burst);

        Ok(Self {
            limiter: governor::RateLimiter::direct(quota),
            gate: Mutex::new(()),
        })
    }

    /// Wait until a request may be sent.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            _ = async {
                let _turn = self.gate.lock().await;
                self.limiter.until_ready().await;
            } => Ok(()),
        }
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter").finish_non_exhaustive()
    }
}
