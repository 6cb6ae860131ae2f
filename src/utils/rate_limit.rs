//! Per-backend request pacing.

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as Governor,
};
use nonzero_ext::nonzero;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

type DirectLimiter = Governor<NotKeyed, InMemoryState, DefaultClock>;

/// Token-bucket limiter owned by a single adapter
///
/// Clones share the same bucket. A non-positive rate disables limiting.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Option<Arc<DirectLimiter>>,
    requests_per_second: f32,
}

impl RateLimiter {
    /// Allow `requests_per_second` calls per second with a burst of one
    ///
    /// Fractional rates below one are expressed as a minimum spacing.
    pub fn per_second(requests_per_second: f32) -> Self {
        let quota = if !requests_per_second.is_finite() || requests_per_second <= 0.0 {
            None
        } else if requests_per_second < 1.0 {
            // a rate too small for a Duration period disables limiting
            Duration::try_from_secs_f32(1.0 / requests_per_second)
                .ok()
                .and_then(Quota::with_period)
        } else {
            let rate =
                NonZeroU32::new(requests_per_second.round() as u32).unwrap_or(nonzero!(1u32));
            Some(Quota::per_second(rate).allow_burst(nonzero!(1u32)))
        };

        Self {
            inner: quota.map(|q| Arc::new(Governor::direct(q))),
            requests_per_second,
        }
    }

    /// A limiter that never blocks
    pub fn unlimited() -> Self {
        Self {
            inner: None,
            requests_per_second: 0.0,
        }
    }

    /// Wait until a request may be sent
    pub async fn wait(&self) {
        if let Some(limiter) = &self.inner {
            limiter.until_ready().await;
        }
    }

    /// Take a permit if one is available right now
    pub fn try_acquire(&self) -> bool {
        match &self.inner {
            Some(limiter) => limiter.check().is_ok(),
            None => true,
        }
    }

    pub fn requests_per_second(&self) -> f32 {
        self.requests_per_second
    }

    pub fn is_limited(&self) -> bool {
        self.inner.is_some()
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("requests_per_second", &self.requests_per_second)
            .field("limited", &self.is_limited())
            .finish()
    }
}
