//! # What the agent does when the backend fails.
//!
//! [`FailurePolicy`] applies to provider errors raised while marking or polling; it never
//! applies to application callbacks, which are always isolated.
//!
//! ```text
//! iteration ── Err(ProviderError) ──┬─ Propagate             ─► loop returns RuntimeError::Backend
//!                                   └─ Retry(backoff)
//!                                        ├─ !is_retryable()  ─► loop returns RuntimeError::Backend
//!                                        └─ is_retryable()   ─► wait backoff.delay(n, interval), next iteration
//! ```

use std::time::Duration;

use crate::error::ProviderError;
use crate::policies::BackoffPolicy;

/// Reaction to a failed iteration.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum FailurePolicy {
    /// Stop the loop and surface the error (default).
    #[default]
    Propagate,
    /// Log retryable errors and try again after a backoff delay.
    Retry(BackoffPolicy),
}

impl FailurePolicy {
    /// Retries after one regular idle interval, without growth or jitter.
    pub fn retry_fixed() -> Self {
        FailurePolicy::Retry(BackoffPolicy::fixed())
    }

    /// Returns the pause before the next iteration, or `None` when the loop must stop.
    ///
    /// `failures` counts consecutive failed iterations before this one. The pause is never
    /// shorter than `interval`.
    pub fn next_delay(
        &self,
        err: &ProviderError,
        failures: u32,
        interval: Duration,
    ) -> Option<Duration> {
        match self {
            FailurePolicy::Propagate => None,
            FailurePolicy::Retry(_) if !err.is_retryable() => None,
            FailurePolicy::Retry(backoff) => Some(backoff.delay(failures, interval)),
        }
    }
}
