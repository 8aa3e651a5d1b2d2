//! # Backoff after backend failures.
//!
//! [`BackoffPolicy`] stretches the idle pause while the platform keeps failing. It works in
//! units of the agent's own interval: after `n` consecutive failed iterations the pause is
//! `interval × 2^n`, held under `cap`, then optionally spread by [`JitterPolicy`].
//!
//! The pause is never shorter than the interval, so a failing agent never polls the platform
//! faster than a healthy one.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use joule::{BackoffPolicy, JitterPolicy};
//!
//! let backoff = BackoffPolicy {
//!     cap: Duration::from_secs(60),
//!     jitter: JitterPolicy::None,
//! };
//! let interval = Duration::from_secs(5);
//!
//! assert_eq!(backoff.delay(0, interval), Duration::from_secs(5));
//! assert_eq!(backoff.delay(2, interval), Duration::from_secs(20));
//! assert_eq!(backoff.delay(9, interval), Duration::from_secs(60));
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Pause schedule for an agent whose backend keeps failing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Longest pause; a cap below the interval means "always wait one interval".
    pub cap: Duration,
    /// Spread applied so a fleet hit by the same outage does not retry in lockstep.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// `cap = 5min`, `jitter = Spread`.
    fn default() -> Self {
        Self {
            cap: Duration::from_secs(300),
            jitter: JitterPolicy::Spread,
        }
    }
}

impl BackoffPolicy {
    /// Retries after exactly one interval, every time.
    pub fn fixed() -> Self {
        Self {
            cap: Duration::ZERO,
            jitter: JitterPolicy::None,
        }
    }

    /// Pause after `failures` consecutive failed iterations (0 for the first one).
    pub fn delay(&self, failures: u32, interval: Duration) -> Duration {
        let ceiling = self.cap.max(interval);
        let growth = 1u32.checked_shl(failures).unwrap_or(u32::MAX);
        let delay = interval.saturating_mul(growth).min(ceiling);
        self.jitter.apply(delay, interval)
    }
}
