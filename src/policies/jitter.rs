//! # Spreading retries across a fleet.
//!
//! When a platform outage hits every agent at once, they all fail the same iteration and,
//! left alone, retry in lockstep. [`JitterPolicy::Spread`] draws each pause from the upper
//! quarter below the computed delay, so agents drift apart while no pause ever exceeds the
//! backoff cap or drops under the idle interval.

use std::time::Duration;

use rand::Rng;

/// Randomization applied to a backoff pause.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JitterPolicy {
    /// Use the delay as computed.
    #[default]
    None,
    /// Uniform in `[max(delay × 3/4, floor), delay]`.
    Spread,
}

impl JitterPolicy {
    /// Applies jitter to `delay`, never going under `floor`.
    pub fn apply(&self, delay: Duration, floor: Duration) -> Duration {
        match self {
            JitterPolicy::None => delay,
            JitterPolicy::Spread => {
                let high = delay.as_millis() as u64;
                let low = (high - high / 4).max(floor.as_millis() as u64);
                if low >= high {
                    return delay;
                }
                Duration::from_millis(rand::rng().random_range(low..=high))
            }
        }
    }
}
