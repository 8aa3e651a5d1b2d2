//! # Agent configuration.
//!
//! Provides [`AgentConfig`]: the settings of one agent loop.
//!
//! Config is consumed by [`AgentBuilder::build`](crate::AgentBuilder::build), which validates
//! it before the loop can start.

use std::time::Duration;

use crate::error::ConfigError;
use crate::policies::FailurePolicy;

/// Default idle pause between iterations.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

/// Settings for the agent loop.
///
/// ## Field semantics
/// - `interval`: pause after each iteration (must be non-zero)
/// - `on_backend_error`: reaction to a failed mark/poll call
#[derive(Clone, Debug, PartialEq)]
pub struct AgentConfig {
    /// Idle pause between the end of one iteration and the start of the next.
    pub interval: Duration,

    /// What to do when the provider fails during an iteration.
    ///
    /// The default, [`FailurePolicy::Propagate`], stops the loop with the error.
    pub on_backend_error: FailurePolicy,
}

impl AgentConfig {
    /// Checks the configuration before the loop starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        Ok(())
    }
}

impl Default for AgentConfig {
    /// `interval = 5s`, `on_backend_error = Propagate`.
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            on_backend_error: FailurePolicy::Propagate,
        }
    }
}
