//! Failure handling policies.
//!
//! This module groups the knobs that control **whether** the agent keeps running after a
//! backend failure and **how long** it waits before the next attempt.
//!
//! ## Contents
//! - [`FailurePolicy`] stop on backend errors, or retry them
//! - [`BackoffPolicy`] how retry pauses grow (interval doubling, capped)
//! - [`JitterPolicy`]  spread so a fleet does not retry in lockstep
//!
//! ## Quick wiring
//! ```text
//! AgentConfig { interval, on_backend_error: FailurePolicy }
//!      └─► core::agent::Agent::run uses:
//!           - interval after every successful iteration
//!           - on_backend_error.next_delay(err, failures, interval) after a failed one
//! ```
//!
//! ## Defaults
//! - `FailurePolicy::Propagate`: a backend failure stops the loop.
//! - `BackoffPolicy::default()` → cap=5min, jitter=Spread.

mod backoff;
mod failure;
mod jitter;

pub use backoff::BackoffPolicy;
pub use failure::FailurePolicy;
pub use jitter::JitterPolicy;
