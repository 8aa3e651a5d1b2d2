//! Agent core: the control loop and its construction.
//!
//! The public API from this module is [`Agent`] (the loop), [`AgentBuilder`] (fail-fast
//! construction), [`AgentConfig`] and the per-iteration report [`Iteration`].
//!
//! Internal modules:
//! - [`runner`]: one mark → poll → dispatch pass;
//! - [`agent`]: the periodic loop with idle sleep, failure policy and cancellation;
//! - [`builder`]: validation and freezing of the application set;
//! - [`shutdown`]: cross-platform shutdown signal handling.

mod agent;
mod builder;
mod config;
mod runner;
mod shutdown;

pub use agent::Agent;
pub use builder::AgentBuilder;
pub use config::{AgentConfig, DEFAULT_INTERVAL};
pub use runner::{Iteration, run_once};
