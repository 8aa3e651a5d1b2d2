//! # Agent: the per-instance control loop.
//!
//! Drives one [`Provider`] and a fixed [`ApplicationSet`] through the
//! mark → poll → dispatch → idle cycle until cancelled or until a backend failure is not
//! absorbed by the [`FailurePolicy`](crate::FailurePolicy).
//!
//! ## Architecture
//! ```text
//! Agent::builder(provider) ──► AgentBuilder ──► Agent::run(token)
//!
//! loop {
//!   ├─► token cancelled? ─► exit Ok
//!   ├─► run_once(provider, apps)
//!   │       ├─ Ok(iteration)  ─► failures = 0, delay = interval
//!   │       └─ Err(backend)   ─► on_backend_error.next_delay(err, failures, interval)
//!   │                             ├─ None       ─► exit Err(RuntimeError::Backend)
//!   │                             └─ Some(d)    ─► failures += 1, delay = d
//!   └─► sleep(delay) (cancellable)
//! }
//! ```
//!
//! ## Rules
//! - Iterations run **sequentially**, never overlapping
//! - Cancellation is honoured at **safe points** only: before an iteration and during the
//!   idle sleep; a batch that started dispatching is always finished
//! - The idle sleep follows **every** iteration, including empty ones

use std::time::Duration;

use tokio::{select, time};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::apps::ApplicationSet;
use crate::core::builder::AgentBuilder;
use crate::core::config::AgentConfig;
use crate::core::runner::{Iteration, run_once};
use crate::core::shutdown;
use crate::error::RuntimeError;
use crate::provider::{Provider, ProviderRef};

/// Per-instance control loop.
///
/// Built through [`Agent::builder`]; the application set and config are fixed from then on.
pub struct Agent {
    pub(crate) provider: ProviderRef,
    pub(crate) apps: ApplicationSet,
    pub(crate) cfg: AgentConfig,
}

impl Agent {
    /// Starts building an agent around `provider`.
    pub fn builder(provider: ProviderRef) -> AgentBuilder {
        AgentBuilder::new(provider)
    }

    /// The provider this agent drives.
    pub fn provider(&self) -> &ProviderRef {
        &self.provider
    }

    /// Registered applications, in dispatch order.
    pub fn applications(&self) -> &ApplicationSet {
        &self.apps
    }

    pub fn config(&self) -> &AgentConfig {
        &self.cfg
    }

    /// Runs a single iteration without idling.
    pub async fn run_once(&self) -> Result<Iteration, RuntimeError> {
        run_once(self.provider.as_ref(), &self.apps).await
    }

    /// Runs the loop until `token` is cancelled or a backend failure stops it.
    ///
    /// ### Exit conditions
    /// - `token` cancelled → `Ok(())`
    /// - provider error rejected by the failure policy → `Err(RuntimeError::Backend)`
    ///
    /// ### Cancellation semantics
    /// - Checked before each iteration and raced against the idle sleep
    /// - Never interrupts an iteration in progress
    pub async fn run(&self, token: CancellationToken) -> Result<(), RuntimeError> {
        let interval = self.cfg.interval;
        let mut failures: u32 = 0;

        info!(
            provider = self.provider.name(),
            applications = ?self.apps.names(),
            interval = ?interval,
            "agent loop starting"
        );
        self.log_enrollment().await;

        loop {
            if token.is_cancelled() {
                break;
            }
            debug!("loop");

            let delay = match self.run_once().await {
                Ok(iteration) => {
                    failures = 0;
                    debug!(
                        polled = iteration.polled,
                        skipped = iteration.skipped,
                        invoked = iteration.invoked,
                        failed = iteration.failed,
                        enrolled = iteration.enrolled,
                        "iteration complete"
                    );
                    interval
                }
                Err(err) => self.on_failure(err, &mut failures, interval)?,
            };

            let sleep = time::sleep(delay);
            tokio::pin!(sleep);
            select! {
                _ = &mut sleep => {}
                _ = token.cancelled() => { break; }
            }
        }

        info!(provider = self.provider.name(), "agent loop stopped");
        Ok(())
    }

    /// Runs the loop until SIGINT/SIGTERM/SIGQUIT (Ctrl-C on non-unix) or a backend failure.
    ///
    /// If signal handlers cannot be installed the loop is stopped at its next safe point and
    /// [`RuntimeError::Signal`] is returned.
    pub async fn run_until_signal(&self) -> Result<(), RuntimeError> {
        let token = CancellationToken::new();
        let run = self.run(token.clone());
        tokio::pin!(run);

        select! {
            res = &mut run => res,
            signal = shutdown::wait_for_shutdown_signal() => {
                token.cancel();
                match signal {
                    Ok(name) => {
                        info!(signal = name, "shutdown requested");
                        run.await
                    }
                    Err(error) => {
                        run.await?;
                        Err(RuntimeError::Signal { error })
                    }
                }
            }
        }
    }

    /// Decides whether a failed iteration stops the loop, and for how long to pause if not.
    fn on_failure(
        &self,
        err: RuntimeError,
        failures: &mut u32,
        interval: Duration,
    ) -> Result<Duration, RuntimeError> {
        let next = err
            .provider_error()
            .and_then(|e| self.cfg.on_backend_error.next_delay(e, *failures, interval));

        match next {
            Some(delay) => {
                *failures = failures.saturating_add(1);
                warn!(
                    error = %err,
                    failures = *failures,
                    retry_in = ?delay,
                    "iteration failed, retrying"
                );
                Ok(delay)
            }
            None => {
                error!(error = %err, label = err.as_label(), "iteration failed, stopping");
                Err(err)
            }
        }
    }

    async fn log_enrollment(&self) {
        match self.provider.is_enrolled().await {
            Ok(enrolled) => info!(enrolled, "enrollment status"),
            Err(err) => warn!(error = %err, "could not read enrollment status"),
        }
    }
}
