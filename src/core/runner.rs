//! # Run a single iteration of the agent loop.
//!
//! One iteration marks the local instance essential, polls one batch from the message channel
//! and dispatches every event of that batch to the applications.
//!
//! ## Flow
//! ```text
//! mark_essential() ── Err ─► return Backend{MarkEssential}       (nothing polled)
//!        │
//! get_events_from_message_queue() ── Err ─► return Backend{Poll} (nothing dispatched)
//!        │
//! for entry in batch (queue order):
//!   ├─ Err(DecodeError) ─► warn, skipped += 1
//!   └─ Ok(event)
//!        ├─ JOIN      ─► join() on the target app(s) ─► mark_enrolled()
//!        ├─ LAUNCH    ─► launch() on every app
//!        └─ TERMINATE ─► terminate() on every app
//! ```
//!
//! ## Rules
//! - `mark_essential` runs **exactly once**, before any dispatch
//! - `mark_enrolled` runs **exactly once per JOIN event**, even when no application matched
//! - A started batch is **always finished**: a failing `mark_enrolled` is remembered, the rest
//!   of the batch is still dispatched, and the first such failure is returned at the end

use tracing::{info, warn};

use crate::apps::ApplicationSet;
use crate::error::{ProviderError, RuntimeError, Stage};
use crate::events::EventKind;
use crate::provider::Provider;

/// What one iteration did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Iteration {
    /// Events decoded from the batch.
    pub polled: usize,
    /// Messages skipped because they could not be decoded.
    pub skipped: usize,
    /// Application callbacks invoked.
    pub invoked: usize,
    /// Application callbacks that failed or panicked.
    pub failed: usize,
    /// JOIN events after which the instance was marked enrolled.
    pub enrolled: usize,
}

impl Iteration {
    /// `true` when the batch was empty (no events, no skipped messages).
    pub fn is_idle(&self) -> bool {
        self.polled == 0 && self.skipped == 0
    }
}

/// Executes one mark → poll → dispatch pass.
///
/// ### Errors
/// Returns [`RuntimeError::Backend`] when a provider call fails. Application failures are
/// never errors here; they are counted in [`Iteration::failed`].
pub async fn run_once(
    provider: &dyn Provider,
    apps: &ApplicationSet,
) -> Result<Iteration, RuntimeError> {
    provider.mark_essential().await.map_err(at(Stage::MarkEssential))?;

    let batch = provider
        .get_events_from_message_queue()
        .await
        .map_err(at(Stage::Poll))?;

    let mut report = Iteration::default();
    let mut enroll_error: Option<ProviderError> = None;

    for entry in batch {
        let event = match entry {
            Ok(event) => event,
            Err(err) => {
                report.skipped += 1;
                warn!(
                    provider = provider.name(),
                    label = err.as_label(),
                    error = %err,
                    "skipping undecodable message"
                );
                continue;
            }
        };
        report.polled += 1;

        info!(
            kind = %event.kind(),
            instance = event.instance(),
            application = event.application().unwrap_or("-"),
            "{} event",
            event.kind()
        );

        let delivery = apps.dispatch(provider, &event).await;
        report.invoked += delivery.invoked;
        report.failed += delivery.failed;

        match event.kind() {
            EventKind::Join => match provider.mark_enrolled().await {
                Ok(()) => report.enrolled += 1,
                Err(err) => {
                    warn!(
                        instance = event.instance(),
                        error = %err,
                        "failed to mark instance enrolled"
                    );
                    enroll_error.get_or_insert(err);
                }
            },
            EventKind::Launch | EventKind::Terminate => {}
        }
    }

    match enroll_error {
        Some(source) => Err(RuntimeError::Backend {
            stage: Stage::MarkEnrolled,
            source,
        }),
        None => Ok(report),
    }
}

fn at(stage: Stage) -> impl FnOnce(ProviderError) -> RuntimeError {
    move |source| RuntimeError::Backend { stage, source }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use crate::apps::{Application, ApplicationRef};
    use crate::error::ApplicationError;
    use crate::events::Event;
    use crate::provider::{MemoryProvider, Operation};

    struct Counter {
        name: &'static str,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl Counter {
        fn arc(name: &'static str, calls: &Arc<Mutex<Vec<String>>>) -> ApplicationRef {
            Arc::new(Self {
                name,
                calls: calls.clone(),
            })
        }

        async fn push(&self, what: &str, event: &Event) -> Result<(), ApplicationError> {
            self.calls
                .lock()
                .await
                .push(format!("{}.{what}({})", self.name, event.instance()));
            Ok(())
        }
    }

    #[async_trait]
    impl Application for Counter {
        fn name(&self) -> &str {
            self.name
        }
        async fn join(&self, _: &dyn Provider, e: &Event) -> Result<(), ApplicationError> {
            self.push("join", e).await
        }
        async fn launch(&self, _: &dyn Provider, e: &Event) -> Result<(), ApplicationError> {
            self.push("launch", e).await
        }
        async fn terminate(&self, _: &dyn Provider, e: &Event) -> Result<(), ApplicationError> {
            self.push("terminate", e).await
        }
    }

    fn setup() -> (MemoryProvider, ApplicationSet, Arc<Mutex<Vec<String>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let apps =
            ApplicationSet::new(vec![Counter::arc("a", &calls), Counter::arc("b", &calls)])
                .unwrap();
        (MemoryProvider::new("i-local"), apps, calls)
    }

    #[tokio::test]
    async fn test_empty_batch_still_marks_essential() {
        let (provider, apps, calls) = setup();

        let report = run_once(&provider, &apps).await.unwrap();
        assert!(report.is_idle());
        assert_eq!(provider.essential_marks().await, 1);
        assert!(calls.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_mixed_batch_keeps_queue_order() {
        let (provider, apps, calls) = setup();
        provider.push_event(&Event::terminate("i-1")).await;
        provider
            .push_event(&Event::join("i-2").with_application("b"))
            .await;
        provider.push_event(&Event::launch("i-3")).await;

        let report = run_once(&provider, &apps).await.unwrap();
        assert_eq!(
            *calls.lock().await,
            vec![
                "a.terminate(i-1)",
                "b.terminate(i-1)",
                "b.join(i-2)",
                "a.launch(i-3)",
                "b.launch(i-3)",
            ]
        );
        assert_eq!(report.polled, 3);
        assert_eq!(report.invoked, 5);
        assert_eq!(report.enrolled, 1);
        assert!(provider.is_enrolled().await.unwrap());
    }

    #[tokio::test]
    async fn test_unmatched_join_still_enrolls() {
        let (provider, apps, calls) = setup();
        provider
            .push_event(&Event::join("i-2").with_application("zookeeper"))
            .await;
        provider.push_event(&Event::join("i-3")).await;

        let report = run_once(&provider, &apps).await.unwrap();
        assert!(calls.lock().await.is_empty());
        assert_eq!(report.invoked, 0);
        assert_eq!(report.enrolled, 2);
        assert!(provider.is_enrolled().await.unwrap());
    }

    #[tokio::test]
    async fn test_decode_errors_are_skipped() {
        let (provider, apps, calls) = setup();
        provider.push_raw("{\"event\": \"REBOOT\", \"instance\": \"i-0\"}").await;
        provider.push_event(&Event::launch("i-1")).await;
        provider.push_raw("\u{0}\u{1}").await;

        let report = run_once(&provider, &apps).await.unwrap();
        assert_eq!(report.skipped, 2);
        assert_eq!(report.polled, 1);
        assert_eq!(calls.lock().await.len(), 2);
    }

    #[tokio::test]
    async fn test_mark_essential_failure_stops_before_poll() {
        let (provider, apps, calls) = setup();
        provider.push_event(&Event::launch("i-1")).await;
        provider
            .fail_next(Operation::MarkEssential, ProviderError::unavailable("503"))
            .await;

        let err = run_once(&provider, &apps).await.unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Backend {
                stage: Stage::MarkEssential,
                ..
            }
        ));
        assert_eq!(provider.pending().await, 1);
        assert!(calls.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_poll_failure_dispatches_nothing() {
        let (provider, apps, calls) = setup();
        provider.push_event(&Event::launch("i-1")).await;
        provider
            .fail_next(Operation::Poll, ProviderError::unavailable("queue timeout"))
            .await;

        let err = run_once(&provider, &apps).await.unwrap_err();
        assert!(matches!(err, RuntimeError::Backend { stage: Stage::Poll, .. }));
        assert!(calls.lock().await.is_empty());
        assert_eq!(provider.essential_marks().await, 1);
    }

    #[tokio::test]
    async fn test_enroll_failure_finishes_batch() {
        let (provider, apps, calls) = setup();
        provider
            .push_event(&Event::join("i-2").with_application("a"))
            .await;
        provider.push_event(&Event::launch("i-3")).await;
        provider
            .fail_next(Operation::MarkEnrolled, ProviderError::unavailable("tag api down"))
            .await;

        let err = run_once(&provider, &apps).await.unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Backend {
                stage: Stage::MarkEnrolled,
                ..
            }
        ));
        assert_eq!(
            *calls.lock().await,
            vec!["a.join(i-2)", "a.launch(i-3)", "b.launch(i-3)"]
        );
        assert!(!provider.is_enrolled().await.unwrap());
    }
}
