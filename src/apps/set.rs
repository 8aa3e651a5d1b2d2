//! # Ordered, fixed application set with isolated dispatch.
//!
//! Provides [`ApplicationSet`]: the applications an agent drives, in registration order,
//! frozen at construction.
//!
//! ## Routing
//! ```text
//! dispatch(event)
//!     │
//!     ├─ JOIN       ──► apps where app.name() == event.application ──► app.join()
//!     ├─ LAUNCH     ──► every app, registration order             ──► app.launch()
//!     └─ TERMINATE  ──► every app, registration order             ──► app.terminate()
//! ```
//!
//! ## Rules
//! - **Sequential**: one callback at a time, awaited before the next starts
//! - **Isolation**: an `Err` or a panic in one callback is logged and counted; the next
//!   application still runs
//! - **Fixed**: no registration or removal after construction
//!
//! ## Panic handling
//! Callbacks run under `catch_unwind`; a panic becomes [`ApplicationError::Panicked`].
//!
//! **Warning**: `AssertUnwindSafe` is used, which can leave shared state inconsistent
//! if an application uses `Arc<Mutex<T>>` and panics while holding the lock.

use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::warn;

use crate::apps::ApplicationRef;
use crate::error::{ApplicationError, ConfigError};
use crate::events::{Event, EventKind};
use crate::provider::Provider;

/// Callback counts for one dispatched event.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    /// Callbacks invoked.
    pub invoked: usize,
    /// Callbacks that returned an error or panicked.
    pub failed: usize,
}

/// Applications driven by one agent, in registration order.
#[derive(Clone)]
pub struct ApplicationSet {
    apps: Arc<[ApplicationRef]>,
}

impl ApplicationSet {
    /// Freezes `apps` into a set.
    ///
    /// ### Errors
    /// - [`ConfigError::NoApplications`] when `apps` is empty
    /// - [`ConfigError::EmptyApplicationName`] when a name is empty
    /// - [`ConfigError::DuplicateApplication`] when two names collide
    pub fn new(apps: Vec<ApplicationRef>) -> Result<Self, ConfigError> {
        if apps.is_empty() {
            return Err(ConfigError::NoApplications);
        }

        let mut seen = HashSet::with_capacity(apps.len());
        for app in &apps {
            let name = app.name();
            if name.is_empty() {
                return Err(ConfigError::EmptyApplicationName);
            }
            if !seen.insert(name) {
                return Err(ConfigError::DuplicateApplication {
                    name: name.to_string(),
                });
            }
        }

        Ok(Self { apps: apps.into() })
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }

    /// Iterates applications in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ApplicationRef> {
        self.apps.iter()
    }

    /// Application names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.apps.iter().map(|a| a.name()).collect()
    }

    /// Routes `event` to its recipients and awaits each callback in order.
    pub async fn dispatch(&self, provider: &dyn Provider, event: &Event) -> Delivery {
        let mut delivery = Delivery::default();

        for app in self.apps.iter() {
            if event.kind() == EventKind::Join && !event.targets(app.name()) {
                continue;
            }

            delivery.invoked += 1;
            if let Err(err) = invoke(app, provider, event).await {
                delivery.failed += 1;
                warn!(
                    application = app.name(),
                    kind = %event.kind(),
                    instance = event.instance(),
                    label = err.as_label(),
                    error = %err,
                    "application callback failed"
                );
            }
        }
        delivery
    }
}

/// Runs the callback matching the event kind, converting a panic into an error.
async fn invoke(
    app: &ApplicationRef,
    provider: &dyn Provider,
    event: &Event,
) -> Result<(), ApplicationError> {
    let fut = match event.kind() {
        EventKind::Join => app.join(provider, event),
        EventKind::Launch => app.launch(provider, event),
        EventKind::Terminate => app.terminate(provider, event),
    };

    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(res) => res,
        Err(panic_err) => {
            let any = &*panic_err;
            let info = if let Some(msg) = any.downcast_ref::<&'static str>() {
                (*msg).to_string()
            } else if let Some(msg) = any.downcast_ref::<String>() {
                msg.clone()
            } else {
                "unknown panic".to_string()
            };
            Err(ApplicationError::Panicked { info })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apps::Application;
    use crate::provider::MemoryProvider;
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    /// Appends `"<name>.<callback>"` to a shared log; optionally fails or panics.
    struct Probe {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
        fail: bool,
        panic: bool,
    }

    impl Probe {
        fn arc(name: &'static str, log: &Arc<Mutex<Vec<String>>>) -> ApplicationRef {
            Arc::new(Self {
                name,
                log: log.clone(),
                fail: false,
                panic: false,
            })
        }

        async fn record(&self, callback: &str) -> Result<(), ApplicationError> {
            self.log.lock().await.push(format!("{}.{callback}", self.name));
            if self.panic {
                panic!("{} exploded", self.name);
            }
            if self.fail {
                return Err(ApplicationError::fail("nope"));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl Application for Probe {
        fn name(&self) -> &str {
            self.name
        }
        async fn join(&self, _: &dyn Provider, _: &Event) -> Result<(), ApplicationError> {
            self.record("join").await
        }
        async fn launch(&self, _: &dyn Provider, _: &Event) -> Result<(), ApplicationError> {
            self.record("launch").await
        }
        async fn terminate(&self, _: &dyn Provider, _: &Event) -> Result<(), ApplicationError> {
            self.record("terminate").await
        }
    }

    fn log() -> Arc<Mutex<Vec<String>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    #[test]
    fn test_new_validates_names() {
        let l = log();
        assert_eq!(
            ApplicationSet::new(vec![]).err(),
            Some(ConfigError::NoApplications)
        );
        assert_eq!(
            ApplicationSet::new(vec![Probe::arc("", &l)]).err(),
            Some(ConfigError::EmptyApplicationName)
        );
        assert_eq!(
            ApplicationSet::new(vec![Probe::arc("a", &l), Probe::arc("a", &l)]).err(),
            Some(ConfigError::DuplicateApplication { name: "a".into() })
        );

        let set = ApplicationSet::new(vec![Probe::arc("a", &l), Probe::arc("b", &l)]).unwrap();
        assert_eq!(set.names(), vec!["a", "b"]);
        assert_eq!(set.len(), 2);
    }

    #[tokio::test]
    async fn test_fan_out_in_registration_order() {
        let l = log();
        let set = ApplicationSet::new(vec![Probe::arc("b", &l), Probe::arc("a", &l)]).unwrap();
        let provider = MemoryProvider::new("i-local");

        let d = set.dispatch(&provider, &Event::terminate("i-1")).await;
        assert_eq!(d, Delivery { invoked: 2, failed: 0 });
        assert_eq!(*l.lock().await, vec!["b.terminate", "a.terminate"]);
    }

    #[tokio::test]
    async fn test_join_reaches_only_target() {
        let l = log();
        let set = ApplicationSet::new(vec![Probe::arc("a", &l), Probe::arc("b", &l)]).unwrap();
        let provider = MemoryProvider::new("i-local");

        let d = set
            .dispatch(&provider, &Event::join("i-2").with_application("b"))
            .await;
        assert_eq!(d.invoked, 1);
        assert_eq!(*l.lock().await, vec!["b.join"]);

        let d = set.dispatch(&provider, &Event::join("i-3")).await;
        assert_eq!(d.invoked, 0);
    }

    #[tokio::test]
    async fn test_failure_and_panic_are_isolated() {
        let l = log();
        let failing: ApplicationRef = Arc::new(Probe {
            name: "failing",
            log: l.clone(),
            fail: true,
            panic: false,
        });
        let panicking: ApplicationRef = Arc::new(Probe {
            name: "panicking",
            log: l.clone(),
            fail: false,
            panic: true,
        });
        let set =
            ApplicationSet::new(vec![failing, panicking, Probe::arc("healthy", &l)]).unwrap();
        let provider = MemoryProvider::new("i-local");

        let d = set.dispatch(&provider, &Event::launch("i-1")).await;
        assert_eq!(d, Delivery { invoked: 3, failed: 2 });
        assert_eq!(
            *l.lock().await,
            vec!["failing.launch", "panicking.launch", "healthy.launch"]
        );
    }

    #[tokio::test]
    async fn test_invoke_reports_panic_message() {
        let l = log();
        let app: ApplicationRef = Arc::new(Probe {
            name: "boom",
            log: l,
            fail: false,
            panic: true,
        });
        let provider = MemoryProvider::new("i-local");

        let err = invoke(&app, &provider, &Event::launch("i-1"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ApplicationError::Panicked {
                info: "boom exploded".into()
            }
        );
    }
}
