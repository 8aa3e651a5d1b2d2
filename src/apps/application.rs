//! # Application abstraction.
//!
//! This module defines the [`Application`] trait: a clustered service (a consensus store, a
//! scheduler, a cache ring...) that reacts to cluster lifecycle events. The common handle type
//! is [`ApplicationRef`], an `Arc<dyn Application>` suitable for sharing across the agent.
//!
//! The agent invokes callbacks sequentially, one event at a time, and hands each callback the
//! provider so it can publish join payloads or query the platform.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ApplicationError;
use crate::events::Event;
use crate::provider::Provider;

/// Shared handle to an application.
pub type ApplicationRef = Arc<dyn Application>;

/// # Clustered service driven by lifecycle events.
///
/// An `Application` has a stable [`name`](Application::name), which is its identity: JOIN
/// events are routed to the application whose name equals [`Event::application`].
///
/// ### Rules
/// - `join` may be retried for the same attempt and must tolerate being called twice.
/// - `launch` / `terminate` are called for every instance in the fleet, not only the local one.
/// - Errors are logged by the agent and do not stop dispatch to other applications.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use joule::{Application, ApplicationError, Event, Payload, Provider};
///
/// struct Consul;
///
/// #[async_trait]
/// impl Application for Consul {
///     fn name(&self) -> &str { "consul" }
///
///     async fn join(&self, _provider: &dyn Provider, event: &Event) -> Result<(), ApplicationError> {
///         let _token = event.token().ok_or_else(|| ApplicationError::fail("join without token"))?;
///         Ok(())
///     }
///
///     async fn launch(&self, provider: &dyn Provider, event: &Event) -> Result<(), ApplicationError> {
///         let mut payload = Payload::new();
///         payload.insert("gossip_key".into(), "k3y".into());
///         provider
///             .send_join_to_message_queue(self.name(), event, payload)
///             .await
///             .map_err(|e| ApplicationError::fail(e.to_string()))
///     }
///
///     async fn terminate(&self, _provider: &dyn Provider, _event: &Event) -> Result<(), ApplicationError> {
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Application: Send + Sync + 'static {
    /// Returns the stable application name (its routing identity).
    fn name(&self) -> &str;

    /// Handles a JOIN event that targets this application.
    async fn join(&self, provider: &dyn Provider, event: &Event) -> Result<(), ApplicationError>;

    /// Handles a LAUNCH event for any instance in the fleet.
    async fn launch(&self, provider: &dyn Provider, event: &Event)
    -> Result<(), ApplicationError>;

    /// Handles a TERMINATE event for any instance in the fleet.
    async fn terminate(
        &self,
        provider: &dyn Provider,
        event: &Event,
    ) -> Result<(), ApplicationError>;
}
