//! # Provider abstraction.
//!
//! A [`Provider`] is the agent's only window onto the backing platform: it marks the local
//! instance (essential, enrolled), reads lifecycle events from the message channel and
//! publishes join payloads back onto it.
//!
//! The common handle type is [`ProviderRef`], an `Arc<dyn Provider>` shared between the agent
//! loop and the applications it calls.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, ProviderError};
use crate::events::Event;

/// Shared handle to a provider.
pub type ProviderRef = Arc<dyn Provider>;

/// Handshake payload published for a joining instance (a JSON object).
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// One polling pass: channel messages in queue order, each decoded or failed.
pub type Batch = Vec<Result<Event, DecodeError>>;

/// Key/value marker attached to the local instance.
///
/// Serializes as `{"Key": ..., "Value": ...}`, the shape cloud tag APIs use.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Value")]
    pub value: String,
}

impl Tag {
    /// Default enrollment tag key.
    pub const ENROLLED_KEY: &'static str = "joule:enrolled";
    /// Default enrollment tag value.
    pub const ENROLLED_VALUE: &'static str = "1";

    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// The default enrollment marker, `joule:enrolled=1`.
    pub fn enrolled() -> Self {
        Self::new(Self::ENROLLED_KEY, Self::ENROLLED_VALUE)
    }
}

impl Default for Tag {
    fn default() -> Self {
        Self::enrolled()
    }
}

/// # Contract of a cloud/queue backend.
///
/// Implementations usually wrap an existing SDK client or talk to the platform API directly.
/// All calls may block on I/O; the agent awaits each one before moving to the next step.
///
/// ### Rules
/// - `mark_essential` and `mark_enrolled` are idempotent; the agent calls them repeatedly.
/// - `is_enrolled` has no side effects.
/// - `get_events_from_message_queue` returns one finite batch per call, in queue order.
///   A message that cannot be decoded occupies its slot as `Err(DecodeError)`; it must not
///   turn the whole call into a `ProviderError`.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use joule::{Batch, Event, Payload, Provider, ProviderError};
///
/// struct Static;
///
/// #[async_trait]
/// impl Provider for Static {
///     async fn mark_essential(&self) -> Result<(), ProviderError> { Ok(()) }
///     async fn mark_enrolled(&self) -> Result<(), ProviderError> { Ok(()) }
///     async fn is_enrolled(&self) -> Result<bool, ProviderError> { Ok(true) }
///
///     async fn get_events_from_message_queue(&self) -> Result<Batch, ProviderError> {
///         Ok(vec![Ok(Event::launch("i-1"))])
///     }
///
///     async fn send_join_to_message_queue(
///         &self,
///         _application: &str,
///         _event: &Event,
///         _payload: Payload,
///     ) -> Result<(), ProviderError> {
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Provider: Send + Sync + 'static {
    /// Human-readable backend name (for logs).
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Protects the local instance from scale-in for the current iteration.
    async fn mark_essential(&self) -> Result<(), ProviderError>;

    /// Records that the local instance completed joining (attaches the enrollment tag).
    async fn mark_enrolled(&self) -> Result<(), ProviderError>;

    /// Returns whether the local instance carries the enrollment tag.
    async fn is_enrolled(&self) -> Result<bool, ProviderError>;

    /// Drains pending channel messages and decodes them into events.
    async fn get_events_from_message_queue(&self) -> Result<Batch, ProviderError>;

    /// Publishes a handshake payload produced by an existing member for a joining instance.
    ///
    /// Fire-and-forget: success only means the platform accepted the message.
    async fn send_join_to_message_queue(
        &self,
        application: &str,
        event: &Event,
        payload: Payload,
    ) -> Result<(), ProviderError>;
}
