//! # In-memory provider.
//!
//! [`MemoryProvider`] keeps the instance marker, the message channel and the published joins
//! in process memory. It backs tests and demos, and doubles as a reference for writing a real
//! backend: its inbox holds raw JSON bodies and decodes them through [`envelope`], exactly the
//! way a queue-backed provider would.
//!
//! ## Architecture
//! ```text
//! push_raw / push_event ──► inbox (VecDeque<String>)
//!                                │  get_events_from_message_queue()
//!                                ▼  drain (up to batch_limit) + envelope::decode
//!                             Batch ──► agent loop
//!
//! mark_essential ──► essential_marks += 1
//! mark_enrolled  ──► tags[tag.key] = tag.value
//! send_join      ──► outbox (PublishedJoin)
//! ```
//!
//! ## Failure injection
//! [`MemoryProvider::fail_next`] arms a one-shot [`ProviderError`] for an [`Operation`];
//! the next call of that operation returns it without touching any state.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::error::ProviderError;
use crate::events::{Event, envelope};
use crate::provider::{Batch, Payload, Provider, Tag};

/// Provider operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    MarkEssential,
    MarkEnrolled,
    IsEnrolled,
    Poll,
    SendJoin,
}

/// A join payload accepted by [`Provider::send_join_to_message_queue`].
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedJoin {
    pub application: String,
    pub event: Event,
    pub payload: Payload,
}

impl PublishedJoin {
    /// Renders the message as it would travel on a JSON channel.
    pub fn to_message(&self) -> Value {
        envelope::encode_join(&self.application, &self.event, &self.payload)
    }
}

#[derive(Default)]
struct State {
    tags: HashMap<String, String>,
    essential_marks: u64,
    inbox: VecDeque<String>,
    outbox: Vec<PublishedJoin>,
    faults: HashMap<Operation, ProviderError>,
}

impl State {
    fn check(&mut self, op: Operation) -> Result<(), ProviderError> {
        match self.faults.remove(&op) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Backend-free [`Provider`] for one local instance.
pub struct MemoryProvider {
    instance: Arc<str>,
    tag: Tag,
    batch_limit: Option<usize>,
    state: Mutex<State>,
}

impl MemoryProvider {
    /// Creates a provider for the local instance `instance`, using the default enrollment tag.
    pub fn new(instance: impl Into<Arc<str>>) -> Self {
        Self {
            instance: instance.into(),
            tag: Tag::enrolled(),
            batch_limit: None,
            state: Mutex::new(State::default()),
        }
    }

    /// Uses `tag` as the enrollment marker instead of `joule:enrolled=1`.
    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tag = tag;
        self
    }

    /// Caps the number of messages one poll drains (`0` is treated as `1`).
    pub fn with_batch_limit(mut self, limit: usize) -> Self {
        self.batch_limit = Some(limit.max(1));
        self
    }

    /// Identifier of the local instance.
    pub fn instance(&self) -> &str {
        &self.instance
    }

    /// Enrollment tag this provider attaches.
    pub fn tag(&self) -> &Tag {
        &self.tag
    }

    /// Enqueues a raw message body (decoded on the next poll).
    pub async fn push_raw(&self, raw: impl Into<String>) {
        self.state.lock().await.inbox.push_back(raw.into());
    }

    /// Enqueues an event, encoded with the JSON envelope.
    pub async fn push_event(&self, event: &Event) {
        self.push_raw(envelope::encode(event).to_string()).await;
    }

    /// Number of messages still waiting in the inbox.
    pub async fn pending(&self) -> usize {
        self.state.lock().await.inbox.len()
    }

    /// Joins published so far, in publication order.
    pub async fn published(&self) -> Vec<PublishedJoin> {
        self.state.lock().await.outbox.clone()
    }

    /// Tags currently attached to the local instance.
    pub async fn tags(&self) -> HashMap<String, String> {
        self.state.lock().await.tags.clone()
    }

    /// How many times the instance was marked essential.
    pub async fn essential_marks(&self) -> u64 {
        self.state.lock().await.essential_marks
    }

    /// Arms a one-shot failure for the next call of `op`.
    pub async fn fail_next(&self, op: Operation, err: ProviderError) {
        self.state.lock().await.faults.insert(op, err);
    }
}

#[async_trait]
impl Provider for MemoryProvider {
    fn name(&self) -> &str {
        "memory"
    }

    async fn mark_essential(&self) -> Result<(), ProviderError> {
        let mut state = self.state.lock().await;
        state.check(Operation::MarkEssential)?;
        state.essential_marks += 1;
        Ok(())
    }

    async fn mark_enrolled(&self) -> Result<(), ProviderError> {
        let mut state = self.state.lock().await;
        state.check(Operation::MarkEnrolled)?;
        state
            .tags
            .insert(self.tag.key.clone(), self.tag.value.clone());
        Ok(())
    }

    async fn is_enrolled(&self) -> Result<bool, ProviderError> {
        let mut state = self.state.lock().await;
        state.check(Operation::IsEnrolled)?;
        Ok(state.tags.get(&self.tag.key) == Some(&self.tag.value))
    }

    async fn get_events_from_message_queue(&self) -> Result<Batch, ProviderError> {
        let mut state = self.state.lock().await;
        state.check(Operation::Poll)?;

        let take = self
            .batch_limit
            .unwrap_or(state.inbox.len())
            .min(state.inbox.len());
        Ok(state
            .inbox
            .drain(..take)
            .map(|raw| envelope::decode(&raw))
            .collect())
    }

    async fn send_join_to_message_queue(
        &self,
        application: &str,
        event: &Event,
        payload: Payload,
    ) -> Result<(), ProviderError> {
        let mut state = self.state.lock().await;
        state.check(Operation::SendJoin)?;
        state.outbox.push(PublishedJoin {
            application: application.to_string(),
            event: event.clone(),
            payload,
        });
        Ok(())
    }
}
