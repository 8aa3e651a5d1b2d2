//! Shared test utilities for integration tests
//!
//! A [`Journal`] records provider calls and application callbacks in one ordered list so tests
//! can assert on interleaving (e.g. `mark_essential` before any dispatch).

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use joule::{
    Application, ApplicationError, ApplicationRef, Batch, Event, MemoryProvider, Payload,
    Provider, ProviderError,
};
use tokio::sync::Mutex;

/// Ordered record of everything that happened during a test.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, entry: impl Into<String>) {
        self.0.lock().await.push(entry.into());
    }

    pub async fn entries(&self) -> Vec<String> {
        self.0.lock().await.clone()
    }

    pub async fn count(&self, entry: &str) -> usize {
        self.0.lock().await.iter().filter(|e| *e == entry).count()
    }

    pub async fn clear(&self) {
        self.0.lock().await.clear();
    }
}

/// Wraps a [`MemoryProvider`] and journals every call it receives.
pub struct JournalingProvider {
    pub inner: Arc<MemoryProvider>,
    journal: Journal,
}

impl JournalingProvider {
    pub fn new(inner: Arc<MemoryProvider>, journal: Journal) -> Self {
        Self { inner, journal }
    }
}

#[async_trait]
impl Provider for JournalingProvider {
    fn name(&self) -> &str {
        "journaling"
    }

    async fn mark_essential(&self) -> Result<(), ProviderError> {
        self.journal.push("mark_essential").await;
        self.inner.mark_essential().await
    }

    async fn mark_enrolled(&self) -> Result<(), ProviderError> {
        self.journal.push("mark_enrolled").await;
        self.inner.mark_enrolled().await
    }

    async fn is_enrolled(&self) -> Result<bool, ProviderError> {
        self.inner.is_enrolled().await
    }

    async fn get_events_from_message_queue(&self) -> Result<Batch, ProviderError> {
        self.journal.push("poll").await;
        self.inner.get_events_from_message_queue().await
    }

    async fn send_join_to_message_queue(
        &self,
        application: &str,
        event: &Event,
        payload: Payload,
    ) -> Result<(), ProviderError> {
        self.journal.push(format!("send_join({application})")).await;
        self.inner
            .send_join_to_message_queue(application, event, payload)
            .await
    }
}

/// How a [`RecordingApplication`] behaves when called.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Behavior {
    Succeed,
    Fail,
    Panic,
}

/// Journals `"<name>.<callback>(<instance>)"` for each callback.
pub struct RecordingApplication {
    name: &'static str,
    journal: Journal,
    behavior: Behavior,
    /// Publish a join payload on LAUNCH (as an existing member would).
    sponsor: bool,
}

impl RecordingApplication {
    pub fn arc(name: &'static str, journal: &Journal) -> ApplicationRef {
        Self::with(name, journal, Behavior::Succeed, false)
    }

    pub fn with(
        name: &'static str,
        journal: &Journal,
        behavior: Behavior,
        sponsor: bool,
    ) -> ApplicationRef {
        Arc::new(Self {
            name,
            journal: journal.clone(),
            behavior,
            sponsor,
        })
    }

    async fn record(&self, callback: &str, event: &Event) -> Result<(), ApplicationError> {
        self.journal
            .push(format!("{}.{callback}({})", self.name, event.instance()))
            .await;
        match self.behavior {
            Behavior::Succeed => Ok(()),
            Behavior::Fail => Err(ApplicationError::fail(format!("{} refused", self.name))),
            Behavior::Panic => panic!("{} crashed", self.name),
        }
    }
}

#[async_trait]
impl Application for RecordingApplication {
    fn name(&self) -> &str {
        self.name
    }

    async fn join(&self, _provider: &dyn Provider, event: &Event) -> Result<(), ApplicationError> {
        self.record("join", event).await
    }

    async fn launch(&self, provider: &dyn Provider, event: &Event) -> Result<(), ApplicationError> {
        self.record("launch", event).await?;
        if self.sponsor {
            let mut payload = Payload::new();
            payload.insert("sponsor".into(), self.name.into());
            provider
                .send_join_to_message_queue(self.name, event, payload)
                .await
                .map_err(|e| ApplicationError::fail(e.to_string()))?;
        }
        Ok(())
    }

    async fn terminate(
        &self,
        _provider: &dyn Provider,
        event: &Event,
    ) -> Result<(), ApplicationError> {
        self.record("terminate", event).await
    }
}

/// A journaling provider over a fresh in-memory backend for `i-local`.
pub fn provider(journal: &Journal) -> (Arc<JournalingProvider>, Arc<MemoryProvider>) {
    let memory = Arc::new(MemoryProvider::new("i-local"));
    let journaling = Arc::new(JournalingProvider::new(memory.clone(), journal.clone()));
    (journaling, memory)
}
