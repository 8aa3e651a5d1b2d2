//! # joule
//!
//! **Joule** is the control loop that runs on every member of an elastic cluster.
//!
//! It keeps the local instance protected from scale-in, reads cluster lifecycle events from
//! a provider's message channel, and hands each event to the clustered services
//! ("applications") registered with it, so they can admit new peers, complete their own join
//! or evict departing members.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │ Application  │   │ Application  │   │ Application  │
//!     │  (consul)    │   │   (nomad)    │   │   (vault)    │
//!     └──────▲───────┘   └──────▲───────┘   └──────▲───────┘
//!            │ join/launch/     │                  │
//!            │ terminate        │                  │
//! ┌──────────┴──────────────────┴──────────────────┴──────────────────┐
//! │  Agent (per-instance loop)                                        │
//! │  - ApplicationSet (fixed, ordered, isolated dispatch)             │
//! │  - AgentConfig (interval, failure policy)                         │
//! └──────────┬───────────────────────────────────────────────▲────────┘
//!            │ mark_essential / mark_enrolled /              │ Batch
//!            │ get_events_from_message_queue                 │ (Result<Event, DecodeError>)
//!            ▼                                               │
//! ┌──────────────────────────────────────────────────────────┴────────┐
//! │  Provider (cloud backend: instance tags + message channel)        │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ### Lifecycle
//! ```text
//! Agent::builder(provider).with_application(..).build()?  ──► Agent::run(token)
//!
//! loop {
//!   ├─► mark_essential()
//!   ├─► batch = get_events_from_message_queue()
//!   ├─► for event in batch (queue order):
//!   │       ├─ Err(decode)  ─► warn, skip
//!   │       ├─ JOIN         ─► app.join() where app.name() == event.application
//!   │       │                  then mark_enrolled() (always, once per JOIN)
//!   │       ├─ LAUNCH       ─► app.launch() on every app, registration order
//!   │       └─ TERMINATE    ─► app.terminate() on every app, registration order
//!   └─► sleep(interval) (cancellable)
//! }
//! ```
//!
//! ## Features
//! | Area              | Description                                                    | Key types / traits                        |
//! |-------------------|----------------------------------------------------------------|-------------------------------------------|
//! | **Events**        | Closed set of cluster lifecycle events, JSON envelope codec.   | [`Event`], [`EventKind`], [`envelope`]    |
//! | **Applications**  | Services reacting to lifecycle events.                         | [`Application`], [`ApplicationSet`]       |
//! | **Providers**     | Backend contract and an in-memory implementation.              | [`Provider`], [`MemoryProvider`], [`Tag`] |
//! | **Loop**          | Periodic mark/poll/dispatch with cancellation.                 | [`Agent`], [`AgentBuilder`], [`Iteration`]|
//! | **Policies**      | Behaviour on backend failures.                                 | [`FailurePolicy`], [`BackoffPolicy`]      |
//! | **Errors**        | Typed errors for backends, decoding, callbacks and startup.    | [`ProviderError`], [`RuntimeError`]       |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use joule::{Agent, Application, ApplicationError, Event, MemoryProvider, Provider};
//!
//! struct Consul;
//!
//! #[async_trait]
//! impl Application for Consul {
//!     fn name(&self) -> &str { "consul" }
//!     async fn join(&self, _: &dyn Provider, _: &Event) -> Result<(), ApplicationError> { Ok(()) }
//!     async fn launch(&self, _: &dyn Provider, _: &Event) -> Result<(), ApplicationError> { Ok(()) }
//!     async fn terminate(&self, _: &dyn Provider, _: &Event) -> Result<(), ApplicationError> { Ok(()) }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = Arc::new(MemoryProvider::new("i-0abc"));
//!     provider.push_event(&Event::join("i-0abc").with_application("consul")).await;
//!
//!     let agent = Agent::builder(provider.clone())
//!         .with_application(Arc::new(Consul))
//!         .build()?;
//!
//!     // One pass; `agent.run(token)` or `agent.run_until_signal()` loop forever.
//!     let iteration = agent.run_once().await?;
//!     assert_eq!(iteration.enrolled, 1);
//!     assert!(provider.is_enrolled().await?);
//!     Ok(())
//! }
//! ```
mod apps;
mod core;
mod error;
mod events;
mod policies;
mod provider;

// ---- Public re-exports ----

pub use apps::{Application, ApplicationRef, ApplicationSet, Delivery};
pub use self::core::{Agent, AgentBuilder, AgentConfig, DEFAULT_INTERVAL, Iteration, run_once};
pub use error::{ApplicationError, ConfigError, DecodeError, ProviderError, RuntimeError, Stage};
pub use events::{Event, EventKind, envelope};
pub use policies::{BackoffPolicy, FailurePolicy, JitterPolicy};
pub use provider::{
    Batch, MemoryProvider, Operation, Payload, Provider, ProviderRef, PublishedJoin, Tag,
};
