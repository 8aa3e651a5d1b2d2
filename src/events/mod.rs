//! Cluster lifecycle events: data model and JSON envelope.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and per-event metadata
//! - [`envelope`] shared JSON codec for providers with JSON message bodies
//!
//! ## Quick reference
//! - **Producers**: [`Provider::get_events_from_message_queue`](crate::Provider::get_events_from_message_queue)
//! - **Consumer**: the agent loop, which routes each event to applications

pub mod envelope;
mod event;

pub use event::{Event, EventKind};
