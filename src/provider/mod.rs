//! Provider contract and the in-memory backend.
//!
//! ## Contents
//! - [`Provider`] capability trait every backend implements
//! - [`Tag`], [`Payload`], [`Batch`] values crossing the provider boundary
//! - [`MemoryProvider`] process-local backend (tests, demos, reference)
//!
//! Real cloud backends live outside this crate and only need to implement [`Provider`].

mod memory;
mod provider;

pub use memory::{MemoryProvider, Operation, PublishedJoin};
pub use provider::{Batch, Payload, Provider, ProviderRef, Tag};
