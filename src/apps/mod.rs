//! Applications: the clustered services an agent drives.
//!
//! ## Contents
//! - [`Application`] trait with the join / launch / terminate callbacks
//! - [`ApplicationRef`] shared handle (`Arc<dyn Application>`)
//! - [`ApplicationSet`] ordered, fixed collection with per-event routing
//! - [`Delivery`] callback counts for one routed event

mod application;
mod set;

pub use application::{Application, ApplicationRef};
pub use set::{ApplicationSet, Delivery};
