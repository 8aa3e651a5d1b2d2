//! # Cluster lifecycle events.
//!
//! The [`EventKind`] enum classifies what happened to a cluster member:
//! - **Join**: an instance is completing the cluster handshake and may carry a token
//! - **Launch**: an instance in the fleet has launched
//! - **Terminate**: an instance in the fleet is going away
//!
//! The [`Event`] struct carries the concerned instance plus optional JOIN metadata:
//! the handshake token and the name of the application the join targets.
//!
//! ## Lifecycle
//! Events are built by a provider while it decodes its queue, dispatched once by the
//! agent loop, then dropped. They are never mutated after construction: fields are only
//! readable through accessors, and the `with_*` builders consume the value.
//!
//! ## Example
//! ```rust
//! use joule::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::Join, "i-0abc")
//!     .with_token("s3cr3t")
//!     .with_application("consul");
//!
//! assert_eq!(ev.kind(), EventKind::Join);
//! assert_eq!(ev.instance(), "i-0abc");
//! assert_eq!(ev.token(), Some("s3cr3t"));
//! assert!(ev.targets("consul"));
//! ```

use std::fmt;
use std::sync::Arc;

/// Classification of cluster lifecycle events.
///
/// Closed set; the agent loop matches it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// An instance is joining the cluster.
    ///
    /// Routed only to the application named by [`Event::application`]; the agent marks
    /// the local instance enrolled once the join has been dispatched.
    Join,

    /// An instance launched somewhere in the fleet.
    ///
    /// Routed to every registered application.
    Launch,

    /// An instance is terminating somewhere in the fleet.
    ///
    /// Routed to every registered application.
    Terminate,
}

impl EventKind {
    /// All kinds, in code order.
    pub const ALL: [EventKind; 3] = [EventKind::Join, EventKind::Launch, EventKind::Terminate];

    /// Returns the wire name (`JOIN`, `LAUNCH`, `TERMINATE`).
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Join => "JOIN",
            EventKind::Launch => "LAUNCH",
            EventKind::Terminate => "TERMINATE",
        }
    }

    /// Returns the stable numeric code (`0`, `1`, `2`).
    pub fn code(&self) -> u8 {
        match self {
            EventKind::Join => 0,
            EventKind::Launch => 1,
            EventKind::Terminate => 2,
        }
    }

    /// Parses a wire name. Matching is case-insensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(name))
    }

    /// Parses a numeric code.
    pub fn from_code(code: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|k| u64::from(k.code()) == code)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One lifecycle occurrence read from the message channel.
///
/// - `kind`: what happened
/// - `instance`: opaque identifier of the member concerned
/// - `token`: handshake payload (JOIN only, optional)
/// - `application`: name of the targeted application (JOIN only, optional)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    kind: EventKind,
    instance: Arc<str>,
    token: Option<Arc<str>>,
    application: Option<Arc<str>>,
}

impl Event {
    /// Creates an event without token or target application.
    pub fn new(kind: EventKind, instance: impl Into<Arc<str>>) -> Self {
        Self {
            kind,
            instance: instance.into(),
            token: None,
            application: None,
        }
    }

    /// Shorthand for `Event::new(EventKind::Join, instance)`.
    pub fn join(instance: impl Into<Arc<str>>) -> Self {
        Self::new(EventKind::Join, instance)
    }

    /// Shorthand for `Event::new(EventKind::Launch, instance)`.
    pub fn launch(instance: impl Into<Arc<str>>) -> Self {
        Self::new(EventKind::Launch, instance)
    }

    /// Shorthand for `Event::new(EventKind::Terminate, instance)`.
    pub fn terminate(instance: impl Into<Arc<str>>) -> Self {
        Self::new(EventKind::Terminate, instance)
    }

    /// Attaches a handshake token.
    #[inline]
    pub fn with_token(mut self, token: impl Into<Arc<str>>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Attaches the name of the targeted application.
    #[inline]
    pub fn with_application(mut self, application: impl Into<Arc<str>>) -> Self {
        self.application = Some(application.into());
        self
    }

    #[inline]
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    #[inline]
    pub fn instance(&self) -> &str {
        &self.instance
    }

    #[inline]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    #[inline]
    pub fn application(&self) -> Option<&str> {
        self.application.as_deref()
    }

    /// Returns `true` when this event names `application` as its target.
    ///
    /// An event without a target matches nothing.
    #[inline]
    pub fn targets(&self, application: &str) -> bool {
        self.application.as_deref() == Some(application)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} instance={}", self.kind, self.instance)?;
        if let Some(app) = &self.application {
            write!(f, " application={app}")?;
        }
        Ok(())
    }
}
