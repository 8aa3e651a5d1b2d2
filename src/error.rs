//! Error types used by the joule agent, its providers and applications.
//!
//! - [`ProviderError`]: a backing platform call failed.
//! - [`DecodeError`]: one message read from the channel could not become an [`Event`](crate::Event).
//! - [`ApplicationError`]: an application callback failed or panicked.
//! - [`ConfigError`]: the agent could not be built; raised before the loop starts.
//! - [`RuntimeError`]: the loop stopped on its own.
//!
//! Every type provides `as_label` (stable snake_case label for logs).

use std::fmt;

use thiserror::Error;

/// # Errors produced by a provider backend.
///
/// Retryable errors (`Unavailable`) are what [`FailurePolicy::Retry`](crate::FailurePolicy::Retry)
/// will wait out; `Rejected` always stops the loop.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The platform could not be reached or answered with a transient failure.
    #[error("backend unavailable: {error}")]
    Unavailable {
        /// The underlying error message.
        error: String,
    },

    /// The platform refused the request (permissions, invalid resource, ...).
    #[error("backend rejected request: {error}")]
    Rejected {
        /// The underlying error message.
        error: String,
    },
}

impl ProviderError {
    /// Builds an [`ProviderError::Unavailable`].
    pub fn unavailable(error: impl Into<String>) -> Self {
        ProviderError::Unavailable {
            error: error.into(),
        }
    }

    /// Builds an [`ProviderError::Rejected`].
    pub fn rejected(error: impl Into<String>) -> Self {
        ProviderError::Rejected {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use joule::ProviderError;
    ///
    /// assert_eq!(ProviderError::unavailable("timeout").as_label(), "provider_unavailable");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ProviderError::Unavailable { .. } => "provider_unavailable",
            ProviderError::Rejected { .. } => "provider_rejected",
        }
    }

    /// Indicates whether waiting and trying again can help.
    ///
    /// ```
    /// use joule::ProviderError;
    ///
    /// assert!(ProviderError::unavailable("503").is_retryable());
    /// assert!(!ProviderError::rejected("AccessDenied").is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProviderError::Unavailable { .. })
    }
}

/// # Errors produced while decoding a single channel message.
///
/// Never fatal: the agent skips the offending message and keeps the rest of the batch.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Message body is not valid JSON or has the wrong shape.
    #[error("malformed message: {error}")]
    Malformed { error: String },

    /// The event kind is not one of JOIN / LAUNCH / TERMINATE.
    #[error("unknown event kind: {kind}")]
    UnknownKind { kind: String },

    /// A required field is absent.
    #[error("missing field `{field}`")]
    MissingField { field: &'static str },
}

impl DecodeError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            DecodeError::Malformed { .. } => "decode_malformed",
            DecodeError::UnknownKind { .. } => "decode_unknown_kind",
            DecodeError::MissingField { .. } => "decode_missing_field",
        }
    }
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        DecodeError::Malformed {
            error: err.to_string(),
        }
    }
}

/// # Errors produced by application callbacks.
///
/// The agent logs and counts these; it never stops dispatching because of them.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApplicationError {
    /// The callback reported a failure.
    #[error("application failed: {error}")]
    Fail { error: String },

    /// The callback panicked; built by the agent, not by applications.
    #[error("application panicked: {info}")]
    Panicked { info: String },
}

impl ApplicationError {
    /// Builds an [`ApplicationError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        ApplicationError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ApplicationError::Fail { .. } => "application_failed",
            ApplicationError::Panicked { .. } => "application_panicked",
        }
    }
}

/// # Errors raised while building an [`Agent`](crate::Agent).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No application was registered.
    #[error("at least one application must be registered")]
    NoApplications,

    /// An application reported an empty name, so JOIN events could never target it.
    #[error("application name cannot be empty")]
    EmptyApplicationName,

    /// Two applications share a name, so JOIN routing would be ambiguous.
    #[error("duplicate application name: {name}")]
    DuplicateApplication { name: String },

    /// The idle interval is zero.
    #[error("interval must be greater than 0")]
    ZeroInterval,
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::NoApplications => "config_no_applications",
            ConfigError::EmptyApplicationName => "config_empty_application_name",
            ConfigError::DuplicateApplication { .. } => "config_duplicate_application",
            ConfigError::ZeroInterval => "config_zero_interval",
        }
    }
}

/// Loop step during which a backend call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    MarkEssential,
    Poll,
    MarkEnrolled,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::MarkEssential => "mark_essential",
            Stage::Poll => "poll",
            Stage::MarkEnrolled => "mark_enrolled",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// # Errors that stop the agent loop.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// A backend call failed and the failure policy did not absorb it.
    #[error("{stage} failed: {source}")]
    Backend {
        /// Where in the iteration the call failed.
        stage: Stage,
        /// The provider failure.
        #[source]
        source: ProviderError,
    },

    /// OS signal handlers could not be installed.
    #[error("failed to listen for shutdown signals: {error}")]
    Signal {
        #[source]
        error: std::io::Error,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// ```
    /// use joule::{ProviderError, RuntimeError, Stage};
    ///
    /// let err = RuntimeError::Backend {
    ///     stage: Stage::Poll,
    ///     source: ProviderError::unavailable("queue timeout"),
    /// };
    /// assert_eq!(err.as_label(), "runtime_backend");
    /// assert_eq!(err.to_string(), "poll failed: backend unavailable: queue timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::Backend { .. } => "runtime_backend",
            RuntimeError::Signal { .. } => "runtime_signal",
        }
    }

    /// Returns the failing provider error, if any.
    pub fn provider_error(&self) -> Option<&ProviderError> {
        match self {
            RuntimeError::Backend { source, .. } => Some(source),
            RuntimeError::Signal { .. } => None,
        }
    }
}
