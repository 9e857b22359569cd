//! Crate-level error types.
//!
//! [`ListenerError`] unifies every failure the listener can hit (configuration,
//! connecting, reading, decoding) behind a single enum. Callers that only need
//! to react to the category match on [`ListenerError::kind`] instead of
//! inspecting error text.

use std::io;
use std::time::Duration;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ListenerError>;

/// Top-level error type returned by all public APIs.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    /// A configuration value was missing or could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// The channel did not accept a connection within the connect timeout.
    #[error("timed out after {}ms waiting for channel", .0.as_millis())]
    ConnectTimeout(Duration),

    /// Opening the channel failed for a reason other than its absence.
    #[error("failed to connect to channel: {0}")]
    Connect(#[source] io::Error),

    /// Reading from an established connection failed.
    #[error("failed to read from channel: {0}")]
    Read(#[source] io::Error),

    /// A message could not be decoded into an order confirmation.
    #[error("json error: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Failure category of a [`ListenerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Timeout,
    ConnectFailure,
    ReadFailure,
    DecodeFailure,
}

impl ListenerError {
    /// Returns the failure category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Config,
            Self::ConnectTimeout(_) => ErrorKind::Timeout,
            Self::Connect(_) => ErrorKind::ConnectFailure,
            Self::Read(_) => ErrorKind::ReadFailure,
            Self::Decode(_) => ErrorKind::DecodeFailure,
        }
    }

    /// Returns `true` for routine connect timeouts.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        self.kind() == ErrorKind::Timeout
    }
}
