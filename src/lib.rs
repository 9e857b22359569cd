//! Resilient client for the kiosk order confirmation channel.
//!
//! Connects to a local named channel (a Unix domain socket, or a named pipe
//! on Windows), reads newline-delimited JSON order confirmations, and reports
//! each one through a [`notify::Notifier`]. Absent servers, dropped
//! connections and malformed messages are all survived without a restart.

pub mod channel;
pub mod config;
pub mod error;
pub mod models;
pub mod notify;

pub use error::{ErrorKind, ListenerError, Result};
