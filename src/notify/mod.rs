//! Notifications emitted by the listener.
//!
//! The connection loop reports everything a user may want to see as a
//! [`ListenerEvent`] and hands it to a [`Notifier`]. The console renderer is
//! one notifier; an mpsc sender is another, for embedding the listener in a
//! larger application.

mod console;

use chrono::{DateTime, Local};
use tokio::sync::mpsc;
use tracing::debug;

use crate::ListenerError;
use crate::models::OrderConfirmation;

pub use console::ConsoleNotifier;

/// Something that happened on the channel.
#[derive(Debug)]
pub enum ListenerEvent {
    /// The connection loop started.
    Started {
        channel: String,
        at: DateTime<Local>,
    },
    /// Still no server after `attempt` connect attempts.
    WaitingForServer { attempt: u64 },
    /// A connection was established. `first` is set only for the first
    /// connection of the process.
    Connected { at: DateTime<Local>, first: bool },
    /// An established connection ended. `error` is `None` when the server
    /// closed the channel cleanly.
    ConnectionLost { error: Option<ListenerError> },
    /// A connect attempt failed for a reason other than a timeout.
    ConnectFailed { attempt: u64, error: ListenerError },
    /// An order confirmation was decoded.
    Order {
        sequence: u64,
        order: OrderConfirmation,
    },
    /// A message could not be decoded; the connection stays open.
    DecodeFailed {
        sequence: u64,
        error: ListenerError,
        preview: String,
    },
    /// The connection loop was cancelled.
    Stopped { orders_received: u64, attempts: u64 },
}

/// Receives listener events.
pub trait Notifier {
    fn notify(&mut self, event: ListenerEvent);
}

impl Notifier for mpsc::UnboundedSender<ListenerEvent> {
    fn notify(&mut self, event: ListenerEvent) {
        if self.send(event).is_err() {
            debug!("Event receiver dropped, discarding listener event");
        }
    }
}
