//! Channel connection lifecycle management.
//!
//! [`ConnectionManager`] connects to the channel, hands each connected stream
//! to the line handler, and reconnects after a fixed pause whenever the
//! stream ends. The loop keeps going across any number of connection cycles
//! until its cancellation token fires.

use chrono::{DateTime, Local};
use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::framing::{LineReader, lines};
use super::handler::handle_line;
use super::Connector;
use crate::config::ListenerConfig;
use crate::notify::{ListenerEvent, Notifier};
use crate::{ListenerError, Result};

/// Where the manager currently is in its connection cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Counters and flags that persist across connection cycles.
///
/// Nothing here is reset on reconnect: the attempt and received counters only
/// grow and the first connection time is recorded once.
#[derive(Debug, Clone, Default)]
pub struct ConnectionState {
    pub status: ConnectionStatus,
    pub attempts: u64,
    pub first_connected_at: Option<DateTime<Local>>,
    pub orders_received: u64,
}

/// Why the reader loop exited.
enum DisconnectReason {
    /// The server closed the channel.
    Closed,
    /// Reading from the channel failed.
    ReadFailed(ListenerError),
    /// The cancellation token fired.
    Shutdown,
}

/// Keeps a single inbound connection to the channel alive.
pub struct ConnectionManager<C, N> {
    config: ListenerConfig,
    connector: C,
    notifier: N,
    state: ConnectionState,
}

impl<C: Connector, N: Notifier> ConnectionManager<C, N> {
    /// Creates a new connection manager in the `Disconnected` state.
    #[must_use]
    pub fn new(config: ListenerConfig, connector: C, notifier: N) -> Self {
        Self {
            config,
            connector,
            notifier,
            state: ConnectionState::default(),
        }
    }

    /// Current connection state.
    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// Makes one bounded attempt to open the channel.
    ///
    /// Every attempt is counted. While disconnected, a status line goes out
    /// on every `status_interval`-th attempt only.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::ConnectTimeout`] if the channel did not
    /// accept within the connect timeout, or whatever error the connector
    /// reported.
    pub async fn attempt_connect(&mut self) -> Result<C::Stream> {
        self.state.attempts += 1;
        let attempt = self.state.attempts;

        if self.state.status == ConnectionStatus::Disconnected
            && self.config.status_interval > 0
            && attempt % self.config.status_interval == 0
        {
            debug!(attempt, "Still waiting for order server");
            self.notifier.notify(ListenerEvent::WaitingForServer { attempt });
        }

        self.state.status = ConnectionStatus::Connecting;
        let timeout = self.config.connect_timeout;
        let outcome = match tokio::time::timeout(timeout, self.connector.connect()).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ListenerError::ConnectTimeout(timeout)),
        };

        match outcome {
            Ok(stream) => {
                self.mark_connected();
                Ok(stream)
            }
            Err(e) => {
                self.state.status = ConnectionStatus::Disconnected;
                Err(e)
            }
        }
    }

    /// Runs the connect/read/reconnect loop until `cancel` fires.
    ///
    /// Connect waits, line reads and the pause between cycles all return
    /// promptly on cancellation, dropping any open stream.
    pub async fn run(&mut self, cancel: CancellationToken) {
        let address = self.connector.address();
        debug!(channel = %address, "Order listener started");
        self.notifier.notify(ListenerEvent::Started {
            channel: address,
            at: Local::now(),
        });

        loop {
            let outcome = tokio::select! {
                () = cancel.cancelled() => break,
                outcome = self.attempt_connect() => outcome,
            };

            match outcome {
                Ok(stream) => match self.read_loop(stream, &cancel).await {
                    DisconnectReason::Closed => self.mark_lost(None),
                    DisconnectReason::ReadFailed(e) => self.mark_lost(Some(e)),
                    DisconnectReason::Shutdown => break,
                },
                Err(e) if e.is_timeout() => {
                    debug!(attempt = self.state.attempts, "Connect attempt timed out");
                }
                Err(e) => {
                    debug!(attempt = self.state.attempts, error = %e, "Connection failed");
                    self.notifier.notify(ListenerEvent::ConnectFailed {
                        attempt: self.state.attempts,
                        error: e,
                    });
                }
            }

            tokio::select! {
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(self.config.reconnect_delay) => {}
            }
        }

        self.state.status = ConnectionStatus::Disconnected;
        debug!(
            orders_received = self.state.orders_received,
            attempts = self.state.attempts,
            "Order listener stopped"
        );
        self.notifier.notify(ListenerEvent::Stopped {
            orders_received: self.state.orders_received,
            attempts: self.state.attempts,
        });
    }

    /// Reads lines from one connection until it ends or `cancel` fires.
    async fn read_loop(
        &mut self,
        stream: C::Stream,
        cancel: &CancellationToken,
    ) -> DisconnectReason {
        let lines = lines(LineReader::new(stream, self.config.max_line_bytes));
        tokio::pin!(lines);

        loop {
            tokio::select! {
                () = cancel.cancelled() => return DisconnectReason::Shutdown,
                line = lines.next() => match line {
                    Some(Ok(line)) => {
                        if let Some(event) =
                            handle_line(&line, &mut self.state, self.config.preview_chars)
                        {
                            self.notifier.notify(event);
                        }
                    }
                    Some(Err(e)) => return DisconnectReason::ReadFailed(e),
                    None => return DisconnectReason::Closed,
                },
            }
        }
    }

    fn mark_connected(&mut self) {
        let now = Local::now();
        let first = self.state.first_connected_at.is_none();
        if first {
            self.state.first_connected_at = Some(now);
        }
        self.state.status = ConnectionStatus::Connected;

        debug!(attempt = self.state.attempts, first, "Connected to order server");
        self.notifier.notify(ListenerEvent::Connected { at: now, first });
    }

    /// Emits the connection-lost notice once per connected period.
    fn mark_lost(&mut self, error: Option<ListenerError>) {
        if self.state.status != ConnectionStatus::Connected {
            return;
        }
        self.state.status = ConnectionStatus::Disconnected;

        match &error {
            Some(e) => debug!(error = %e, "Connection lost"),
            None => debug!("Connection closed by server"),
        }
        self.notifier.notify(ListenerEvent::ConnectionLost { error });
    }
}
