//! Async client for the local order confirmation channel.
//!
//! This module is organized by concern:
//! - [`connection`] - Connection lifecycle, retry and reconnect loop
//! - [`framing`] - Splitting the byte stream into newline-delimited messages
//! - [`handler`] - Decoding and dispatching individual messages
//!
//! The channel is a Unix domain socket on Unix and a named pipe on Windows.
//! Either way the client only ever reads from it.

mod connection;
mod framing;
mod handler;

use std::future::Future;
use std::io;
#[cfg(unix)]
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::io::AsyncRead;
use tracing::{debug, trace};

use crate::config::ListenerConfig;
use crate::{ListenerError, Result};

// Re-export submodule items at the module level for convenience
pub use connection::{ConnectionManager, ConnectionState, ConnectionStatus};
pub use framing::{LineReader, lines};
pub use handler::{decode_order, handle_line, payload_preview, shows_details};

/// Read half of a connection to the channel.
#[cfg(unix)]
pub type ChannelStream = tokio::net::unix::OwnedReadHalf;

/// Read-only client end of the channel's named pipe.
#[cfg(windows)]
pub type ChannelStream = tokio::net::windows::named_pipe::NamedPipeClient;

/// Opens receive-only streams to a channel.
///
/// [`ConnectionManager`] applies the connect timeout around [`connect`](Self::connect),
/// so implementations may wait for an absent channel to appear rather than
/// failing fast.
pub trait Connector {
    type Stream: AsyncRead + Unpin + Send;

    /// Human-readable address of the channel, used in status output.
    fn address(&self) -> String;

    /// Opens a new stream to the channel.
    fn connect(&mut self) -> impl Future<Output = Result<Self::Stream>> + Send;
}

/// Connector for the OS-provided local channel.
#[derive(Debug, Clone)]
pub struct LocalChannel {
    #[cfg(unix)]
    path: PathBuf,
    #[cfg(windows)]
    pipe_name: String,
    poll_interval: Duration,
}

impl LocalChannel {
    /// Resolves the channel address from the configured name.
    #[must_use]
    pub fn new(config: &ListenerConfig) -> Self {
        Self {
            #[cfg(unix)]
            path: config
                .socket_dir
                .join(format!("{}.sock", config.channel_name)),
            #[cfg(windows)]
            pipe_name: format!(r"\\.\pipe\{}", config.channel_name),
            poll_interval: config.poll_interval,
        }
    }

    /// Filesystem path of the channel's socket.
    #[cfg(unix)]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// The channel does not exist yet or nobody is accepting on it.
fn is_absent(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::ConnectionRefused
    )
}

#[cfg(unix)]
impl Connector for LocalChannel {
    type Stream = ChannelStream;

    fn address(&self) -> String {
        self.path.display().to_string()
    }

    async fn connect(&mut self) -> Result<ChannelStream> {
        loop {
            match tokio::net::UnixStream::connect(&self.path).await {
                Ok(stream) => {
                    debug!(path = %self.path.display(), "Opened channel socket");
                    // Dropping the write half shuts down our sending direction.
                    let (read, _write) = stream.into_split();
                    return Ok(read);
                }
                Err(e) if is_absent(&e) => {
                    trace!(error = %e, "Channel not available yet");
                    tokio::time::sleep(self.poll_interval).await;
                }
                Err(e) => return Err(ListenerError::Connect(e)),
            }
        }
    }
}

#[cfg(windows)]
impl Connector for LocalChannel {
    type Stream = ChannelStream;

    fn address(&self) -> String {
        self.pipe_name.clone()
    }

    async fn connect(&mut self) -> Result<ChannelStream> {
        use tokio::net::windows::named_pipe::ClientOptions;

        /// All server instances of the pipe are in use.
        const ERROR_PIPE_BUSY: i32 = 231;

        loop {
            match ClientOptions::new()
                .read(true)
                .write(false)
                .open(&self.pipe_name)
            {
                Ok(client) => {
                    debug!(pipe = %self.pipe_name, "Opened channel pipe");
                    return Ok(client);
                }
                Err(e) if is_absent(&e) || e.raw_os_error() == Some(ERROR_PIPE_BUSY) => {
                    trace!(error = %e, "Channel not available yet");
                    tokio::time::sleep(self.poll_interval).await;
                }
                Err(e) => return Err(ListenerError::Connect(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_channel_errors() {
        assert!(is_absent(&io::Error::from(io::ErrorKind::NotFound)));
        assert!(is_absent(&io::Error::from(io::ErrorKind::ConnectionRefused)));
        assert!(!is_absent(&io::Error::from(
            io::ErrorKind::PermissionDenied
        )));
    }

    #[cfg(unix)]
    #[test]
    fn socket_path_uses_channel_name() {
        let config = ListenerConfig {
            socket_dir: PathBuf::from("/run/kiosk"),
            ..ListenerConfig::default()
        };
        let channel = LocalChannel::new(&config);

        assert_eq!(
            channel.path(),
            Path::new("/run/kiosk/KioskOrderConfirmation.sock")
        );
        assert_eq!(channel.address(), "/run/kiosk/KioskOrderConfirmation.sock");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn missing_socket_keeps_polling_until_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let config = ListenerConfig {
            socket_dir: dir.path().to_path_buf(),
            poll_interval: Duration::from_millis(5),
            ..ListenerConfig::default()
        };
        let mut channel = LocalChannel::new(&config);

        let result =
            tokio::time::timeout(Duration::from_millis(50), channel.connect()).await;
        assert!(result.is_err(), "connect should still be waiting");
    }
}
