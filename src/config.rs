//! Listener configuration.
//!
//! The channel name is a fixed, well-known constant shared with the producing
//! server. The remaining knobs default to the values the server side expects
//! and can be overridden from the environment by the binary:
//! - `ORDER_LISTENER_SOCKET_DIR`: directory holding the Unix socket file
//! - `ORDER_LISTENER_CONNECT_TIMEOUT_MS`: bounded wait per connect attempt
//! - `ORDER_LISTENER_RECONNECT_DELAY_MS`: pause between connection cycles

use std::path::PathBuf;
use std::time::Duration;

use crate::{ListenerError, Result};

/// Well-known name of the order confirmation channel.
pub const CHANNEL_NAME: &str = "KioskOrderConfirmation";

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(5000);
const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(1000);
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A status line is shown on every Nth attempt while disconnected.
const DEFAULT_STATUS_INTERVAL: u64 = 5;

/// Number of characters of a rejected payload echoed back in diagnostics.
const DEFAULT_PREVIEW_CHARS: usize = 200;

/// Longest accepted message line, in bytes.
const DEFAULT_MAX_LINE_BYTES: usize = 1024 * 1024;

/// Runtime configuration for a [`ConnectionManager`](crate::channel::ConnectionManager).
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    pub channel_name: String,
    /// Directory of the socket file. Ignored on Windows, where named pipes
    /// live in their own namespace.
    pub socket_dir: PathBuf,
    pub connect_timeout: Duration,
    pub reconnect_delay: Duration,
    /// How often an absent channel is re-probed within one connect attempt.
    pub poll_interval: Duration,
    pub status_interval: u64,
    pub preview_chars: usize,
    /// A line longer than this ends the connection with a read error.
    pub max_line_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            channel_name: CHANNEL_NAME.to_string(),
            socket_dir: default_socket_dir(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            poll_interval: DEFAULT_POLL_INTERVAL,
            status_interval: DEFAULT_STATUS_INTERVAL,
            preview_chars: DEFAULT_PREVIEW_CHARS,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
        }
    }
}

/// Loads the listener configuration from defaults and environment overrides.
///
/// # Errors
///
/// Returns [`ListenerError::Config`] if a millisecond override is not a
/// positive integer.
pub fn fetch_config() -> Result<ListenerConfig> {
    let mut config = ListenerConfig::default();

    if let Some(dir) = non_empty_var("ORDER_LISTENER_SOCKET_DIR") {
        config.socket_dir = PathBuf::from(dir);
    }
    if let Some(timeout) = millis_var("ORDER_LISTENER_CONNECT_TIMEOUT_MS")? {
        config.connect_timeout = timeout;
    }
    if let Some(delay) = millis_var("ORDER_LISTENER_RECONNECT_DELAY_MS")? {
        config.reconnect_delay = delay;
    }

    Ok(config)
}

/// `$XDG_RUNTIME_DIR` when set, otherwise the OS temp directory.
fn default_socket_dir() -> PathBuf {
    non_empty_var("XDG_RUNTIME_DIR").map_or_else(std::env::temp_dir, PathBuf::from)
}

/// Returns the value of an environment variable if it exists and is non-empty.
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn millis_var(name: &str) -> Result<Option<Duration>> {
    let Some(raw) = non_empty_var(name) else {
        return Ok(None);
    };

    match raw.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(Some(Duration::from_millis(ms))),
        _ => Err(ListenerError::Config(format!(
            "{name} must be a positive number of milliseconds, got {raw:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Serializes env mutation across the tests in this module.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Helper that temporarily sets env vars, runs `f`, then restores originals.
    fn with_env<F: FnOnce()>(vars: &[(&str, Option<&str>)], f: F) {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let originals: Vec<(&str, Option<String>)> = vars
            .iter()
            .map(|(k, _)| (*k, std::env::var(k).ok()))
            .collect();

        for (k, v) in vars {
            // SAFETY: env access in this module is serialized by ENV_LOCK.
            unsafe {
                match v {
                    Some(val) => std::env::set_var(k, val),
                    None => std::env::remove_var(k),
                }
            }
        }

        f();

        for (k, original) in originals {
            // SAFETY: restoring original values while ENV_LOCK is still held.
            unsafe {
                match original {
                    Some(val) => std::env::set_var(k, val),
                    None => std::env::remove_var(k),
                }
            }
        }
    }

    #[test]
    fn defaults_without_env_vars() {
        with_env(
            &[
                ("ORDER_LISTENER_CONNECT_TIMEOUT_MS", None),
                ("ORDER_LISTENER_RECONNECT_DELAY_MS", None),
            ],
            || {
                let config = fetch_config().unwrap();
                assert_eq!(config.channel_name, "KioskOrderConfirmation");
                assert_eq!(config.connect_timeout, Duration::from_millis(5000));
                assert_eq!(config.reconnect_delay, Duration::from_millis(1000));
                assert_eq!(config.status_interval, 5);
                assert_eq!(config.preview_chars, 200);
                assert_eq!(config.max_line_bytes, 1024 * 1024);
            },
        );
    }

    #[test]
    fn overrides_from_env() {
        with_env(
            &[
                ("ORDER_LISTENER_SOCKET_DIR", Some("/run/kiosk")),
                ("ORDER_LISTENER_CONNECT_TIMEOUT_MS", Some("250")),
                ("ORDER_LISTENER_RECONNECT_DELAY_MS", Some(" 40 ")),
            ],
            || {
                let config = fetch_config().unwrap();
                assert_eq!(config.socket_dir, PathBuf::from("/run/kiosk"));
                assert_eq!(config.connect_timeout, Duration::from_millis(250));
                assert_eq!(config.reconnect_delay, Duration::from_millis(40));
                assert_eq!(config.channel_name, CHANNEL_NAME);
            },
        );
    }

    #[test]
    fn rejects_invalid_millis() {
        with_env(
            &[
                ("ORDER_LISTENER_CONNECT_TIMEOUT_MS", Some("soon")),
                ("ORDER_LISTENER_RECONNECT_DELAY_MS", None),
            ],
            || {
                let err = fetch_config().unwrap_err();
                assert!(err.to_string().contains("ORDER_LISTENER_CONNECT_TIMEOUT_MS"));
            },
        );

        with_env(
            &[
                ("ORDER_LISTENER_CONNECT_TIMEOUT_MS", None),
                ("ORDER_LISTENER_RECONNECT_DELAY_MS", Some("0")),
            ],
            || {
                assert!(fetch_config().is_err());
            },
        );
    }

    #[test]
    fn empty_values_treated_as_absent() {
        with_env(
            &[
                ("ORDER_LISTENER_CONNECT_TIMEOUT_MS", Some("")),
                ("ORDER_LISTENER_RECONNECT_DELAY_MS", Some("")),
            ],
            || {
                let config = fetch_config().unwrap();
                assert_eq!(config.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
                assert_eq!(config.reconnect_delay, DEFAULT_RECONNECT_DELAY);
            },
        );
    }
}
