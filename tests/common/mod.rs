//! Shared test utilities and constants.

#![allow(dead_code)]

use std::path::Path;
use std::time::Duration;

use order_listener::config::ListenerConfig;
use order_listener::notify::ListenerEvent;
use tokio::sync::mpsc::UnboundedReceiver;

/// A complete order confirmation as the server writes it, without the newline.
pub const ORDER_LINE: &str = r#"{"order_id":"O1","payment_method":"cash","user_session_id":"s1","items":[],"total_amount":9.99,"message":"ok","timestamp":"2024-01-01T00:00:00"}"#;

/// Config with short timings and the socket placed in `dir`.
pub fn test_config(dir: &Path) -> ListenerConfig {
    ListenerConfig {
        socket_dir: dir.to_path_buf(),
        connect_timeout: Duration::from_millis(200),
        reconnect_delay: Duration::from_millis(10),
        poll_interval: Duration::from_millis(5),
        ..ListenerConfig::default()
    }
}

/// Waits for the next listener event, failing the test after five seconds.
pub async fn next_event(rx: &mut UnboundedReceiver<ListenerEvent>) -> ListenerEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for listener event")
        .expect("listener event channel closed")
}
