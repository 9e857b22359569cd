use order_listener::ListenerError;
use order_listener::channel::{ConnectionManager, LocalChannel};
use order_listener::config::fetch_config;
use order_listener::notify::ConsoleNotifier;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), ListenerError> {
    // Diagnostics go to stderr; stdout carries the order notifications.
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let config = fetch_config()?;
    let channel = LocalChannel::new(&config);
    let mut manager = ConnectionManager::new(config, channel, ConsoleNotifier::stdout());

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupt received, shutting down");
                on_ctrl_c.cancel();
            }
            Err(e) => warn!("Failed to listen for Ctrl-C, running until killed: {e}"),
        }
    });

    manager.run(cancel).await;

    Ok(())
}
