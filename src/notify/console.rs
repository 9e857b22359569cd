//! Plain-text rendering of listener events for a terminal.

use std::fmt::Write as _;
use std::io::{self, Write};

use chrono::{DateTime, Local};
use tracing::warn;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::{ListenerEvent, Notifier};
use crate::channel::shows_details;
use crate::models::OrderConfirmation;

const RULE: &str = "========================================";

/// Inner width of the order details box, in terminal columns.
const BOX_WIDTH: usize = 45;

/// Writes a human-readable line (or block) per event.
pub struct ConsoleNotifier<W> {
    out: W,
}

impl ConsoleNotifier<io::Stdout> {
    /// Notifier that prints to standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleNotifier<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Consumes the notifier, returning the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Notifier for ConsoleNotifier<W> {
    fn notify(&mut self, event: ListenerEvent) {
        let text = render(&event, Local::now());
        if let Err(e) = self
            .out
            .write_all(text.as_bytes())
            .and_then(|()| self.out.flush())
        {
            warn!("Failed to write notification: {e}");
        }
    }
}

/// Renders one event as newline-terminated text.
fn render(event: &ListenerEvent, now: DateTime<Local>) -> String {
    let clock = now.format("%H:%M:%S");
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = match event {
        ListenerEvent::Started { channel, at } => writeln!(
            out,
            "{RULE}\n     ORDER CONFIRMATION LISTENER\n{RULE}\n\
             Channel: {channel}\n\
             Started: {}\n\
             Status: Waiting for order server...\n\
             {RULE}\n",
            at.format("%Y-%m-%d %H:%M:%S")
        ),
        ListenerEvent::WaitingForServer { attempt } => writeln!(
            out,
            "[{clock}] Still waiting for order server... (attempt {attempt})"
        ),
        ListenerEvent::Connected { first, .. } => {
            let verb = if *first { "CONNECTED" } else { "RECONNECTED" };
            writeln!(
                out,
                "\n[{clock}] {verb} to order server!\nReady to receive order confirmations...\n"
            )
        }
        ListenerEvent::ConnectionLost { error } => match error {
            Some(e) => writeln!(out, "\n[{clock}] Connection lost ({e}). Reconnecting..."),
            None => writeln!(out, "\n[{clock}] Connection closed by server. Reconnecting..."),
        },
        ListenerEvent::ConnectFailed { error, .. } => writeln!(out, "[{clock}] Error: {error}"),
        ListenerEvent::Order { sequence, order } => {
            render_order(&mut out, *sequence, order, &clock.to_string())
        }
        ListenerEvent::DecodeFailed { error, preview, .. } => writeln!(
            out,
            "\n[{clock}] JSON Error: {error}\nData (first {} chars): {preview}",
            preview.chars().count()
        ),
        ListenerEvent::Stopped {
            orders_received,
            attempts,
        } => writeln!(
            out,
            "\n[{clock}] Listener stopped. Orders received: {orders_received}, \
             connection attempts: {attempts}"
        ),
    };

    out
}

/// Summary for every order, plus the detail box and item list when the
/// display policy asks for it.
fn render_order(
    out: &mut String,
    sequence: u64,
    order: &OrderConfirmation,
    clock: &str,
) -> std::fmt::Result {
    writeln!(out, "\n[{clock}] NEW ORDER #{sequence}")?;
    writeln!(out, "    ID: {}", order.order_id)?;
    writeln!(out, "    Payment: {}", order.payment_method)?;
    writeln!(out, "    Total: ${:.2}", order.total_amount)?;
    writeln!(out, "    Items: {}", order.item_count())?;

    if !shows_details(sequence) {
        return Ok(());
    }

    let border = "─".repeat(BOX_WIDTH);
    writeln!(out, "    ┌{border}┐")?;
    for row in [
        "Order Details".to_string(),
        format!("User: {}", order.user_session_id),
        format!("Time: {}", order.timestamp),
        format!("Message: {}", order.message),
    ] {
        writeln!(out, "    │ {} │", fit(&row, BOX_WIDTH - 2))?;
    }
    writeln!(out, "    └{border}┘")?;

    if !order.items.is_empty() {
        writeln!(out, "    Items:")?;
        for item in &order.items {
            writeln!(
                out,
                "      • {} (x{}) @ ${:.2}",
                item.product_name, item.quantity, item.price
            )?;
        }
    }

    Ok(())
}

/// Pads or truncates `text` to exactly `width` terminal columns.
fn fit(text: &str, width: usize) -> String {
    if text.width() <= width {
        let padding = width - text.width();
        return format!("{text}{}", " ".repeat(padding));
    }

    let mut fitted = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width - 1 {
            break;
        }
        fitted.push(c);
        used += w;
    }
    fitted.push('…');
    used += 1;
    fitted.push_str(&" ".repeat(width - used));
    fitted
}
