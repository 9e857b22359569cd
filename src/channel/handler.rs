//! Incoming message decoding and dispatch.

use serde_json::Value;
use tracing::debug;

use super::connection::ConnectionState;
use crate::Result;
use crate::models::OrderConfirmation;
use crate::notify::ListenerEvent;

/// Number of leading orders that always get the detailed view.
const DETAIL_LEADING_ORDERS: u64 = 3;

/// After the leading orders, every Nth order gets the detailed view.
const DETAIL_EVERY: u64 = 5;

/// Decodes one message into an [`OrderConfirmation`].
///
/// Field names are matched case-insensitively and `null` members are treated
/// as absent. Unknown fields are ignored and missing fields take their
/// defaults, so only malformed JSON or a value of the wrong shape fails.
///
/// # Errors
///
/// Returns [`ListenerError::Decode`](crate::ListenerError::Decode) if the
/// line is not JSON or does not describe an order.
pub fn decode_order(line: &str) -> Result<OrderConfirmation> {
    let value: Value = serde_json::from_str(line)?;
    Ok(serde_json::from_value(normalize(value))?)
}

/// Lower-cases object keys and drops `null` members, recursively.
fn normalize(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.to_lowercase(), normalize(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(normalize).collect()),
        other => other,
    }
}

/// Returns at most `max_chars` characters from the start of `payload`.
#[must_use]
pub fn payload_preview(payload: &str, max_chars: usize) -> &str {
    match payload.char_indices().nth(max_chars) {
        Some((end, _)) => &payload[..end],
        None => payload,
    }
}

/// Whether the order with this sequence number gets the detailed view.
#[must_use]
pub fn shows_details(sequence: u64) -> bool {
    sequence <= DETAIL_LEADING_ORDERS || sequence % DETAIL_EVERY == 0
}

/// Processes one received line.
///
/// Empty lines are skipped. Every other line bumps the received counter
/// before decoding is attempted, so the sequence number counts lines seen
/// rather than orders decoded.
pub fn handle_line(
    line: &str,
    state: &mut ConnectionState,
    preview_chars: usize,
) -> Option<ListenerEvent> {
    if line.is_empty() {
        return None;
    }

    state.orders_received += 1;
    let sequence = state.orders_received;

    match decode_order(line) {
        Ok(order) => {
            debug!(
                sequence,
                order_id = order.order_id,
                items = order.item_count(),
                "Received order confirmation"
            );
            Some(ListenerEvent::Order { sequence, order })
        }
        Err(e) => {
            let preview = payload_preview(line, preview_chars);
            debug!(sequence, error = %e, preview, "Failed to decode order confirmation");
            Some(ListenerEvent::DecodeFailed {
                sequence,
                error: e,
                preview: preview.to_string(),
            })
        }
    }
}
