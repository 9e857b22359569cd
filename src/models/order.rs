//! Order confirmation models.
//!
//! Every field defaults when absent so that a sparse event still renders.
//! Field names are matched case-insensitively by
//! [`decode_order`](crate::channel::decode_order), which normalizes keys to
//! the lower-case names used here before deserializing.

use rust_decimal::Decimal;
use serde::Deserialize;

/// One completed order, as emitted by the kiosk server.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct OrderConfirmation {
    pub order_id: String,
    pub payment_method: String,
    pub user_session_id: String,
    pub items: Vec<OrderItem>,
    pub total_amount: Decimal,
    pub message: String,
    /// Passed through verbatim, never parsed.
    pub timestamp: String,
}

/// A single line item within an [`OrderConfirmation`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct OrderItem {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    /// Unit price.
    pub price: Decimal,
}

impl OrderConfirmation {
    /// Number of line items on the order.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.items.len()
    }
}
