//! Wire models for messages received on the order confirmation channel.

pub mod order;

pub use order::{OrderConfirmation, OrderItem};
