//! Shared domain types for the candle storefront
//!
//! Types used by both the store server and API clients:
//! order snapshots, the order status state machine, order/customer
//! code formatting, decimal money helpers and stock-threshold logic.

pub mod code;
pub mod money;
pub mod order;
pub mod stock;

// Re-exports
pub use code::{format_order_code, is_customer_code, parse_order_code, ORDER_CODE_PREFIX};
pub use order::{CustomerInfo, GiftInfo, OrderItem, OrderStatus};
pub use stock::{StockAdjustment, StockChange, LOW_STOCK_THRESHOLD};
