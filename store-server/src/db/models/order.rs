//! Order model
//!
//! Line items, customer and gift fields are snapshots frozen at
//! checkout time, not references into the live catalog, so
//! historical orders survive later product edits.

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use shared::{CustomerInfo, GiftInfo, OrderItem, OrderStatus};
use surrealdb::RecordId;

/// Order document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    /// Unique sequential code (`SC-0000001`), immutable once assigned
    pub code: String,
    /// Identity uid of the placing customer; None for guest orders
    #[serde(default)]
    pub user_id: Option<String>,
    pub items: Vec<OrderItem>,
    /// Grand total including delivery fee
    pub total: f64,
    pub customer: CustomerInfo,
    #[serde(default)]
    pub gift: Option<GiftInfo>,
    /// URL of the uploaded bank-transfer slip
    #[serde(default)]
    pub slip_url: Option<String>,
    pub status: OrderStatus,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Content written when creating an order (id assigned by the store)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderContent {
    pub code: String,
    pub user_id: Option<String>,
    pub items: Vec<OrderItem>,
    pub total: f64,
    pub customer: CustomerInfo,
    pub gift: Option<GiftInfo>,
    pub slip_url: String,
    pub status: OrderStatus,
    pub created_at: String,
    pub updated_at: String,
}

/// Owner edit of the limited mutable order fields.
///
/// Everything else on an order is immutable after creation; status
/// has its own operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderEdit {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gift: Option<GiftInfo>,
}

impl OrderEdit {
    pub fn is_empty(&self) -> bool {
        self.total.is_none() && self.customer.is_none() && self.gift.is_none()
    }
}
