//! Order domain types
//!
//! Line items are point-in-time snapshots of the purchased product
//! (title and price at purchase), not references to the live catalog.
//! Historical orders must stay accurate after later product edits.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Order status state machine.
///
/// Orders are created directly in `Paid`: a payment slip is a
/// mandatory part of checkout, so there is no pending-payment state.
/// The documented flow is linear (`paid → preparing → shipped →
/// completed`), but the data layer accepts any forward or backward
/// write; the admin UI is what presents the usual forward order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Paid,
    Preparing,
    Shipped,
    Completed,
}

impl OrderStatus {
    /// All statuses, in documented flow order
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Paid,
        OrderStatus::Preparing,
        OrderStatus::Shipped,
        OrderStatus::Completed,
    ];

    /// Stable lowercase name, matching the serialized form
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Paid => "paid",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Purchased line item snapshot
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    /// Catalog product id the snapshot was taken from
    pub product_id: String,
    #[validate(length(min = 1))]
    pub title: String,
    /// Unit price at time of purchase
    #[validate(range(exclusive_min = 0.0))]
    pub price: f64,
    #[validate(range(min = 1))]
    pub qty: u32,
}

/// Customer contact snapshot stored on the order
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    #[validate(length(min = 1, message = "full name is required"))]
    pub full_name: String,
    #[validate(length(min = 1, message = "phone is required"))]
    pub phone: String,
    #[serde(default)]
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 1, message = "address is required"))]
    pub address: String,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
}

/// Optional gift recipient snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftInfo {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub recipient_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&OrderStatus::Preparing).unwrap();
        assert_eq!(json, "\"preparing\"");
        let back: OrderStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(back, OrderStatus::Completed);
    }

    #[test]
    fn customer_info_requires_contact_fields() {
        let info = CustomerInfo {
            full_name: String::new(),
            phone: "123".into(),
            email: None,
            address: "Main St 1".into(),
            postal_code: None,
            city: None,
        };
        assert!(info.validate().is_err());
    }

    #[test]
    fn item_qty_must_be_positive() {
        let item = OrderItem {
            product_id: "p1".into(),
            title: "Vanilla".into(),
            price: 10.0,
            qty: 0,
        };
        assert!(item.validate().is_err());
    }
}
