//! Analytics summary model
//!
//! A single aggregate document (`analytics:summary`) kept in
//! lock-step with the order table: it is only ever mutated inside the
//! same transaction as the order mutation it reflects.

use serde::{Deserialize, Serialize};
use shared::OrderStatus;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    /// Count of all orders ever created (deletion does not decrement)
    #[serde(default)]
    pub total_orders: i64,
    /// Sum of totals of all orders ever created
    #[serde(default)]
    pub revenue_total: f64,
    /// Sum of totals of orders currently in `completed`
    #[serde(default)]
    pub revenue_completed: f64,
    /// Count of orders currently in each status; values sum to
    /// `total_orders`
    #[serde(default)]
    pub status_counts: BTreeMap<OrderStatus, i64>,
}

impl AnalyticsSummary {
    pub fn status_count(&self, status: OrderStatus) -> i64 {
        self.status_counts.get(&status).copied().unwrap_or(0)
    }

    /// Sum of all per-status counts
    pub fn status_counts_sum(&self) -> i64 {
        self.status_counts.values().sum()
    }
}
