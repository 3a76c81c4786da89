//! Analytics Repository
//!
//! Read side of the singleton `analytics:summary` aggregate, plus the
//! UPSERT statement builders the order repository embeds into its own
//! transactions. Mutations only ever happen inside those
//! transactions, so the aggregate can never drift from the order
//! state it mirrors: either both commit or neither does.
//!
//! Status counts decrement with a floor at zero. `revenueCompleted`
//! is kept symmetric: entering `completed` adds the order total,
//! leaving it subtracts (also floored at zero).

use super::{BaseRepository, RepoResult};
use crate::db::models::AnalyticsSummary;
use shared::OrderStatus;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

/// UPSERT statement applied when an order is created.
///
/// Binds: `$total`. Status is a closed enum, so its name is
/// interpolated, never user input.
pub(crate) fn on_created_statement(status: OrderStatus) -> String {
    let s = status.as_str();
    format!(
        "UPSERT analytics:summary SET \
         totalOrders = (totalOrders ?? 0) + 1, \
         revenueTotal = (revenueTotal ?? 0) + $total, \
         statusCounts.{s} = (statusCounts.{s} ?? 0) + 1;"
    )
}

/// UPSERT statement applied when an order changes status.
///
/// Binds: `$total`. A no-op transition (old == new) produces no
/// status-count churn and no revenue movement.
pub(crate) fn on_status_changed_statement(old: OrderStatus, new: OrderStatus) -> String {
    let mut clauses: Vec<String> = Vec::new();

    if old != new {
        let (o, n) = (old.as_str(), new.as_str());
        clauses.push(format!(
            "statusCounts.{o} = math::max([0, (statusCounts.{o} ?? 0) - 1])"
        ));
        clauses.push(format!("statusCounts.{n} = (statusCounts.{n} ?? 0) + 1"));

        if new == OrderStatus::Completed {
            clauses.push("revenueCompleted = (revenueCompleted ?? 0) + $total".into());
        } else if old == OrderStatus::Completed {
            clauses.push("revenueCompleted = math::max([0, (revenueCompleted ?? 0) - $total])".into());
        }
    }

    if clauses.is_empty() {
        // Touch nothing; a bare UPSERT would still create the record
        "RETURN NONE;".to_string()
    } else {
        format!("UPSERT analytics:summary SET {};", clauses.join(", "))
    }
}

#[derive(Clone)]
pub struct AnalyticsRepository {
    base: BaseRepository,
}

impl AnalyticsRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// The aggregate document (zeroed default before the first order)
    pub async fn summary(&self) -> RepoResult<AnalyticsSummary> {
        let mut result = self
            .base
            .db()
            .query("SELECT * OMIT id FROM analytics:summary")
            .await?;
        let summaries: Vec<AnalyticsSummary> = result.take(0)?;
        Ok(summaries.into_iter().next().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_statement_targets_the_given_status() {
        let stmt = on_created_statement(OrderStatus::Paid);
        assert!(stmt.contains("statusCounts.paid"));
        assert!(stmt.contains("totalOrders"));
        assert!(stmt.contains("revenueTotal"));
    }

    #[test]
    fn transition_into_completed_adds_revenue() {
        let stmt = on_status_changed_statement(OrderStatus::Preparing, OrderStatus::Completed);
        assert!(stmt.contains("revenueCompleted = (revenueCompleted ?? 0) + $total"));
        assert!(stmt.contains("statusCounts.preparing"));
        assert!(stmt.contains("statusCounts.completed"));
    }

    #[test]
    fn transition_out_of_completed_subtracts_revenue() {
        let stmt = on_status_changed_statement(OrderStatus::Completed, OrderStatus::Paid);
        assert!(stmt.contains("revenueCompleted = math::max([0, (revenueCompleted ?? 0) - $total])"));
    }

    #[test]
    fn lateral_transition_leaves_revenue_untouched() {
        let stmt = on_status_changed_statement(OrderStatus::Paid, OrderStatus::Shipped);
        assert!(!stmt.contains("revenueCompleted"));
    }

    #[test]
    fn self_transition_is_a_no_op() {
        let stmt = on_status_changed_statement(OrderStatus::Paid, OrderStatus::Paid);
        assert!(!stmt.contains("UPSERT"));
    }
}
