//! Order Repository
//!
//! The order aggregate. Creation decrements stock for every line
//! item, writes the order document and bumps the analytics summary in
//! one transaction; a missing product rolls the whole thing back.
//! Status changes use a compare-and-set on the previous status so the
//! analytics deltas always match the transition that actually
//! happened, even under concurrent updates.

use super::{
    analytics::{on_created_statement, on_status_changed_statement},
    BaseRepository, RepoError, RepoResult, is_conflict, retry_backoff, statement_errors,
    strip_table_prefix, MAX_TXN_RETRIES,
};
use crate::db::models::{Order, OrderContent, OrderEdit};
use serde::Deserialize;
use shared::{OrderStatus, StockChange};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const ORDER_TABLE: &str = "order";
const PRODUCT_TABLE: &str = "product";

/// Per-line-item stock movement from order creation
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub product_id: String,
    pub title: String,
    pub before: i64,
    pub after: i64,
}

impl StockMovement {
    pub fn change(&self) -> StockChange {
        StockChange {
            before: self.before,
            after: self.after,
        }
    }
}

/// Everything the single creation transaction produced
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedOrder {
    pub order: Order,
    pub stock: Vec<StockMovement>,
}

/// Result of a status transition, carried out for notifications
#[derive(Debug, Clone)]
pub struct StatusTransition {
    pub order: Order,
    pub previous: OrderStatus,
}

#[derive(Clone)]
pub struct OrderRepository {
    base: BaseRepository,
}

impl OrderRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// All orders, newest first
    pub async fn find_all(&self) -> RepoResult<Vec<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query("SELECT * FROM order ORDER BY createdAt DESC")
            .await?
            .take(0)?;
        Ok(orders)
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Order>> {
        let pure_id = strip_table_prefix(ORDER_TABLE, id);
        let order: Option<Order> = self.base.db().select((ORDER_TABLE, pure_id)).await?;
        Ok(order)
    }

    pub async fn find_by_code(&self, code: &str) -> RepoResult<Option<Order>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM order WHERE code = $code LIMIT 1")
            .bind(("code", code.to_string()))
            .await?;
        let orders: Vec<Order> = result.take(0)?;
        Ok(orders.into_iter().next())
    }

    /// Highest order code on record, if any orders exist.
    ///
    /// Codes are fixed-width, so lexicographic order matches numeric
    /// order and a plain ORDER BY suffices.
    pub async fn latest_code(&self) -> RepoResult<Option<String>> {
        let mut result = self
            .base
            .db()
            .query("SELECT VALUE code FROM order ORDER BY code DESC LIMIT 1")
            .await?;
        let codes: Vec<String> = result.take(0)?;
        Ok(codes.into_iter().next())
    }

    /// Create an order, consuming stock for every line item.
    ///
    /// One transaction covers: per-item product existence check,
    /// per-item stock decrement (clamped at zero), the order document
    /// itself and the analytics summary. If any item names a missing
    /// product the transaction THROWs and nothing is written. The
    /// unique index on `code` rejects a reused code as a duplicate.
    pub async fn create_with_stock(&self, content: OrderContent) -> RepoResult<CreatedOrder> {
        let mut attempt = 0;
        loop {
            match self.try_create_with_stock(content.clone()).await {
                Err(e) if is_conflict(&e) && attempt < MAX_TXN_RETRIES => {
                    attempt += 1;
                    retry_backoff(attempt).await;
                }
                other => return other,
            }
        }
    }

    async fn try_create_with_stock(&self, content: OrderContent) -> RepoResult<CreatedOrder> {
        let now = content.updated_at.clone();
        let total = content.total;
        let status = content.status;

        let mut statements = String::from("BEGIN TRANSACTION;\n");
        let mut stock_entries: Vec<String> = Vec::with_capacity(content.items.len());
        for (i, _) in content.items.iter().enumerate() {
            statements.push_str(&format!(
                "LET $p{i} = SELECT * FROM type::thing('product', $pid{i});\n\
                 IF array::len($p{i}) = 0 {{ THROW 'order item product missing: ' + $pid{i} }};\n\
                 LET $after{i} = (UPDATE type::thing('product', $pid{i})\n\
                     SET stock = math::max([0, stock - $qty{i}]), updatedAt = $now\n\
                     RETURN VALUE stock);\n"
            ));
            stock_entries.push(format!(
                "{{ productId: $pid{i}, title: $p{i}[0].title, before: $p{i}[0].stock, after: $after{i}[0] }}"
            ));
        }
        statements.push_str("LET $order = (CREATE order CONTENT $content)[0];\n");
        statements.push_str(&on_created_statement(status));
        statements.push_str(&format!(
            "\nRETURN {{ order: $order, stock: [{}] }};\nCOMMIT TRANSACTION;",
            stock_entries.join(", ")
        ));

        let mut query = self
            .base
            .db()
            .query(statements)
            .bind(("content", content.clone()))
            .bind(("total", total))
            .bind(("now", now));
        for (i, item) in content.items.iter().enumerate() {
            let pure_id = strip_table_prefix(PRODUCT_TABLE, &item.product_id).to_string();
            query = query
                .bind((format!("pid{i}"), pure_id))
                .bind((format!("qty{i}"), item.qty));
        }

        // An aborted transaction reports its THROW or index violation
        // as a statement error, never through `take`
        let mut result = query.await.map_err(|e| map_create_error(&e.to_string()))?;
        if let Some(errors) = statement_errors(&mut result) {
            return Err(map_create_error(&errors));
        }
        let created: Option<CreatedOrder> = result.take(0)?;
        created.ok_or_else(|| RepoError::Database("order creation returned no record".into()))
    }

    /// Change an order's status, keeping analytics in lockstep.
    ///
    /// The UPDATE is conditioned on the status read beforehand; if a
    /// concurrent change already moved it, the transaction THROWs and
    /// the whole read-then-update is retried against the fresh value.
    pub async fn update_status(&self, id: &str, new: OrderStatus) -> RepoResult<StatusTransition> {
        let mut attempt = 0;
        loop {
            let current = self
                .find_by_id(id)
                .await?
                .ok_or_else(|| RepoError::NotFound(format!("Order {id}")))?;
            let old = current.status;

            if old == new {
                // Idempotent re-apply; nothing moves
                return Ok(StatusTransition {
                    order: current,
                    previous: old,
                });
            }

            match self.try_update_status(id, old, new, current.total).await {
                Ok(order) => return Ok(StatusTransition { order, previous: old }),
                Err(e) if is_retryable_transition(&e) && attempt < MAX_TXN_RETRIES => {
                    attempt += 1;
                    retry_backoff(attempt).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn try_update_status(
        &self,
        id: &str,
        old: OrderStatus,
        new: OrderStatus,
        total: f64,
    ) -> RepoResult<Order> {
        let query = format!(
            "BEGIN TRANSACTION;\n\
             LET $updated = (UPDATE type::thing('order', $id)\n\
                 SET status = $new, updatedAt = $now\n\
                 WHERE status = $old RETURN AFTER);\n\
             IF array::len($updated) = 0 {{ THROW 'order status moved concurrently' }};\n\
             {}\n\
             RETURN $updated[0];\n\
             COMMIT TRANSACTION;",
            on_status_changed_statement(old, new)
        );

        let pure_id = strip_table_prefix(ORDER_TABLE, id).to_string();
        let mut result = self
            .base
            .db()
            .query(query)
            .bind(("id", pure_id))
            .bind(("old", old))
            .bind(("new", new))
            .bind(("total", total))
            .bind(("now", chrono::Utc::now().to_rfc3339()))
            .await?;

        // A CAS miss aborts the transaction; the THROW text lands in
        // the statement errors and drives the retry decision
        if let Some(errors) = statement_errors(&mut result) {
            return Err(RepoError::Database(errors));
        }
        let updated: Option<Order> = result.take(0)?;
        updated.ok_or_else(|| RepoError::NotFound(format!("Order {id}")))
    }

    /// Stamp a signed-in customer's uid onto the guest orders placed
    /// with their email address.
    ///
    /// Orders that already belong to a uid are left alone; email
    /// comparison is case-insensitive. Returns how many orders were
    /// claimed, so repeating the call is harmless.
    pub async fn claim_guest_orders(&self, uid: &str, email: &str) -> RepoResult<u64> {
        let mut result = self
            .base
            .db()
            .query(
                "UPDATE order SET userId = $uid, updatedAt = $now \
                 WHERE userId = NONE \
                   AND customer.email != NONE \
                   AND string::lowercase(customer.email) = string::lowercase($email) \
                 RETURN AFTER",
            )
            .bind(("uid", uid.to_string()))
            .bind(("email", email.to_string()))
            .bind(("now", chrono::Utc::now().to_rfc3339()))
            .await?;
        let claimed: Vec<Order> = result.take(0)?;
        Ok(claimed.len() as u64)
    }

    /// Merge the limited editable fields into an order
    pub async fn edit(&self, id: &str, data: OrderEdit) -> RepoResult<Order> {
        if data.is_empty() {
            return Err(RepoError::Validation("no editable fields provided".into()));
        }
        if let Some(total) = data.total {
            if !total.is_finite() || total < 0.0 {
                return Err(RepoError::Validation("total must be a non-negative number".into()));
            }
        }

        let mut merge = serde_json::to_value(&data)
            .map_err(|e| RepoError::Validation(format!("Unserializable edit: {e}")))?;
        if let Some(map) = merge.as_object_mut() {
            map.insert("updatedAt".into(), chrono::Utc::now().to_rfc3339().into());
        }

        let pure_id = strip_table_prefix(ORDER_TABLE, id).to_string();
        let mut result = self
            .base
            .db()
            .query("UPDATE type::thing('order', $id) MERGE $data RETURN AFTER")
            .bind(("id", pure_id))
            .bind(("data", merge))
            .await?;

        let updated: Vec<Order> = result.take(0)?;
        updated
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Order {id}")))
    }

    /// Delete an order, returning the removed document so the caller
    /// can clean up its slip blob afterwards.
    ///
    /// Stock is not restocked and analytics are not rewound; deletion
    /// is an owner-side correction, not a cancellation flow.
    pub async fn delete(&self, id: &str) -> RepoResult<Order> {
        let pure_id = strip_table_prefix(ORDER_TABLE, id);
        let deleted: Option<Order> = self.base.db().delete((ORDER_TABLE, pure_id)).await?;
        deleted.ok_or_else(|| RepoError::NotFound(format!("Order {id}")))
    }
}

/// CAS misses are retried like commit conflicts
fn is_retryable_transition(err: &RepoError) -> bool {
    if is_conflict(err) {
        return true;
    }
    matches!(err, RepoError::Database(msg) if msg.contains("order status moved concurrently"))
}

/// Map creation THROWs and unique-index hits to typed errors
fn map_create_error(msg: &str) -> RepoError {
    if msg.contains("order item product missing") {
        RepoError::NotFound("Product referenced by an order item".into())
    } else if msg.contains("order_code_unique") {
        RepoError::Duplicate("order code already in use".into())
    } else {
        RepoError::Database(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // An aborted transaction buries the interesting text among
    // generic "not executed" markers from the sibling statements
    const ABORT_MARKER: &str = "The query was not executed due to a failed transaction";

    #[test]
    fn create_error_mapping() {
        let missing = format!(
            "{ABORT_MARKER}; An error occurred: order item product missing: abc; {ABORT_MARKER}"
        );
        assert!(matches!(map_create_error(&missing), RepoError::NotFound(_)));

        let dup = format!(
            "{ABORT_MARKER}; Database index `order_code_unique` already contains 'SC-0000001', with record `order:x`"
        );
        assert!(matches!(map_create_error(&dup), RepoError::Duplicate(_)));

        // A bare abort with no classified cause stays a database error
        assert!(matches!(map_create_error(ABORT_MARKER), RepoError::Database(_)));
    }

    #[test]
    fn cas_miss_is_retryable() {
        let miss = RepoError::Database(format!(
            "An error occurred: order status moved concurrently; {ABORT_MARKER}"
        ));
        assert!(is_retryable_transition(&miss));
        assert!(!is_retryable_transition(&RepoError::NotFound("x".into())));
    }
}
