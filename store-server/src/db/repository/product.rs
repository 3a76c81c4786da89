//! Product Repository
//!
//! Catalog CRUD plus the stock ledger. Stock is only ever mutated
//! through [`adjust_stock`] or the order-creation transaction, never
//! a plain read-then-unconditional-write, so concurrent checkouts
//! cannot lose updates.
//!
//! [`adjust_stock`]: ProductRepository::adjust_stock

use super::{
    BaseRepository, RepoError, RepoResult, is_conflict, retry_backoff, statement_errors,
    strip_table_prefix, MAX_TXN_RETRIES,
};
use crate::db::models::{Product, ProductCreate, ProductUpdate};
use serde::Deserialize;
use shared::{StockAdjustment, StockChange};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use validator::Validate;

const PRODUCT_TABLE: &str = "product";

/// Outcome of an atomic stock adjustment
#[derive(Debug, Clone, Deserialize)]
pub struct StockAdjustOutcome {
    pub title: String,
    pub before: i64,
    pub after: i64,
}

impl StockAdjustOutcome {
    pub fn change(&self) -> StockChange {
        StockChange {
            before: self.before,
            after: self.after,
        }
    }
}

#[derive(Clone)]
pub struct ProductRepository {
    base: BaseRepository,
}

impl ProductRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// All products, newest first
    pub async fn find_all(&self) -> RepoResult<Vec<Product>> {
        let products: Vec<Product> = self
            .base
            .db()
            .query("SELECT * FROM product ORDER BY createdAt DESC")
            .await?
            .take(0)?;
        Ok(products)
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Product>> {
        let pure_id = strip_table_prefix(PRODUCT_TABLE, id);
        let product: Option<Product> = self.base.db().select((PRODUCT_TABLE, pure_id)).await?;
        Ok(product)
    }

    /// Create a new product
    pub async fn create(&self, data: ProductCreate) -> RepoResult<Product> {
        data.validate()
            .map_err(|e| RepoError::Validation(e.to_string()))?;
        validate_discount(data.price, data.discounted_price)?;

        let now = chrono::Utc::now().to_rfc3339();
        let mut content = serde_json::to_value(&data)
            .map_err(|e| RepoError::Validation(format!("Unserializable product: {e}")))?;
        if let Some(map) = content.as_object_mut() {
            map.insert("createdAt".into(), now.clone().into());
            map.insert("updatedAt".into(), now.into());
        }

        let mut result = self
            .base
            .db()
            .query("CREATE product CONTENT $data")
            .bind(("data", content))
            .await?;

        let created: Vec<Product> = result.take(0)?;
        created
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::Database("product creation returned no record".into()))
    }

    /// Update mutable product fields (stock goes through the ledger)
    pub async fn update(&self, id: &str, data: ProductUpdate) -> RepoResult<Product> {
        data.validate()
            .map_err(|e| RepoError::Validation(e.to_string()))?;

        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Product {id}")))?;

        // Discount rule holds for the merged document
        let price = data.price.unwrap_or(existing.price);
        let discounted = data.discounted_price.or(existing.discounted_price);
        validate_discount(price, discounted)?;

        let mut merge = serde_json::to_value(&data)
            .map_err(|e| RepoError::Validation(format!("Unserializable update: {e}")))?;
        if let Some(map) = merge.as_object_mut() {
            map.insert("updatedAt".into(), chrono::Utc::now().to_rfc3339().into());
        }

        let pure_id = strip_table_prefix(PRODUCT_TABLE, id).to_string();
        let mut result = self
            .base
            .db()
            .query("UPDATE type::thing('product', $id) MERGE $data RETURN AFTER")
            .bind(("id", pure_id))
            .bind(("data", merge))
            .await?;

        let updated: Vec<Product> = result.take(0)?;
        updated
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Product {id}")))
    }

    pub async fn delete(&self, id: &str) -> RepoResult<bool> {
        let pure_id = strip_table_prefix(PRODUCT_TABLE, id);
        let deleted: Option<Product> = self.base.db().delete((PRODUCT_TABLE, pure_id)).await?;
        Ok(deleted.is_some())
    }

    /// Atomically adjust a product's stock, clamped at zero.
    ///
    /// Returns the before/after levels so the caller can detect a
    /// low-stock threshold crossing, plus the title for the alert.
    pub async fn adjust_stock(
        &self,
        id: &str,
        adjustment: StockAdjustment,
    ) -> RepoResult<StockAdjustOutcome> {
        let mut attempt = 0;
        loop {
            match self.try_adjust_stock(id, adjustment).await {
                Err(e) if is_conflict(&e) && attempt < MAX_TXN_RETRIES => {
                    attempt += 1;
                    retry_backoff(attempt).await;
                }
                other => return other,
            }
        }
    }

    async fn try_adjust_stock(
        &self,
        id: &str,
        adjustment: StockAdjustment,
    ) -> RepoResult<StockAdjustOutcome> {
        let (expr, amount) = match adjustment {
            StockAdjustment::Delta(delta) => ("stock + $amount", delta),
            StockAdjustment::Absolute(level) => ("$amount", level),
        };

        let query = format!(
            r#"
            BEGIN TRANSACTION;
            LET $p = SELECT * FROM type::thing('product', $id);
            IF array::len($p) = 0 {{ THROW 'product not found' }};
            LET $after = (UPDATE type::thing('product', $id)
                SET stock = math::max([0, {expr}]), updatedAt = $now
                RETURN VALUE stock);
            RETURN {{ title: $p[0].title, before: $p[0].stock, after: $after[0] }};
            COMMIT TRANSACTION;
            "#
        );

        let pure_id = strip_table_prefix(PRODUCT_TABLE, id).to_string();
        let mut result = self
            .base
            .db()
            .query(query)
            .bind(("id", pure_id))
            .bind(("amount", amount))
            .bind(("now", chrono::Utc::now().to_rfc3339()))
            .await
            .map_err(|e| map_not_found(&e.to_string()))?;

        // The THROW of an aborted transaction only shows up in the
        // per-statement errors
        if let Some(errors) = statement_errors(&mut result) {
            return Err(map_not_found(&errors));
        }
        let outcome: Option<StockAdjustOutcome> = result.take(0)?;
        outcome.ok_or_else(|| RepoError::NotFound(format!("Product {id}")))
    }
}

/// The discount price, when present, must be strictly below the price
fn validate_discount(price: f64, discounted: Option<f64>) -> RepoResult<()> {
    if let Some(d) = discounted {
        if !(d > 0.0) || d >= price {
            return Err(RepoError::Validation(
                "discounted price must be positive and strictly less than price".into(),
            ));
        }
    }
    Ok(())
}

/// Map a THROWn 'product not found' back to a typed NotFound
fn map_not_found(msg: &str) -> RepoError {
    if msg.contains("product not found") {
        RepoError::NotFound("Product".into())
    } else {
        RepoError::Database(msg.to_string())
    }
}
