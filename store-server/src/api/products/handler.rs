//! Product API handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use serde_json::{Value, json};
use shared::StockAdjustment;

use crate::auth::Owner;
use crate::core::ServerState;
use crate::db::models::{Product, ProductCreate, ProductUpdate};
use crate::db::repository::ProductRepository;
use crate::utils::{AppError, AppResult};

/// GET /api/products - public catalog
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.db.clone()).find_all().await?;
    Ok(Json(products))
}

/// GET /api/products/:id - public product detail
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Product>> {
    let product = ProductRepository::new(state.db.clone())
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {id}")))?;
    Ok(Json(product))
}

/// POST /api/products - owner adds a product
pub async fn create(
    State(state): State<ServerState>,
    _owner: Owner,
    Json(data): Json<ProductCreate>,
) -> AppResult<Json<Product>> {
    let product = ProductRepository::new(state.db.clone()).create(data).await?;
    Ok(Json(product))
}

/// PUT /api/products/:id - owner edits a product
pub async fn update(
    State(state): State<ServerState>,
    _owner: Owner,
    Path(id): Path<String>,
    Json(data): Json<ProductUpdate>,
) -> AppResult<Json<Product>> {
    let product = ProductRepository::new(state.db.clone())
        .update(&id, data)
        .await?;
    Ok(Json(product))
}

/// DELETE /api/products/:id - owner removes a product.
///
/// Orders keep their item snapshots, so nothing dangles.
pub async fn delete(
    State(state): State<ServerState>,
    _owner: Owner,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let removed = ProductRepository::new(state.db.clone()).delete(&id).await?;
    if !removed {
        return Err(AppError::not_found(format!("Product {id}")));
    }
    Ok(Json(json!({ "ok": true })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStockRequest {
    pub product_id: String,
    /// Relative change, e.g. a restock of +20 or a correction of -1
    #[serde(default)]
    pub delta: Option<i64>,
    /// Absolute level after a stocktake
    #[serde(default)]
    pub absolute: Option<i64>,
}

/// POST /api/products/update-stock - owner adjusts stock
pub async fn update_stock(
    State(state): State<ServerState>,
    _owner: Owner,
    Json(body): Json<UpdateStockRequest>,
) -> AppResult<Json<Value>> {
    let adjustment = match (body.delta, body.absolute) {
        (Some(delta), None) => StockAdjustment::Delta(delta),
        (None, Some(level)) => StockAdjustment::Absolute(level),
        _ => {
            return Err(AppError::validation(
                "provide exactly one of delta or absolute",
            ));
        }
    };

    let outcome = ProductRepository::new(state.db.clone())
        .adjust_stock(&body.product_id, adjustment)
        .await?;

    if outcome.change().is_low_stock_edge() {
        state.notifier.low_stock(&outcome.title, outcome.after);
    }

    Ok(Json(json!({ "ok": true, "stock": outcome.after })))
}
