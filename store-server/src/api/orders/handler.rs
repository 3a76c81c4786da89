//! Order API handlers
//!
//! Checkout arrives as multipart form data: the slip file plus the
//! order fields as JSON-encoded text parts, matching what the
//! storefront form submits.

use axum::{
    Json,
    extract::{Multipart, Path, State},
};
use serde::Deserialize;
use serde_json::{Value, json};
use shared::OrderStatus;

use crate::auth::{Caller, OptionalCaller, Owner};
use crate::core::ServerState;
use crate::db::models::{Order, OrderEdit};
use crate::db::repository::OrderRepository;
use crate::orders::{CheckoutRequest, CheckoutService, SlipUpload};
use crate::utils::{AppError, AppResult};

/// GET /api/orders - all orders, owner console
pub async fn list(State(state): State<ServerState>, _owner: Owner) -> AppResult<Json<Vec<Order>>> {
    let orders = OrderRepository::new(state.db.clone()).find_all().await?;
    Ok(Json(orders))
}

/// GET /api/orders/:id - one order, owner console
pub async fn get_by_id(
    State(state): State<ServerState>,
    _owner: Owner,
    Path(id): Path<String>,
) -> AppResult<Json<Order>> {
    let order = OrderRepository::new(state.db.clone())
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {id}")))?;
    Ok(Json(order))
}

/// GET /api/orders/next-code - preview the next order code
pub async fn next_code(State(state): State<ServerState>) -> AppResult<Json<Value>> {
    let (code, seq) = CheckoutService::new(&state).next_code().await?;
    Ok(Json(json!({ "code": code, "seq": seq })))
}

/// POST /api/orders/create - place an order (multipart)
///
/// Parts: `slip` (file, required), `items`/`customer`/`gift` (JSON
/// text), `total` (number text), `code` (optional text).
pub async fn create(
    State(state): State<ServerState>,
    OptionalCaller(caller): OptionalCaller,
    mut multipart: Multipart,
) -> AppResult<Json<Value>> {
    let mut items = None;
    let mut customer = None;
    let mut gift = None;
    let mut total = None;
    let mut code = None;
    let mut slip = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "slip" => {
                let content_type = field.content_type().map(str::to_string);
                let file_name = field.file_name().map(str::to_string);
                let bytes = field.bytes().await?.to_vec();
                slip = Some(SlipUpload {
                    bytes,
                    content_type,
                    file_name,
                });
            }
            "items" => items = Some(serde_json::from_str(&field.text().await?)?),
            "customer" => customer = Some(serde_json::from_str(&field.text().await?)?),
            "gift" => {
                let text = field.text().await?;
                if !text.is_empty() && text != "null" {
                    gift = Some(serde_json::from_str(&text)?);
                }
            }
            "total" => {
                let text = field.text().await?;
                total = Some(text.parse::<f64>().map_err(|_| {
                    AppError::validation(format!("total is not a number: {text}"))
                })?);
            }
            "code" => {
                let text = field.text().await?;
                if !text.is_empty() {
                    code = Some(text);
                }
            }
            other => {
                tracing::debug!(field = %other, "Ignoring unknown multipart field");
            }
        }
    }

    let request = CheckoutRequest {
        items: items.ok_or_else(|| AppError::validation("missing field: items"))?,
        customer: customer.ok_or_else(|| AppError::validation("missing field: customer"))?,
        gift,
        total: total.ok_or_else(|| AppError::validation("missing field: total"))?,
        code,
    };
    let slip = slip.ok_or_else(|| AppError::validation("missing slip file"))?;

    let order = CheckoutService::new(&state)
        .checkout(caller.as_ref().map(|c| c.uid.as_str()), request, slip)
        .await?;

    Ok(Json(json!({
        "id": order.id.as_ref().map(|id| id.to_string()),
        "code": order.code,
        "slipUrl": order.slip_url,
    })))
}

/// POST /api/orders/migrate-to-uid - claim the caller's guest orders.
///
/// A customer who checked out as a guest and signed up later gets
/// their history back: every guest order whose email matches the one
/// on the caller's token is stamped with the caller's uid.
pub async fn migrate_to_uid(
    State(state): State<ServerState>,
    Caller(caller): Caller,
) -> AppResult<Json<Value>> {
    let email = caller
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::validation("no email on account"))?;

    let migrated = OrderRepository::new(state.db.clone())
        .claim_guest_orders(&caller.uid, email)
        .await?;

    if migrated > 0 {
        tracing::info!(uid = %caller.uid, migrated, "Guest orders claimed");
    }
    Ok(Json(json!({ "migrated": migrated })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub order_id: String,
    pub status: OrderStatus,
}

/// POST /api/orders/update-status - owner moves an order along
pub async fn update_status(
    State(state): State<ServerState>,
    _owner: Owner,
    Json(body): Json<UpdateStatusRequest>,
) -> AppResult<Json<Value>> {
    let transition = OrderRepository::new(state.db.clone())
        .update_status(&body.order_id, body.status)
        .await?;

    if transition.previous != body.status {
        state.notifier.status_changed(&transition.order, body.status);
    }

    Ok(Json(json!({ "ok": true })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditOrderRequest {
    pub order_id: String,
    #[serde(flatten)]
    pub edit: OrderEdit,
}

/// POST /api/orders/edit - owner corrects the editable fields
pub async fn edit(
    State(state): State<ServerState>,
    _owner: Owner,
    Json(body): Json<EditOrderRequest>,
) -> AppResult<Json<Value>> {
    if let Some(customer) = &body.edit.customer {
        use validator::Validate;
        customer.validate()?;
    }
    OrderRepository::new(state.db.clone())
        .edit(&body.order_id, body.edit)
        .await?;
    Ok(Json(json!({ "ok": true })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOrderRequest {
    pub order_id: String,
}

/// POST /api/orders/delete - owner removes an order.
///
/// The document goes first; slip cleanup afterwards is best-effort,
/// an orphaned file is preferable to a dangling order.
pub async fn delete(
    State(state): State<ServerState>,
    _owner: Owner,
    Json(body): Json<DeleteOrderRequest>,
) -> AppResult<Json<Value>> {
    let deleted = OrderRepository::new(state.db.clone())
        .delete(&body.order_id)
        .await?;

    if let Some(slip_url) = &deleted.slip_url {
        if let Err(e) = state.blobs.remove_by_url(slip_url).await {
            tracing::warn!(error = %e, code = %deleted.code, "Slip cleanup failed after delete");
        }
    }

    Ok(Json(json!({ "ok": true })))
}
