//! Checkout service
//!
//! Order of operations matters here. The slip is validated and
//! uploaded before the database transaction: a slipless order must
//! never exist, and an orphaned blob from a failed transaction is
//! harmless (and cleaned up best-effort). Notifications go out only
//! after the transaction committed.

use crate::core::ServerState;
use crate::db::models::{Order, OrderContent};
use crate::db::repository::{
    CounterRepository, CustomerRepository, OrderRepository, RepoError, ORDERS_COUNTER,
};
use crate::notify::NotificationTrigger;
use crate::services::BlobStore;
use crate::utils::{AppError, AppResult};
use serde::Deserialize;
use shared::money;
use shared::{format_order_code, parse_order_code, CustomerInfo, GiftInfo, OrderItem, OrderStatus};
use std::sync::Arc;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use validator::Validate;

/// Payment slips are capped at 10 MB
pub const MAX_SLIP_BYTES: usize = 10 * 1024 * 1024;

/// Checkout payload (the JSON part of the multipart request)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub items: Vec<OrderItem>,
    pub customer: CustomerInfo,
    #[serde(default)]
    pub gift: Option<GiftInfo>,
    /// Grand total including delivery; must cover the item subtotal
    pub total: f64,
    /// Pre-reserved order code from the next-code preview, if the
    /// client fetched one
    #[serde(default)]
    pub code: Option<String>,
}

/// The uploaded slip file
#[derive(Debug, Clone)]
pub struct SlipUpload {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
}

impl SlipUpload {
    /// File extension for the accepted slip formats, or an error
    fn extension(&self) -> AppResult<&'static str> {
        let mime = self
            .content_type
            .clone()
            .or_else(|| {
                let name = self.file_name.as_deref()?;
                Some(mime_guess::from_path(name).first()?.essence_str().to_string())
            })
            .unwrap_or_default();

        match mime.as_str() {
            "image/png" => Ok(".png"),
            "image/jpeg" => Ok(".jpg"),
            "application/pdf" => Ok(".pdf"),
            other => Err(AppError::validation(format!(
                "slip must be PNG, JPEG or PDF (got {})",
                if other.is_empty() { "unknown" } else { other }
            ))),
        }
    }
}

pub struct CheckoutService {
    db: Surreal<Db>,
    blobs: Arc<dyn BlobStore>,
    notifier: NotificationTrigger,
}

impl CheckoutService {
    pub fn new(state: &ServerState) -> Self {
        Self {
            db: state.db.clone(),
            blobs: Arc::clone(&state.blobs),
            notifier: state.notifier.clone(),
        }
    }

    /// Place an order.
    ///
    /// `caller_uid` is the verified identity when the customer is
    /// signed in; guests pass `None` and are gated by contact match.
    pub async fn checkout(
        &self,
        caller_uid: Option<&str>,
        request: CheckoutRequest,
        slip: SlipUpload,
    ) -> AppResult<Order> {
        self.validate(&request)?;
        self.check_account_active(caller_uid, &request.customer).await?;

        let ext = slip.extension()?;
        if slip.bytes.is_empty() {
            return Err(AppError::validation("slip file is empty"));
        }
        if slip.bytes.len() > MAX_SLIP_BYTES {
            return Err(AppError::validation("slip file exceeds 10 MB"));
        }

        let (code, seq) = self.resolve_code(request.code.as_deref()).await?;

        let slip_url = self
            .blobs
            .put(&format!("slips/{code}{ext}"), slip.bytes)
            .await
            .map_err(|e| AppError::internal(format!("slip upload failed: {e}")))?;

        let now = chrono::Utc::now().to_rfc3339();
        let content = OrderContent {
            code: code.clone(),
            user_id: caller_uid.map(str::to_string),
            items: request.items,
            total: request.total,
            customer: request.customer,
            gift: request.gift,
            slip_url: slip_url.clone(),
            status: OrderStatus::Paid,
            created_at: now.clone(),
            updated_at: now,
        };

        let created = match OrderRepository::new(self.db.clone())
            .create_with_stock(content)
            .await
        {
            Ok(created) => created,
            Err(RepoError::Duplicate(_)) => {
                // The code belongs to an existing order whose slip
                // lives at this same path; leave the blob alone
                return Err(AppError::conflict(format!(
                    "order code {code} already in use"
                )));
            }
            Err(e) => {
                // The order never existed; drop its slip
                if let Err(cleanup) = self.blobs.remove_by_url(&slip_url).await {
                    tracing::warn!(error = %cleanup, %slip_url, "Orphaned slip cleanup failed");
                }
                return Err(e.into());
            }
        };

        tracing::info!(code = %created.order.code, seq, total = created.order.total, "Order placed");

        self.notifier.order_received(&created.order);
        for movement in &created.stock {
            if movement.change().is_low_stock_edge() {
                self.notifier.low_stock(&movement.title, movement.after);
            }
        }

        Ok(created.order)
    }

    /// Hand out the next order code ahead of checkout.
    ///
    /// Looks at both the counter and the highest code on record (they
    /// can disagree after a restore), takes the successor, and
    /// best-effort raises the counter to it so a concurrent
    /// allocation cannot collide with the reserved code. A reserved
    /// code that is never used leaves a gap, which is fine; a reused
    /// one is what the unique index forbids.
    pub async fn next_code(&self) -> AppResult<(String, u64)> {
        let counters = CounterRepository::new(self.db.clone());
        let orders = OrderRepository::new(self.db.clone());

        let counter_seq = counters.current(ORDERS_COUNTER).await?;
        let recorded_seq = orders
            .latest_code()
            .await?
            .as_deref()
            .and_then(parse_order_code)
            .unwrap_or(0);

        let next = counter_seq.max(recorded_seq) + 1;
        if let Err(e) = counters.raise_to(ORDERS_COUNTER, next).await {
            tracing::warn!(error = %e, "Code reservation not persisted; code still usable");
        }

        Ok((format_order_code(next), next))
    }

    fn validate(&self, request: &CheckoutRequest) -> AppResult<()> {
        if request.items.is_empty() {
            return Err(AppError::validation("order has no items"));
        }
        for item in &request.items {
            item.validate()?;
        }
        request.customer.validate()?;

        if !request.total.is_finite() || request.total < 0.0 {
            return Err(AppError::validation("total must be a non-negative number"));
        }
        let subtotal = money::items_subtotal(&request.items);
        if money::to_decimal(request.total) < subtotal {
            return Err(AppError::validation(format!(
                "total {} is below the item subtotal {}",
                request.total, subtotal
            )));
        }
        Ok(())
    }

    /// A deactivated account may not place orders. Signed-in callers
    /// are matched by uid; guests by the contact details they gave.
    async fn check_account_active(
        &self,
        caller_uid: Option<&str>,
        customer: &CustomerInfo,
    ) -> AppResult<()> {
        let customers = CustomerRepository::new(self.db.clone());

        let profile = match caller_uid {
            Some(uid) => customers.find_by_uid(uid).await?,
            None => {
                customers
                    .find_by_contact(customer.email.as_deref(), Some(&customer.phone))
                    .await?
            }
        };

        if let Some(profile) = profile
            && !profile.is_active
        {
            tracing::warn!(uid = ?caller_uid, "Deactivated account attempted checkout");
            return Err(AppError::unauthorized());
        }
        Ok(())
    }

    /// Either honor a code the client reserved via the preview, or
    /// allocate a fresh one. Client codes must be canonical.
    async fn resolve_code(&self, client_code: Option<&str>) -> AppResult<(String, u64)> {
        let counters = CounterRepository::new(self.db.clone());
        match client_code {
            Some(code) => {
                let seq = parse_order_code(code)
                    .ok_or_else(|| AppError::validation(format!("malformed order code: {code}")))?;
                // Keep the allocator ahead of handed-out codes
                counters.raise_to(ORDERS_COUNTER, seq).await?;
                Ok((code.to_string(), seq))
            }
            None => {
                let seq = counters.allocate(ORDERS_COUNTER).await?;
                Ok((format_order_code(seq), seq))
            }
        }
    }
}
