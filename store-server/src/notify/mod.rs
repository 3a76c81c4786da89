//! Notification triggers
//!
//! Composes and dispatches the three transactional emails: order
//! received (owner + customer when an address is on file), status
//! changed (customer) and low stock (owner). Dispatch is
//! fire-and-forget on a spawned task; a mail failure is logged and
//! never fails the request that triggered it.

use crate::db::models::Order;
use crate::services::{Mailer, OutgoingEmail};
use shared::{OrderStatus, LOW_STOCK_THRESHOLD};
use std::sync::Arc;

#[derive(Clone)]
pub struct NotificationTrigger {
    mailer: Arc<dyn Mailer>,
    owner_email: String,
}

impl NotificationTrigger {
    pub fn new(mailer: Arc<dyn Mailer>, owner_email: String) -> Self {
        Self { mailer, owner_email }
    }

    /// New order placed: always tell the owner, and the customer too
    /// when the order carries an email address.
    pub fn order_received(&self, order: &Order) {
        self.dispatch(OutgoingEmail {
            to: self.owner_email.clone(),
            subject: format!("New order {}", order.code),
            body: format!(
                "Order {} received: {} item(s), total {:.2}.\nCustomer: {} ({})",
                order.code,
                order.items.len(),
                order.total,
                order.customer.full_name,
                order.customer.phone,
            ),
        });

        if let Some(email) = &order.customer.email {
            self.dispatch(OutgoingEmail {
                to: email.clone(),
                subject: format!("We received your order {}", order.code),
                body: format!(
                    "Thank you, {}! Your order {} is confirmed and paid.\n\
                     Use the code {} as the reference for any questions.",
                    order.customer.full_name, order.code, order.code,
                ),
            });
        }
    }

    /// Order moved to a new status; only sent when the customer left
    /// an email address.
    pub fn status_changed(&self, order: &Order, new_status: OrderStatus) {
        let Some(email) = &order.customer.email else {
            return;
        };
        self.dispatch(OutgoingEmail {
            to: email.clone(),
            subject: format!("Order {} is now {}", order.code, new_status),
            body: format!(
                "Hi {}, your order {} has been updated to: {}.",
                order.customer.full_name, order.code, new_status,
            ),
        });
    }

    /// A product crossed the low-stock threshold downward
    pub fn low_stock(&self, title: &str, remaining: i64) {
        self.dispatch(OutgoingEmail {
            to: self.owner_email.clone(),
            subject: format!("Low stock: {title}"),
            body: format!(
                "Stock for \"{title}\" dropped to {remaining} \
                 (threshold {LOW_STOCK_THRESHOLD}). Time to restock.",
            ),
        });
    }

    fn dispatch(&self, email: OutgoingEmail) {
        let mailer = Arc::clone(&self.mailer);
        tokio::spawn(async move {
            let to = email.to.clone();
            let subject = email.subject.clone();
            if let Err(e) = mailer.send(email).await {
                tracing::warn!(error = %e, to = %to, subject = %subject, "Email dispatch failed");
            }
        });
    }
}
