//! Repository Module
//!
//! Per-table CRUD over the embedded SurrealDB. Every mutation that
//! touches more than one record (order + stock, order + analytics)
//! is expressed as a single `BEGIN/COMMIT` SurrealQL transaction so
//! a crash or conflicting concurrent write can never leave a partial
//! state behind. The embedded engine uses optimistic transactions:
//! a conflicting commit fails and must be retried, which
//! [`is_conflict`] detects and the repositories do in a bounded loop.

pub mod analytics;
pub mod counter;
pub mod customer;
pub mod order;
pub mod product;
pub mod role;

// Re-exports
pub use analytics::AnalyticsRepository;
pub use counter::{CounterRepository, CUSTOMERS_COUNTER, ORDERS_COUNTER};
pub use customer::CustomerRepository;
pub use order::OrderRepository;
pub use product::ProductRepository;
pub use role::RoleRepository;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<surrealdb::Error> for RepoError {
    fn from(err: surrealdb::Error) -> Self {
        RepoError::Database(err.to_string())
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Upper bound on optimistic-transaction retries before giving up
pub(crate) const MAX_TXN_RETRIES: u32 = 64;

/// Whether a database error is a transient optimistic-transaction
/// conflict worth retrying
pub(crate) fn is_conflict(err: &RepoError) -> bool {
    match err {
        RepoError::Database(msg) => {
            let msg = msg.to_ascii_lowercase();
            msg.contains("conflict") || msg.contains("can be retried") || msg.contains("resource busy")
        }
        _ => false,
    }
}

/// Collect the per-statement errors of a multi-statement response.
///
/// When a `BEGIN/COMMIT` block aborts, the engine marks every
/// statement with "The query was not executed due to a failed
/// transaction" and files the actual THROW or index-violation text
/// under the offending statement's own index. `take` on any single
/// index only ever reports the generic marker, so the texts worth
/// classifying must be gathered from the full error set.
pub(crate) fn statement_errors(response: &mut surrealdb::Response) -> Option<String> {
    let errors = response.take_errors();
    if errors.is_empty() {
        return None;
    }
    let mut errors: Vec<(usize, surrealdb::Error)> = errors.into_iter().collect();
    errors.sort_by_key(|(index, _)| *index);
    let combined = errors
        .into_iter()
        .map(|(_, err)| err.to_string())
        .collect::<Vec<_>>()
        .join("; ");
    Some(combined)
}

/// Backoff between transaction retries
pub(crate) async fn retry_backoff(attempt: u32) {
    tokio::time::sleep(std::time::Duration::from_millis(u64::from(attempt.min(10)) * 2)).await;
}

/// Strip a `table:` prefix so ids can arrive either bare or qualified
pub(crate) fn strip_table_prefix<'a>(table: &str, id: &'a str) -> &'a str {
    id.strip_prefix(table)
        .and_then(|rest| rest.strip_prefix(':'))
        .unwrap_or(id)
}

/// Base repository with database reference
#[derive(Clone)]
pub struct BaseRepository {
    db: Surreal<Db>,
}

impl BaseRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Surreal<Db> {
        &self.db
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_qualified_ids_only() {
        assert_eq!(strip_table_prefix("product", "product:abc"), "abc");
        assert_eq!(strip_table_prefix("product", "abc"), "abc");
        assert_eq!(strip_table_prefix("product", "order:abc"), "order:abc");
    }

    #[test]
    fn conflict_detection_matches_engine_messages() {
        let conflict = RepoError::Database(
            "Failed to commit transaction due to a read or write conflict. This transaction can be retried".into(),
        );
        assert!(is_conflict(&conflict));
        assert!(!is_conflict(&RepoError::NotFound("x".into())));
        assert!(!is_conflict(&RepoError::Database("syntax error".into())));
    }
}
