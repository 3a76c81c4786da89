//! Sequence counter repository
//!
//! One persisted integer per counter name (`counter:orders`,
//! `counter:customers`). [`allocate`] is the only way numbers are
//! handed out: a single atomic read-increment-write that either
//! commits and returns a value strictly greater than every previous
//! allocation, or fails without consuming anything. Two concurrent
//! callers can never observe the same value.
//!
//! [`allocate`]: CounterRepository::allocate

use super::{BaseRepository, RepoError, RepoResult, is_conflict, retry_backoff, MAX_TXN_RETRIES};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

/// Counter backing order codes
pub const ORDERS_COUNTER: &str = "orders";
/// Counter backing customer codes
pub const CUSTOMERS_COUNTER: &str = "customers";

#[derive(Clone)]
pub struct CounterRepository {
    base: BaseRepository,
}

impl CounterRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Allocate the next value of a counter.
    ///
    /// The increment is a single statement, so the engine runs it as
    /// one atomic unit; on optimistic-commit conflict it is retried.
    pub async fn allocate(&self, name: &str) -> RepoResult<u64> {
        let mut attempt = 0;
        loop {
            match self.try_allocate(name).await {
                Err(e) if is_conflict(&e) && attempt < MAX_TXN_RETRIES => {
                    attempt += 1;
                    retry_backoff(attempt).await;
                }
                other => return other,
            }
        }
    }

    async fn try_allocate(&self, name: &str) -> RepoResult<u64> {
        let mut result = self
            .base
            .db()
            .query("UPSERT type::thing('counter', $name) SET seq = (seq ?? 0) + 1 RETURN VALUE seq")
            .bind(("name", name.to_string()))
            .await?;

        let seqs: Vec<i64> = result.take(0)?;
        seqs.into_iter()
            .next()
            .filter(|s| *s > 0)
            .map(|s| s as u64)
            .ok_or_else(|| RepoError::Database(format!("counter {name} allocation returned no value")))
    }

    /// Raise a counter to at least `value` without allocating.
    ///
    /// Best-effort persistence behind the public next-code preview;
    /// never lowers the counter.
    pub async fn raise_to(&self, name: &str, value: u64) -> RepoResult<()> {
        self.base
            .db()
            .query("UPSERT type::thing('counter', $name) SET seq = math::max([(seq ?? 0), $value])")
            .bind(("name", name.to_string()))
            .bind(("value", value as i64))
            .await?
            .check()?;
        Ok(())
    }

    /// Current value of a counter (0 when it has never allocated)
    pub async fn current(&self, name: &str) -> RepoResult<u64> {
        let mut result = self
            .base
            .db()
            .query("SELECT VALUE seq FROM type::thing('counter', $name)")
            .bind(("name", name.to_string()))
            .await?;
        let seqs: Vec<i64> = result.take(0)?;
        Ok(seqs.into_iter().next().unwrap_or(0).max(0) as u64)
    }
}
