//! Sequence allocator tests
//!
//! The counter must hand out strictly increasing, never-duplicated
//! values under concurrency. Conflicting commits on the embedded
//! engine are retried inside the repository, so every task here must
//! come back with a distinct number.

use store_server::core::ServerState;
use store_server::db::repository::{CounterRepository, ORDERS_COUNTER};

#[tokio::test]
async fn concurrent_allocations_never_collide() {
    let state = ServerState::for_tests().await.expect("in-memory state");

    const TASKS: usize = 20;
    let mut handles = Vec::with_capacity(TASKS);
    for _ in 0..TASKS {
        let db = state.db.clone();
        handles.push(tokio::spawn(async move {
            CounterRepository::new(db).allocate(ORDERS_COUNTER).await
        }));
    }

    let mut seqs = Vec::with_capacity(TASKS);
    for handle in handles {
        seqs.push(handle.await.expect("task").expect("allocate"));
    }

    seqs.sort_unstable();
    let expected: Vec<u64> = (1..=TASKS as u64).collect();
    assert_eq!(seqs, expected, "allocations must be gap-free and distinct");
}

#[tokio::test]
async fn raise_to_never_lowers_the_counter() {
    let state = ServerState::for_tests().await.expect("in-memory state");
    let counters = CounterRepository::new(state.db.clone());

    assert_eq!(counters.current(ORDERS_COUNTER).await.unwrap(), 0);

    counters.raise_to(ORDERS_COUNTER, 10).await.unwrap();
    assert_eq!(counters.current(ORDERS_COUNTER).await.unwrap(), 10);

    // Raising to a lower value is a no-op
    counters.raise_to(ORDERS_COUNTER, 3).await.unwrap();
    assert_eq!(counters.current(ORDERS_COUNTER).await.unwrap(), 10);

    // The next allocation continues above the raised value
    assert_eq!(counters.allocate(ORDERS_COUNTER).await.unwrap(), 11);
}

#[tokio::test]
async fn counters_are_independent() {
    let state = ServerState::for_tests().await.expect("in-memory state");
    let counters = CounterRepository::new(state.db.clone());

    assert_eq!(counters.allocate("orders").await.unwrap(), 1);
    assert_eq!(counters.allocate("customers").await.unwrap(), 1);
    assert_eq!(counters.allocate("orders").await.unwrap(), 2);
    assert_eq!(counters.current("customers").await.unwrap(), 1);
}
