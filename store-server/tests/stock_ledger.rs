//! Stock ledger integration tests
//!
//! Owner-side adjustments through [`ProductRepository::adjust_stock`]:
//! relative deltas, absolute restocks, the zero clamp and the
//! low-stock threshold crossing the notifier keys off.

use store_server::core::ServerState;
use store_server::db::models::ProductCreate;
use store_server::db::repository::{ProductRepository, RepoError};

use shared::StockAdjustment;

async fn test_state() -> ServerState {
    ServerState::for_tests().await.expect("in-memory state")
}

async fn seed_product(state: &ServerState, title: &str, stock: i64) -> String {
    let product = ProductRepository::new(state.db.clone())
        .create(ProductCreate {
            title: title.into(),
            description: None,
            price: 30.0,
            discounted_price: None,
            stock,
            images: vec![],
            scents: vec![],
            moods: vec![],
            limited_edition: false,
            size: None,
        })
        .await
        .expect("seed product");
    product.id.expect("product id").to_string()
}

#[tokio::test]
async fn deltas_move_the_level_and_report_before_and_after() {
    let state = test_state().await;
    let product_id = seed_product(&state, "Cedar Candle", 10).await;
    let products = ProductRepository::new(state.db.clone());

    let outcome = products
        .adjust_stock(&product_id, StockAdjustment::Delta(-4))
        .await
        .unwrap();
    assert_eq!((outcome.before, outcome.after), (10, 6));
    assert_eq!(outcome.title, "Cedar Candle");

    let outcome = products
        .adjust_stock(&product_id, StockAdjustment::Delta(3))
        .await
        .unwrap();
    assert_eq!((outcome.before, outcome.after), (6, 9));

    let product = products.find_by_id(&product_id).await.unwrap().unwrap();
    assert_eq!(product.stock, 9);
}

#[tokio::test]
async fn deltas_clamp_at_zero() {
    let state = test_state().await;
    let product_id = seed_product(&state, "Moss Candle", 2).await;
    let products = ProductRepository::new(state.db.clone());

    let outcome = products
        .adjust_stock(&product_id, StockAdjustment::Delta(-20))
        .await
        .unwrap();
    assert_eq!((outcome.before, outcome.after), (2, 0));

    let product = products.find_by_id(&product_id).await.unwrap().unwrap();
    assert_eq!(product.stock, 0);
}

#[tokio::test]
async fn absolute_adjustment_overwrites_the_level() {
    let state = test_state().await;
    let product_id = seed_product(&state, "Sage Candle", 3).await;
    let products = ProductRepository::new(state.db.clone());

    let outcome = products
        .adjust_stock(&product_id, StockAdjustment::Absolute(12))
        .await
        .unwrap();
    assert_eq!((outcome.before, outcome.after), (3, 12));

    // A negative restock target clamps like a delta would
    let outcome = products
        .adjust_stock(&product_id, StockAdjustment::Absolute(-5))
        .await
        .unwrap();
    assert_eq!((outcome.before, outcome.after), (12, 0));
}

#[tokio::test]
async fn deltas_report_the_low_stock_crossing_exactly_once() {
    let state = test_state().await;
    let product_id = seed_product(&state, "Fern Candle", 6).await;
    let products = ProductRepository::new(state.db.clone());

    // 6 -> 4 crosses the threshold
    let outcome = products
        .adjust_stock(&product_id, StockAdjustment::Delta(-2))
        .await
        .unwrap();
    assert!(outcome.change().is_low_stock_edge());

    // 4 -> 3 stays below it: no new alert
    let outcome = products
        .adjust_stock(&product_id, StockAdjustment::Delta(-1))
        .await
        .unwrap();
    assert!(!outcome.change().is_low_stock_edge());

    // Restocking above and draining again re-arms the edge
    products
        .adjust_stock(&product_id, StockAdjustment::Absolute(8))
        .await
        .unwrap();
    let outcome = products
        .adjust_stock(&product_id, StockAdjustment::Delta(-5))
        .await
        .unwrap();
    assert!(outcome.change().is_low_stock_edge());
}

#[tokio::test]
async fn adjusting_a_missing_product_is_not_found() {
    let state = test_state().await;
    let products = ProductRepository::new(state.db.clone());

    let result = products
        .adjust_stock("product:doesnotexist", StockAdjustment::Delta(1))
        .await;
    assert!(matches!(result, Err(RepoError::NotFound(_))), "{result:?}");
}
