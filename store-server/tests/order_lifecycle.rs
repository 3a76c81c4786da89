//! Order lifecycle integration tests
//!
//! Run against the in-memory engine through the same repositories and
//! checkout service the HTTP handlers use. The invariants under test:
//! checkout is all-or-nothing across stock, order and analytics;
//! stock clamps at zero; codes are never reused; the analytics
//! summary always matches the order table.

use store_server::core::ServerState;
use store_server::db::models::{CustomerProfileUpsert, OrderEdit, ProductCreate};
use store_server::db::repository::{
    AnalyticsRepository, CustomerRepository, OrderRepository, ProductRepository,
};
use store_server::orders::{CheckoutRequest, CheckoutService, SlipUpload};
use store_server::services::MemoryBlobStore;
use store_server::utils::AppError;

use shared::{CustomerInfo, OrderItem, OrderStatus};
use std::sync::Arc;

async fn test_state() -> ServerState {
    ServerState::for_tests().await.expect("in-memory state")
}

async fn seed_product(state: &ServerState, title: &str, price: f64, stock: i64) -> String {
    let product = ProductRepository::new(state.db.clone())
        .create(ProductCreate {
            title: title.into(),
            description: None,
            price,
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

fn item(product_id: &str, price: f64, qty: u32) -> OrderItem {
    OrderItem {
        product_id: product_id.into(),
        title: "Vanilla Candle".into(),
        price,
        qty,
    }
}

fn customer() -> CustomerInfo {
    CustomerInfo {
        full_name: "Nika Beridze".into(),
        phone: "+995555123456".into(),
        email: Some("nika@example.test".into()),
        address: "Rustaveli Ave 1".into(),
        postal_code: Some("0108".into()),
        city: Some("Tbilisi".into()),
    }
}

fn png_slip() -> SlipUpload {
    SlipUpload {
        bytes: vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A],
        content_type: Some("image/png".into()),
        file_name: Some("slip.png".into()),
    }
}

fn request(items: Vec<OrderItem>, total: f64) -> CheckoutRequest {
    CheckoutRequest {
        items,
        customer: customer(),
        gift: None,
        total,
        code: None,
    }
}

#[tokio::test]
async fn checkout_decrements_stock_and_updates_analytics() {
    let state = test_state().await;
    let product_id = seed_product(&state, "Vanilla Candle", 45.0, 3).await;
    let service = CheckoutService::new(&state);

    let order = service
        .checkout(None, request(vec![item(&product_id, 45.0, 2)], 95.0), png_slip())
        .await
        .expect("checkout");

    assert_eq!(order.code, "SC-0000001");
    assert_eq!(order.status, OrderStatus::Paid);
    let slip_url = order.slip_url.expect("slip url");
    assert!(slip_url.ends_with("/slips/SC-0000001.png"), "{slip_url}");

    let product = ProductRepository::new(state.db.clone())
        .find_by_id(&product_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(product.stock, 1);

    let summary = AnalyticsRepository::new(state.db.clone())
        .summary()
        .await
        .unwrap();
    assert_eq!(summary.total_orders, 1);
    assert_eq!(summary.revenue_total, 95.0);
    assert_eq!(summary.revenue_completed, 0.0);
    assert_eq!(summary.status_count(OrderStatus::Paid), 1);
    assert_eq!(summary.status_counts_sum(), summary.total_orders);
}

#[tokio::test]
async fn checkout_with_unknown_product_writes_nothing() {
    let state = test_state().await;
    let product_id = seed_product(&state, "Amber Candle", 30.0, 5).await;
    let service = CheckoutService::new(&state);

    let result = service
        .checkout(
            None,
            request(
                vec![item(&product_id, 30.0, 1), item("product:missing", 30.0, 1)],
                60.0,
            ),
            png_slip(),
        )
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))), "{result:?}");

    // Nothing committed: stock intact, no orders, analytics untouched
    let product = ProductRepository::new(state.db.clone())
        .find_by_id(&product_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(product.stock, 5);

    let orders = OrderRepository::new(state.db.clone()).find_all().await.unwrap();
    assert!(orders.is_empty());

    let summary = AnalyticsRepository::new(state.db.clone())
        .summary()
        .await
        .unwrap();
    assert_eq!(summary.total_orders, 0);
    assert_eq!(summary.revenue_total, 0.0);
}

#[tokio::test]
async fn oversell_clamps_stock_at_zero() {
    let state = test_state().await;
    let product_id = seed_product(&state, "Last One", 20.0, 1).await;
    let service = CheckoutService::new(&state);

    service
        .checkout(None, request(vec![item(&product_id, 20.0, 3)], 60.0), png_slip())
        .await
        .expect("oversell still sells");

    let product = ProductRepository::new(state.db.clone())
        .find_by_id(&product_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(product.stock, 0);
}

#[tokio::test]
async fn status_transitions_keep_analytics_in_lockstep() {
    let state = test_state().await;
    let product_id = seed_product(&state, "Rose Candle", 50.0, 10).await;
    let service = CheckoutService::new(&state);

    let order = service
        .checkout(None, request(vec![item(&product_id, 50.0, 1)], 50.0), png_slip())
        .await
        .unwrap();
    let order_id = order.id.unwrap().to_string();

    let orders = OrderRepository::new(state.db.clone());
    let analytics = AnalyticsRepository::new(state.db.clone());

    let transition = orders
        .update_status(&order_id, OrderStatus::Completed)
        .await
        .unwrap();
    assert_eq!(transition.previous, OrderStatus::Paid);
    assert_eq!(transition.order.status, OrderStatus::Completed);

    let summary = analytics.summary().await.unwrap();
    assert_eq!(summary.status_count(OrderStatus::Paid), 0);
    assert_eq!(summary.status_count(OrderStatus::Completed), 1);
    assert_eq!(summary.revenue_completed, 50.0);

    // Walking back out of completed releases the revenue again
    orders
        .update_status(&order_id, OrderStatus::Preparing)
        .await
        .unwrap();
    let summary = analytics.summary().await.unwrap();
    assert_eq!(summary.status_count(OrderStatus::Completed), 0);
    assert_eq!(summary.status_count(OrderStatus::Preparing), 1);
    assert_eq!(summary.revenue_completed, 0.0);
    assert_eq!(summary.revenue_total, 50.0);
}

#[tokio::test]
async fn reapplying_the_same_status_changes_nothing() {
    let state = test_state().await;
    let product_id = seed_product(&state, "Pine Candle", 25.0, 4).await;
    let service = CheckoutService::new(&state);

    let order = service
        .checkout(None, request(vec![item(&product_id, 25.0, 1)], 25.0), png_slip())
        .await
        .unwrap();
    let order_id = order.id.unwrap().to_string();

    let orders = OrderRepository::new(state.db.clone());
    let before = AnalyticsRepository::new(state.db.clone()).summary().await.unwrap();

    let transition = orders.update_status(&order_id, OrderStatus::Paid).await.unwrap();
    assert_eq!(transition.previous, OrderStatus::Paid);

    let after = AnalyticsRepository::new(state.db.clone()).summary().await.unwrap();
    assert_eq!(before.status_counts, after.status_counts);
    assert_eq!(before.revenue_completed, after.revenue_completed);
}

#[tokio::test]
async fn unknown_order_status_update_is_not_found() {
    let state = test_state().await;
    let result = OrderRepository::new(state.db.clone())
        .update_status("order:doesnotexist", OrderStatus::Shipped)
        .await;
    assert!(matches!(
        result,
        Err(store_server::db::repository::RepoError::NotFound(_))
    ));
}

#[tokio::test]
async fn edit_requires_at_least_one_field() {
    let state = test_state().await;
    let product_id = seed_product(&state, "Oud Candle", 80.0, 2).await;
    let service = CheckoutService::new(&state);

    let order = service
        .checkout(None, request(vec![item(&product_id, 80.0, 1)], 80.0), png_slip())
        .await
        .unwrap();
    let order_id = order.id.unwrap().to_string();
    let orders = OrderRepository::new(state.db.clone());

    let empty = orders.edit(&order_id, OrderEdit::default()).await;
    assert!(matches!(
        empty,
        Err(store_server::db::repository::RepoError::Validation(_))
    ));

    let edited = orders
        .edit(
            &order_id,
            OrderEdit {
                total: Some(85.0),
                customer: None,
                gift: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(edited.total, 85.0);
    // Untouched fields survive the merge
    assert_eq!(edited.code, order.code);
    assert_eq!(edited.customer.full_name, customer().full_name);
}

#[tokio::test]
async fn delete_returns_the_order_for_slip_cleanup() {
    let state = test_state().await;
    let product_id = seed_product(&state, "Citrus Candle", 35.0, 6).await;
    let service = CheckoutService::new(&state);

    let order = service
        .checkout(None, request(vec![item(&product_id, 35.0, 1)], 35.0), png_slip())
        .await
        .unwrap();
    let order_id = order.id.unwrap().to_string();
    let orders = OrderRepository::new(state.db.clone());

    let deleted = orders.delete(&order_id).await.unwrap();
    assert_eq!(deleted.code, order.code);
    assert!(deleted.slip_url.is_some());

    assert!(orders.find_by_id(&order_id).await.unwrap().is_none());

    // Deleting again is a NotFound, not a panic
    assert!(matches!(
        orders.delete(&order_id).await,
        Err(store_server::db::repository::RepoError::NotFound(_))
    ));
}

#[tokio::test]
async fn order_codes_are_never_reused() {
    let mut state = test_state().await;
    let blobs = Arc::new(MemoryBlobStore::new());
    state.blobs = blobs.clone();

    let product_id = seed_product(&state, "Smoke Candle", 40.0, 10).await;
    let service = CheckoutService::new(&state);

    let mut first = request(vec![item(&product_id, 40.0, 1)], 40.0);
    first.code = Some("SC-0000042".into());
    service.checkout(None, first, png_slip()).await.unwrap();

    // Same reserved code again: rejected as a conflict, not a generic
    // database error, and nothing written
    let mut second = request(vec![item(&product_id, 40.0, 1)], 40.0);
    second.code = Some("SC-0000042".into());
    let result = service.checkout(None, second, png_slip()).await;
    assert!(matches!(result, Err(AppError::Conflict(_))), "{result:?}");

    // The existing order's slip lives at the contested path and must
    // survive the rejected duplicate
    assert!(blobs.contains("slips/SC-0000042.png"));

    // The allocator was raised past the reserved code, so a fresh
    // allocation lands above it
    let third = service
        .checkout(None, request(vec![item(&product_id, 40.0, 1)], 40.0), png_slip())
        .await
        .unwrap();
    assert_eq!(third.code, "SC-0000043");
}

#[tokio::test]
async fn signing_up_claims_matching_guest_orders() {
    let state = test_state().await;
    let product_id = seed_product(&state, "Linen Candle", 32.0, 10).await;
    let service = CheckoutService::new(&state);

    // A guest order carrying the email the customer will sign up with
    let guest = service
        .checkout(None, request(vec![item(&product_id, 32.0, 1)], 32.0), png_slip())
        .await
        .unwrap();

    // An order that already belongs to someone, same email
    let owned = service
        .checkout(
            Some("uid-other"),
            request(vec![item(&product_id, 32.0, 1)], 32.0),
            png_slip(),
        )
        .await
        .unwrap();

    let orders = OrderRepository::new(state.db.clone());

    // Email match is case-insensitive
    let migrated = orders
        .claim_guest_orders("uid-new", "NIKA@example.test")
        .await
        .unwrap();
    assert_eq!(migrated, 1);

    let claimed = orders
        .find_by_id(&guest.id.unwrap().to_string())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(claimed.user_id.as_deref(), Some("uid-new"));

    let untouched = orders
        .find_by_id(&owned.id.unwrap().to_string())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(untouched.user_id.as_deref(), Some("uid-other"));

    // Repeating the migration finds nothing left to claim
    let again = orders
        .claim_guest_orders("uid-new", "nika@example.test")
        .await
        .unwrap();
    assert_eq!(again, 0);
}

#[tokio::test]
async fn malformed_client_codes_are_rejected() {
    let state = test_state().await;
    let product_id = seed_product(&state, "Mint Candle", 15.0, 5).await;
    let service = CheckoutService::new(&state);

    for bad in ["SC-42", "XX-0000042", "0000042"] {
        let mut req = request(vec![item(&product_id, 15.0, 1)], 15.0);
        req.code = Some(bad.into());
        let result = service.checkout(None, req, png_slip()).await;
        assert!(matches!(result, Err(AppError::Validation(_))), "{bad}");
    }
}

#[tokio::test]
async fn next_code_reserves_ahead_of_allocation() {
    let state = test_state().await;
    let product_id = seed_product(&state, "Fig Candle", 28.0, 5).await;
    let service = CheckoutService::new(&state);

    let (code, seq) = service.next_code().await.unwrap();
    assert_eq!((code.as_str(), seq), ("SC-0000001", 1));

    // The reservation raised the counter, so a checkout that did not
    // fetch a code cannot collide with the reserved one
    let other = service
        .checkout(None, request(vec![item(&product_id, 28.0, 1)], 28.0), png_slip())
        .await
        .unwrap();
    assert_eq!(other.code, "SC-0000002");

    // And the reserved code itself still goes through
    let mut reserved = request(vec![item(&product_id, 28.0, 1)], 28.0);
    reserved.code = Some(code);
    let order = service.checkout(None, reserved, png_slip()).await.unwrap();
    assert_eq!(order.code, "SC-0000001");
}

#[tokio::test]
async fn deactivated_accounts_cannot_check_out() {
    let state = test_state().await;
    let product_id = seed_product(&state, "Teak Candle", 55.0, 5).await;
    let customers = CustomerRepository::new(state.db.clone());

    customers
        .upsert(
            "uid-blocked",
            CustomerProfileUpsert {
                full_name: Some("Blocked".into()),
                email: Some("blocked@example.test".into()),
                phone: Some("+995555123456".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    customers.set_active("uid-blocked", false).await.unwrap();

    let service = CheckoutService::new(&state);

    // Signed in: matched by uid
    let result = service
        .checkout(
            Some("uid-blocked"),
            request(vec![item(&product_id, 55.0, 1)], 55.0),
            png_slip(),
        )
        .await;
    assert!(matches!(result, Err(AppError::Unauthorized)), "{result:?}");

    // Guest: matched by the phone on the checkout form
    let result = service
        .checkout(None, request(vec![item(&product_id, 55.0, 1)], 55.0), png_slip())
        .await;
    assert!(matches!(result, Err(AppError::Unauthorized)), "{result:?}");
}

#[tokio::test]
async fn slip_validation_gates_checkout() {
    let state = test_state().await;
    let product_id = seed_product(&state, "Clay Candle", 22.0, 5).await;
    let service = CheckoutService::new(&state);

    // Wrong type
    let bad_type = SlipUpload {
        bytes: vec![1, 2, 3],
        content_type: Some("text/plain".into()),
        file_name: Some("slip.txt".into()),
    };
    let result = service
        .checkout(None, request(vec![item(&product_id, 22.0, 1)], 22.0), bad_type)
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    // Empty file
    let empty = SlipUpload {
        bytes: vec![],
        content_type: Some("image/png".into()),
        file_name: None,
    };
    let result = service
        .checkout(None, request(vec![item(&product_id, 22.0, 1)], 22.0), empty)
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn totals_below_the_item_subtotal_are_rejected() {
    let state = test_state().await;
    let product_id = seed_product(&state, "Basil Candle", 30.0, 5).await;
    let service = CheckoutService::new(&state);

    let result = service
        .checkout(None, request(vec![item(&product_id, 30.0, 2)], 59.99), png_slip())
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    let result = service
        .checkout(None, request(vec![], 0.0), png_slip())
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn customer_code_assignment_is_write_once() {
    let state = test_state().await;
    let customers = CustomerRepository::new(state.db.clone());

    customers
        .upsert("uid-1", CustomerProfileUpsert::default())
        .await
        .unwrap();

    let first = customers.set_customer_code_once("uid-1", "7").await.unwrap();
    assert_eq!(first, "7");

    // A later attempt with a different candidate keeps the original
    let second = customers.set_customer_code_once("uid-1", "8").await.unwrap();
    assert_eq!(second, "7");

    let profile = customers.find_by_uid("uid-1").await.unwrap().unwrap();
    assert_eq!(profile.customer_code.as_deref(), Some("7"));
}

#[tokio::test]
async fn legacy_customer_codes_are_replaced() {
    let state = test_state().await;
    let customers = CustomerRepository::new(state.db.clone());

    customers
        .upsert("uid-legacy", CustomerProfileUpsert::default())
        .await
        .unwrap();

    // A pre-migration profile carrying a free-form code
    state
        .db
        .query("UPDATE type::thing('profile', $uid) SET customerCode = 'OLD-CODE-9'")
        .bind(("uid", "uid-legacy".to_string()))
        .await
        .unwrap();

    // Assignment treats the invalid value as absent
    let assigned = customers
        .set_customer_code_once("uid-legacy", "12")
        .await
        .unwrap();
    assert_eq!(assigned, "12");

    // The replacement is a valid code, so it now sticks
    let kept = customers
        .set_customer_code_once("uid-legacy", "13")
        .await
        .unwrap();
    assert_eq!(kept, "12");
}
