use super::*;
use crate::auth::CurrentUser;
use crate::db::DbService;
use crate::db::repository::{product, user};
use crate::notify::{OrderEvent, OrderEventBus, RecordingMailer};
use shared::models::{
    OrderCreate, OrderLineCreate, OrderStatus, OrderStatusUpdate, PaymentChannel, PaymentDetails,
    PaymentMethod, ProductCreate, ShippingAddress, UserRole,
};
use std::sync::Arc;
use std::time::Duration;

struct Harness {
    db: DbService,
    manager: OrdersManager,
    mailer: Arc<RecordingMailer>,
}

async fn harness_with(mailer: RecordingMailer, policy: OtpPolicy) -> Harness {
    harness_on(DbService::in_memory().await.unwrap(), mailer, policy)
}

fn harness_on(db: DbService, mailer: RecordingMailer, policy: OtpPolicy) -> Harness {
    let mailer = Arc::new(mailer);
    let manager = OrdersManager::new(
        db.pool.clone(),
        OrderEventBus::new(),
        mailer.clone(),
        policy,
    );
    Harness {
        db,
        manager,
        mailer,
    }
}

async fn harness() -> Harness {
    harness_with(RecordingMailer::new(), OtpPolicy::default()).await
}

/// WAL file database with a multi-connection pool
async fn file_harness(dir: &tempfile::TempDir) -> Harness {
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("shop.db").display());
    let db = DbService::new(&url).await.unwrap();
    harness_on(db, RecordingMailer::new(), OtpPolicy::default())
}

async fn customer(h: &Harness, email: &str) -> CurrentUser {
    let u = user::create(
        &h.db.pool,
        user::NewUser {
            name: "Asha Rao",
            email,
            password_hash: "x",
            role: UserRole::Customer,
            phone: None,
        },
    )
    .await
    .unwrap();
    CurrentUser {
        id: u.id,
        email: u.email,
        role: u.role,
    }
}

fn admin() -> CurrentUser {
    CurrentUser {
        id: 1,
        email: "admin@example.com".into(),
        role: UserRole::Admin,
    }
}

async fn seed_product(h: &Harness, name: &str, price: i64, stock: i64) -> i64 {
    product::create(
        &h.db.pool,
        ProductCreate {
            name: name.into(),
            description: String::new(),
            price,
            original_price: None,
            images: vec![],
            category: "electronics".into(),
            stock,
            features: vec![],
            tags: vec![],
            is_featured: false,
        },
    )
    .await
    .unwrap()
    .id
}

async fn stock_of(h: &Harness, id: i64) -> i64 {
    sqlx::query_scalar("SELECT stock FROM product WHERE id = ?")
        .bind(id)
        .fetch_one(&h.db.pool)
        .await
        .unwrap()
}

async fn order_count(h: &Harness) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM orders")
        .fetch_one(&h.db.pool)
        .await
        .unwrap()
}

fn address() -> ShippingAddress {
    ShippingAddress {
        name: "Asha Rao".into(),
        phone: "9876543210".into(),
        address: "12 MG Road".into(),
        city: "Bengaluru".into(),
        state: "Karnataka".into(),
        pincode: "560001".into(),
    }
}

fn order_of(lines: &[(i64, i64)]) -> OrderCreate {
    OrderCreate {
        items: lines
            .iter()
            .map(|&(product_id, quantity)| OrderLineCreate {
                product_id,
                quantity,
            })
            .collect(),
        shipping_address: address(),
        payment_method: PaymentMethod::Cod,
        payment_details: None,
        notes: None,
    }
}

/// The OTP is emailed from a spawned task; wait for it to land
async fn otp_for(h: &Harness, order_id: i64) -> String {
    for _ in 0..100 {
        if let Some(code) = h.mailer.last_otp(order_id) {
            return code;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("no OTP email for order {order_id}");
}

fn wrong_code(code: &str) -> String {
    if code == "999999" { "111111".into() } else { "999999".into() }
}

fn status(s: &str) -> OrderStatusUpdate {
    OrderStatusUpdate {
        status: s.into(),
        location: None,
        description: None,
        estimated_delivery: None,
    }
}

// ========================================================================
// Creation
// ========================================================================

#[tokio::test]
async fn test_create_order_totals_and_reserves() {
    let h = harness().await;
    let user = customer(&h, "asha@example.com").await;
    let watch = seed_product(&h, "Smartwatch", 1_999_900, 5).await;
    let cable = seed_product(&h, "Cable", 29_900, 10).await;

    let order = h
        .manager
        .create_order(&user, order_of(&[(watch, 2), (cable, 3)]))
        .await
        .unwrap();

    assert_eq!(order.total, 2 * 1_999_900 + 3 * 29_900);
    assert_eq!(order.status, OrderStatus::Pending);
    assert!(!order.otp_verified);
    assert_eq!(order.items.len(), 2);
    assert_eq!(order.items[0].name, "Smartwatch");
    assert_eq!(order.items[1].unit_price, 29_900);
    assert_eq!(order.tracking.len(), 1);
    assert_eq!(order.tracking[0].status, "Order Placed");
    assert_eq!(order.tracking[0].location, "Processing Center");

    assert_eq!(stock_of(&h, watch).await, 3);
    assert_eq!(stock_of(&h, cable).await, 7);

    let code = otp_for(&h, order.id).await;
    assert_eq!(code.len(), 6);
    assert_eq!(h.mailer.sent()[0].to, "asha@example.com");
}

#[tokio::test]
async fn test_line_price_is_frozen_at_purchase() {
    let h = harness().await;
    let user = customer(&h, "asha@example.com").await;
    let watch = seed_product(&h, "Smartwatch", 1_000, 5).await;

    let order = h.manager.create_order(&user, order_of(&[(watch, 1)])).await.unwrap();
    product::update(
        &h.db.pool,
        watch,
        shared::models::ProductUpdate {
            price: Some(5_000),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let reloaded = h.manager.get_order(&user, order.id).await.unwrap();
    assert_eq!(reloaded.items[0].unit_price, 1_000);
    assert_eq!(reloaded.total, 1_000);
}

#[tokio::test]
async fn test_insufficient_stock_on_second_of_three_rolls_back() {
    let h = harness().await;
    let user = customer(&h, "asha@example.com").await;
    let a = seed_product(&h, "Headphones", 100, 5).await;
    let b = seed_product(&h, "Smartwatch", 200, 1).await;
    let c = seed_product(&h, "Cable", 300, 5).await;

    let err = h
        .manager
        .create_order(&user, order_of(&[(a, 2), (b, 2), (c, 1)]))
        .await
        .unwrap_err();

    match err {
        OrderError::InsufficientStock {
            product_id,
            ref name,
            available,
            requested,
        } => {
            assert_eq!(product_id, b);
            assert_eq!(name, "Smartwatch");
            assert_eq!(available, 1);
            assert_eq!(requested, 2);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(stock_of(&h, a).await, 5);
    assert_eq!(stock_of(&h, b).await, 1);
    assert_eq!(stock_of(&h, c).await, 5);
    assert_eq!(order_count(&h).await, 0);
}

#[tokio::test]
async fn test_order_ten_against_stock_three() {
    let h = harness().await;
    let user = customer(&h, "asha@example.com").await;
    let watch = seed_product(&h, "Smartwatch", 1_999_900, 3).await;

    let err = h
        .manager
        .create_order(&user, order_of(&[(watch, 10)]))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Insufficient stock for Smartwatch. Available: 3");
    assert_eq!(stock_of(&h, watch).await, 3);
    assert_eq!(order_count(&h).await, 0);
}

#[tokio::test]
async fn test_unknown_or_inactive_product() {
    let h = harness().await;
    let user = customer(&h, "asha@example.com").await;
    let watch = seed_product(&h, "Smartwatch", 100, 3).await;
    product::deactivate(&h.db.pool, watch).await.unwrap();

    let err = h.manager.create_order(&user, order_of(&[(watch, 1)])).await.unwrap_err();
    assert!(matches!(err, OrderError::ProductNotFound(id) if id == watch));

    let err = h.manager.create_order(&user, order_of(&[(424242, 1)])).await.unwrap_err();
    assert!(matches!(err, OrderError::ProductNotFound(424242)));
}

#[tokio::test]
async fn test_create_validation() {
    let h = harness().await;
    let user = customer(&h, "asha@example.com").await;
    let watch = seed_product(&h, "Smartwatch", 100, 3).await;

    let err = h.manager.create_order(&user, order_of(&[])).await.unwrap_err();
    assert!(matches!(err, OrderError::Validation(_)));

    let err = h.manager.create_order(&user, order_of(&[(watch, 0)])).await.unwrap_err();
    assert!(matches!(err, OrderError::Validation(_)));

    let mut req = order_of(&[(watch, 1)]);
    req.shipping_address.pincode = "012345".into();
    let err = h.manager.create_order(&user, req).await.unwrap_err();
    assert!(matches!(err, OrderError::Validation(_)));

    let mut req = order_of(&[(watch, 1)]);
    req.shipping_address.phone = "12345".into();
    let err = h.manager.create_order(&user, req).await.unwrap_err();
    assert!(matches!(err, OrderError::Validation(_)));

    let mut req = order_of(&[(watch, 1)]);
    req.payment_details = Some(PaymentDetails {
        method: PaymentChannel::Upi,
        transaction_id: None,
    });
    let err = h.manager.create_order(&user, req).await.unwrap_err();
    assert!(matches!(err, OrderError::InvalidPayment(_)));

    assert_eq!(stock_of(&h, watch).await, 3);
}

#[tokio::test]
async fn test_shipping_phone_is_stored_as_national_digits() {
    let h = harness().await;
    let user = customer(&h, "asha@example.com").await;
    let watch = seed_product(&h, "Smartwatch", 100, 3).await;

    let mut req = order_of(&[(watch, 1)]);
    req.shipping_address.phone = "+91 98765-43210".into();
    let order = h.manager.create_order(&user, req).await.unwrap();
    assert_eq!(order.shipping_address.phone, "9876543210");
}

#[tokio::test]
async fn test_negative_estimated_delivery_rejected() {
    let h = harness().await;
    let user = customer(&h, "asha@example.com").await;
    let watch = seed_product(&h, "Smartwatch", 100, 3).await;
    let order = h.manager.create_order(&user, order_of(&[(watch, 1)])).await.unwrap();

    let mut req = status("confirmed");
    req.estimated_delivery = Some(-1);
    let err = h.manager.update_status(order.id, req).await.unwrap_err();
    assert!(matches!(err, OrderError::Validation(_)));
    let reloaded = h.manager.get_order(&user, order.id).await.unwrap();
    assert_eq!(reloaded.status, OrderStatus::Pending);
}

#[tokio::test]
async fn test_mail_failure_does_not_fail_order() {
    let h = harness_with(RecordingMailer::failing(), OtpPolicy::default()).await;
    let user = customer(&h, "asha@example.com").await;
    let watch = seed_product(&h, "Smartwatch", 100, 3).await;

    let order = h.manager.create_order(&user, order_of(&[(watch, 1)])).await.unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(stock_of(&h, watch).await, 2);
}

// ========================================================================
// OTP
// ========================================================================

#[tokio::test]
async fn test_verify_succeeds_exactly_once() {
    let h = harness().await;
    let user = customer(&h, "asha@example.com").await;
    let watch = seed_product(&h, "Smartwatch", 100, 3).await;
    let order = h.manager.create_order(&user, order_of(&[(watch, 1)])).await.unwrap();
    let code = otp_for(&h, order.id).await;

    let confirmed = h.manager.verify_otp(&user, order.id, &code).await.unwrap();
    assert_eq!(confirmed.status, OrderStatus::Confirmed);
    assert!(confirmed.otp_verified);
    assert_eq!(confirmed.tracking.len(), 2);
    assert_eq!(confirmed.tracking[1].status, "Order Confirmed");

    let err = h.manager.verify_otp(&user, order.id, &code).await.unwrap_err();
    assert!(matches!(err, OrderError::AlreadyVerified));
}

#[tokio::test]
async fn test_verify_wrong_code_and_foreign_order() {
    let h = harness().await;
    let user = customer(&h, "asha@example.com").await;
    let other = customer(&h, "ravi@example.com").await;
    let watch = seed_product(&h, "Smartwatch", 100, 3).await;
    let order = h.manager.create_order(&user, order_of(&[(watch, 1)])).await.unwrap();
    let code = otp_for(&h, order.id).await;

    let err = h.manager.verify_otp(&user, order.id, &wrong_code(&code)).await.unwrap_err();
    assert!(matches!(err, OrderError::InvalidOtp));

    let err = h.manager.verify_otp(&other, order.id, &code).await.unwrap_err();
    assert!(matches!(err, OrderError::NotFound(_)));

    // A wrong guess does not burn the right code
    h.manager.verify_otp(&user, order.id, &code).await.unwrap();
}

#[tokio::test]
async fn test_expired_otp_rejected_even_when_correct() {
    let h = harness().await;
    let user = customer(&h, "asha@example.com").await;
    let watch = seed_product(&h, "Smartwatch", 100, 3).await;
    let order = h.manager.create_order(&user, order_of(&[(watch, 1)])).await.unwrap();
    let code = otp_for(&h, order.id).await;

    sqlx::query("UPDATE orders SET otp_expires_at = ? WHERE id = ?")
        .bind(shared::util::now_millis() - 1)
        .bind(order.id)
        .execute(&h.db.pool)
        .await
        .unwrap();

    let err = h.manager.verify_otp(&user, order.id, &code).await.unwrap_err();
    assert!(matches!(err, OrderError::OtpExpired));
    let reloaded = h.manager.get_order(&user, order.id).await.unwrap();
    assert_eq!(reloaded.status, OrderStatus::Pending);
}

#[tokio::test]
async fn test_attempt_limit_and_resend_resets_it() {
    let policy = OtpPolicy {
        ttl_secs: 600,
        max_attempts: 2,
    };
    let h = harness_with(RecordingMailer::new(), policy).await;
    let user = customer(&h, "asha@example.com").await;
    let watch = seed_product(&h, "Smartwatch", 100, 3).await;
    let order = h.manager.create_order(&user, order_of(&[(watch, 1)])).await.unwrap();
    let code = otp_for(&h, order.id).await;
    let wrong = wrong_code(&code);

    for _ in 0..2 {
        let err = h.manager.verify_otp(&user, order.id, &wrong).await.unwrap_err();
        assert!(matches!(err, OrderError::InvalidOtp));
    }
    let err = h.manager.verify_otp(&user, order.id, &code).await.unwrap_err();
    assert!(matches!(err, OrderError::TooManyAttempts));

    let issued = h.manager.resend_otp(&user, order.id).await.unwrap();
    assert_eq!(issued.order_id, order.id);
    assert!(issued.expires_at > shared::util::now_millis());

    // Wait for the second OTP email
    let mut fresh = None;
    for _ in 0..100 {
        let otps: Vec<_> = h
            .mailer
            .sent()
            .into_iter()
            .filter(|s| matches!(s.email, crate::notify::EmailTemplate::OrderOtp { .. }))
            .collect();
        if otps.len() == 2 {
            fresh = h.mailer.last_otp(order.id);
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let fresh = fresh.unwrap();
    let confirmed = h.manager.verify_otp(&user, order.id, &fresh).await.unwrap();
    assert_eq!(confirmed.status, OrderStatus::Confirmed);
}

#[tokio::test]
async fn test_verify_after_cancel_is_invalid_state() {
    let h = harness().await;
    let user = customer(&h, "asha@example.com").await;
    let watch = seed_product(&h, "Smartwatch", 100, 3).await;
    let order = h.manager.create_order(&user, order_of(&[(watch, 1)])).await.unwrap();
    let code = otp_for(&h, order.id).await;

    h.manager.cancel_order(&user, order.id, None).await.unwrap();
    let err = h.manager.verify_otp(&user, order.id, &code).await.unwrap_err();
    assert!(matches!(err, OrderError::InvalidState(OrderStatus::Cancelled)));

    let err = h.manager.resend_otp(&user, order.id).await.unwrap_err();
    assert!(matches!(err, OrderError::InvalidState(OrderStatus::Cancelled)));
}

// ========================================================================
// Status machine
// ========================================================================

#[tokio::test]
async fn test_end_to_end_lifecycle() {
    let h = harness().await;
    let user = customer(&h, "asha@example.com").await;
    let watch = seed_product(&h, "Smartwatch", 1_999_900, 5).await;

    let order = h.manager.create_order(&user, order_of(&[(watch, 2)])).await.unwrap();
    assert_eq!(stock_of(&h, watch).await, 3);
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.tracking.len(), 1);

    let code = otp_for(&h, order.id).await;
    let order = h.manager.verify_otp(&user, order.id, &code).await.unwrap();
    assert_eq!(order.status, OrderStatus::Confirmed);
    assert_eq!(order.tracking.len(), 2);

    let order = h
        .manager
        .update_status(
            order.id,
            OrderStatusUpdate {
                status: "shipped".into(),
                location: Some("Mumbai Hub".into()),
                description: None,
                estimated_delivery: Some(1_767_225_600_000),
            },
        )
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Shipped);
    assert_eq!(order.tracking.len(), 3);
    assert_eq!(order.tracking[2].status, "Shipped");
    assert_eq!(order.tracking[2].location, "Mumbai Hub");
    assert_eq!(order.tracking[2].description, "Order status updated to shipped");
    assert_eq!(order.estimated_delivery, Some(1_767_225_600_000));
    assert_eq!(stock_of(&h, watch).await, 3);
    assert!(order.actual_delivery.is_none());

    let order = h.manager.update_status(order.id, status("delivered")).await.unwrap();
    assert_eq!(order.status, OrderStatus::Delivered);
    assert_eq!(order.tracking.len(), 4);
    assert_eq!(order.tracking[3].location, "Processing Center");
    assert!(order.actual_delivery.is_some());
    assert_eq!(order.estimated_delivery, Some(1_767_225_600_000));

    let seqs: Vec<i64> = order.tracking.iter().map(|t| t.seq).collect();
    assert_eq!(seqs, vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn test_transition_table_is_enforced() {
    let h = harness().await;
    let user = customer(&h, "asha@example.com").await;
    let watch = seed_product(&h, "Smartwatch", 100, 5).await;
    let order = h.manager.create_order(&user, order_of(&[(watch, 1)])).await.unwrap();

    let err = h.manager.update_status(order.id, status("shipped")).await.unwrap_err();
    assert!(matches!(
        err,
        OrderError::InvalidTransition {
            from: OrderStatus::Pending,
            to: OrderStatus::Shipped
        }
    ));

    let err = h.manager.update_status(order.id, status("pending")).await.unwrap_err();
    assert!(matches!(err, OrderError::InvalidTransition { .. }));

    let err = h.manager.update_status(order.id, status("returned")).await.unwrap_err();
    assert!(matches!(err, OrderError::Validation(_)));

    let err = h.manager.update_status(999, status("shipped")).await.unwrap_err();
    assert!(matches!(err, OrderError::NotFound(999)));

    // Failed attempts leave no trace
    let reloaded = h.manager.get_order(&user, order.id).await.unwrap();
    assert_eq!(reloaded.status, OrderStatus::Pending);
    assert_eq!(reloaded.tracking.len(), 1);
}

#[tokio::test]
async fn test_concurrent_transitions_only_one_wins() {
    let h = harness().await;
    let user = customer(&h, "asha@example.com").await;
    let watch = seed_product(&h, "Smartwatch", 100, 5).await;
    let order = h.manager.create_order(&user, order_of(&[(watch, 1)])).await.unwrap();
    h.manager.update_status(order.id, status("confirmed")).await.unwrap();

    let (a, b) = tokio::join!(
        h.manager.update_status(order.id, status("shipped")),
        h.manager.update_status(order.id, status("shipped")),
    );
    let wins = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(wins, 1);
    let loser = if a.is_err() { a } else { b };
    assert!(matches!(loser, Err(OrderError::InvalidTransition { .. })));

    let reloaded = h.manager.get_order(&user, order.id).await.unwrap();
    assert_eq!(reloaded.tracking.len(), 3);
}

// ========================================================================
// Cancellation
// ========================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_cancellations_on_file_database() {
    let dir = tempfile::tempdir().unwrap();
    let h = file_harness(&dir).await;
    let user = customer(&h, "asha@example.com").await;
    let watch = seed_product(&h, "Smartwatch", 100, 10).await;

    for round in 0..30 {
        let order = h.manager.create_order(&user, order_of(&[(watch, 2)])).await.unwrap();
        if round % 2 == 1 {
            h.manager.update_status(order.id, status("confirmed")).await.unwrap();
        }

        let (by_user, by_admin) = tokio::join!(
            h.manager.cancel_order(&user, order.id, None),
            h.manager.update_status(order.id, status("cancelled")),
        );
        let results = [by_user, by_admin];
        let wins = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(wins, 1, "round {round}: {results:?}");
        for result in &results {
            if let Err(err) = result {
                assert!(
                    matches!(err, OrderError::InvalidState(OrderStatus::Cancelled)),
                    "round {round}: {err:?}"
                );
            }
        }

        let cancel_entries: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM order_tracking WHERE order_id = ? AND status = 'Order Cancelled'",
        )
        .bind(order.id)
        .fetch_one(&h.db.pool)
        .await
        .unwrap();
        assert_eq!(cancel_entries, 1);
        assert_eq!(stock_of(&h, watch).await, 10, "round {round}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cancel_racing_confirmation_on_file_database() {
    let dir = tempfile::tempdir().unwrap();
    let h = file_harness(&dir).await;
    let user = customer(&h, "asha@example.com").await;
    let watch = seed_product(&h, "Smartwatch", 100, 10).await;

    for round in 0..20 {
        let order = h.manager.create_order(&user, order_of(&[(watch, 1)])).await.unwrap();
        let (cancelled, confirmed) = tokio::join!(
            h.manager.cancel_order(&user, order.id, None),
            h.manager.update_status(order.id, status("confirmed")),
        );
        // The cancellation always lands, either before or after the confirmation
        let cancelled = cancelled.unwrap_or_else(|e| panic!("round {round}: {e:?}"));
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        if let Err(err) = confirmed {
            assert!(
                matches!(err, OrderError::InvalidTransition { .. }),
                "round {round}: {err:?}"
            );
        }
        assert_eq!(stock_of(&h, watch).await, 10, "round {round}");
    }
}

#[tokio::test]
async fn test_cancel_pending_restores_stock() {
    let h = harness().await;
    let user = customer(&h, "asha@example.com").await;
    let a = seed_product(&h, "Headphones", 100, 5).await;
    let b = seed_product(&h, "Cable", 10, 8).await;
    let order = h
        .manager
        .create_order(&user, order_of(&[(a, 2), (b, 3)]))
        .await
        .unwrap();
    assert_eq!(stock_of(&h, a).await, 3);

    let cancelled = h.manager.cancel_order(&user, order.id, None).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(cancelled.cancellation_reason.as_deref(), Some("Order cancelled by user"));
    let last = cancelled.tracking.last().unwrap();
    assert_eq!(last.status, "Order Cancelled");
    assert_eq!(last.location, "System");
    assert_eq!(stock_of(&h, a).await, 5);
    assert_eq!(stock_of(&h, b).await, 8);

    let err = h.manager.cancel_order(&user, order.id, None).await.unwrap_err();
    assert!(matches!(err, OrderError::InvalidState(OrderStatus::Cancelled)));
    assert_eq!(stock_of(&h, a).await, 5);
}

#[tokio::test]
async fn test_cancel_delivered_is_invalid_state() {
    let h = harness().await;
    let user = customer(&h, "asha@example.com").await;
    let watch = seed_product(&h, "Smartwatch", 100, 5).await;
    let order = h.manager.create_order(&user, order_of(&[(watch, 1)])).await.unwrap();
    for s in ["confirmed", "shipped", "delivered"] {
        h.manager.update_status(order.id, status(s)).await.unwrap();
    }

    let err = h.manager.cancel_order(&user, order.id, None).await.unwrap_err();
    assert!(matches!(err, OrderError::InvalidState(OrderStatus::Delivered)));
    let err = h.manager.update_status(order.id, status("cancelled")).await.unwrap_err();
    assert!(matches!(err, OrderError::InvalidState(OrderStatus::Delivered)));
    assert_eq!(stock_of(&h, watch).await, 4);
}

#[tokio::test]
async fn test_admin_cancel_with_reason_and_owner_scope() {
    let h = harness().await;
    let user = customer(&h, "asha@example.com").await;
    let other = customer(&h, "ravi@example.com").await;
    let watch = seed_product(&h, "Smartwatch", 100, 5).await;
    let order = h.manager.create_order(&user, order_of(&[(watch, 2)])).await.unwrap();

    let err = h.manager.cancel_order(&other, order.id, None).await.unwrap_err();
    assert!(matches!(err, OrderError::NotFound(_)));

    h.manager.update_status(order.id, status("confirmed")).await.unwrap();
    let cancelled = h
        .manager
        .update_status(
            order.id,
            OrderStatusUpdate {
                status: "cancelled".into(),
                location: None,
                description: Some("Address unreachable".into()),
                estimated_delivery: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(cancelled.cancellation_reason.as_deref(), Some("Address unreachable"));
    assert_eq!(cancelled.tracking.last().unwrap().description, "Address unreachable");
    assert_eq!(stock_of(&h, watch).await, 5);
}

// ========================================================================
// Events & queries
// ========================================================================

#[tokio::test]
async fn test_one_event_per_step() {
    let h = harness().await;
    let mut rx = h.manager.subscribe();
    let user = customer(&h, "asha@example.com").await;
    let watch = seed_product(&h, "Smartwatch", 100, 5).await;

    let order = h.manager.create_order(&user, order_of(&[(watch, 1)])).await.unwrap();
    assert!(matches!(rx.try_recv().unwrap(), OrderEvent::Placed(p) if p.order_id == order.id));

    h.manager.update_status(order.id, status("confirmed")).await.unwrap();
    match rx.try_recv().unwrap() {
        OrderEvent::Transitioned(t) => {
            assert_eq!(t.from, OrderStatus::Pending);
            assert_eq!(t.to, OrderStatus::Confirmed);
            assert_eq!(t.user_email.as_deref(), Some("asha@example.com"));
            assert_eq!(t.tracking.seq, 2);
        }
        other => panic!("unexpected event: {other:?}"),
    }

    // Rejected commands publish nothing
    let _ = h.manager.update_status(order.id, status("delivered")).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_queries_are_scoped() {
    let h = harness().await;
    let user = customer(&h, "asha@example.com").await;
    let other = customer(&h, "ravi@example.com").await;
    let watch = seed_product(&h, "Smartwatch", 100, 50).await;

    for _ in 0..3 {
        h.manager.create_order(&user, order_of(&[(watch, 1)])).await.unwrap();
    }
    let theirs = h.manager.create_order(&other, order_of(&[(watch, 1)])).await.unwrap();
    h.manager.update_status(theirs.id, status("confirmed")).await.unwrap();

    let mine = h.manager.list_my_orders(&user, Some(1), Some(2)).await.unwrap();
    assert_eq!(mine.total, 3);
    assert_eq!(mine.total_pages, 2);
    assert_eq!(mine.orders.len(), 2);
    assert!(mine.orders.iter().all(|o| o.user_id == user.id));

    let err = h.manager.get_order(&user, theirs.id).await.unwrap_err();
    assert!(matches!(err, OrderError::NotFound(_)));
    assert!(h.manager.get_order(&admin(), theirs.id).await.is_ok());

    let all = h.manager.list_orders(None, None, None).await.unwrap();
    assert_eq!(all.total, 4);
    let confirmed = h.manager.list_orders(None, None, Some("confirmed")).await.unwrap();
    assert_eq!(confirmed.total, 1);
    assert_eq!(confirmed.orders[0].id, theirs.id);

    let err = h.manager.list_orders(None, None, Some("lost")).await.unwrap_err();
    assert!(matches!(err, OrderError::Validation(_)));
}
