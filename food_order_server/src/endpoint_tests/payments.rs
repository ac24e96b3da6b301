use std::time::Duration;

use actix_web::{
    http::{Method, StatusCode},
    web,
    web::ServiceConfig,
};
use food_order_engine::{
    db_types::{Money, OrderPaymentStatus, OrderStatusType, PaymentMethod, PaymentStatus, Role},
    events::EventProducers,
    test_utils::fake_gateway::{FakeGateway, GatewayBehaviour},
    traits::PaymentCommit,
    PaymentFlowApi,
};
use mockall::predicate::eq;
use serde_json::json;

use super::{helpers::*, mocks::MockBackend};
use crate::routes::{CreatePaymentRoute, PaymentForOrderRoute, RefundRoute, VerifyPaymentRoute};

fn payment_app(db: MockBackend, gateway: FakeGateway) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = PaymentFlowApi::new(db, gateway, EventProducers::default())
            .with_gateway_timeout(Duration::from_millis(100));
        cfg.app_data(web::Data::new(api))
            .app_data(web::Data::new(profiles(&[(Role::Customer, CUSTOMER_ID)])))
            .service(CreatePaymentRoute::<MockBackend, FakeGateway>::new())
            .service(VerifyPaymentRoute::<MockBackend, FakeGateway>::new())
            .service(RefundRoute::<MockBackend, FakeGateway>::new())
            .service(PaymentForOrderRoute::<MockBackend, FakeGateway>::new());
    }
}

fn customer_token() -> String {
    valid_token(&[Role::Customer])
}

#[actix_web::test]
async fn create_payment() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBackend::new();
    db.expect_fetch_payment_for_order().with(eq(11)).returning(|_| Ok(None));
    db.expect_fetch_order().returning(|id| Ok(Some(order(id, OrderStatusType::Pending))));
    db.expect_open_payment()
        .withf(|o, m| o.id == 11 && *m == PaymentMethod::Upi)
        .times(1)
        .returning(|o, _| Ok(Some(payment(o.id, PaymentStatus::Pending, None))));
    db.expect_attach_gateway_reference()
        .with(eq(30), eq("order_000001"))
        .times(1)
        .returning(|_, r| Ok(Some(payment(11, PaymentStatus::Pending, Some(r)))));
    let gateway = FakeGateway::default();
    let req = request(Method::POST, "/api/create-payment", Some(&customer_token()))
        .set_json(json!({"order_id": 11, "method": "UPI"}));
    let (status, body) = send(req, payment_app(db, gateway.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""payment_id":30"#), "was: {body}");
    assert!(body.contains(r#""gateway_order_ref":"order_000001""#), "was: {body}");
    assert!(body.contains(r#""gateway_public_key":"rzp_test_fake""#), "was: {body}");
    let opened = gateway.opened.lock().unwrap();
    assert_eq!(opened.len(), 1);
    assert_eq!(opened[0].receipt, "order_11");
    assert_eq!(opened[0].amount, Money::from(29_000));
}

#[actix_web::test]
async fn create_payment_for_someone_elses_order() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBackend::new();
    db.expect_fetch_payment_for_order().returning(|_| Ok(None));
    db.expect_fetch_order().returning(|id| {
        let mut o = order(id, OrderStatusType::Pending);
        o.customer_id = 77;
        Ok(Some(o))
    });
    db.expect_open_payment().never();
    let gateway = FakeGateway::default();
    let req = request(Method::POST, "/api/create-payment", Some(&customer_token()))
        .set_json(json!({"order_id": 11, "method": "CARD"}));
    let (status, _) = send(req, payment_app(db, gateway.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(gateway.opened.lock().unwrap().is_empty());
}

#[actix_web::test]
async fn hanging_gateway_times_out() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBackend::new();
    db.expect_fetch_payment_for_order().returning(|_| Ok(None));
    db.expect_fetch_order().returning(|id| Ok(Some(order(id, OrderStatusType::Pending))));
    db.expect_open_payment().returning(|o, _| Ok(Some(payment(o.id, PaymentStatus::Pending, None))));
    db.expect_attach_gateway_reference().never();
    let gateway = FakeGateway::default();
    gateway.set_behaviour(GatewayBehaviour::Hang(Duration::from_secs(2)));
    let req = request(Method::POST, "/api/create-payment", Some(&customer_token()))
        .set_json(json!({"order_id": 11, "method": "UPI"}));
    let (status, body) = send(req, payment_app(db, gateway)).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert!(body.contains("did not respond"), "was: {body}");
}

#[actix_web::test]
async fn rejected_gateway_call_is_a_bad_gateway() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBackend::new();
    db.expect_fetch_payment_for_order().returning(|_| Ok(None));
    db.expect_fetch_order().returning(|id| Ok(Some(order(id, OrderStatusType::Pending))));
    db.expect_open_payment().returning(|o, _| Ok(Some(payment(o.id, PaymentStatus::Pending, None))));
    let gateway = FakeGateway::default();
    gateway.set_behaviour(GatewayBehaviour::Reject);
    let req = request(Method::POST, "/api/create-payment", Some(&customer_token()))
        .set_json(json!({"order_id": 11, "method": "UPI"}));
    let (status, _) = send(req, payment_app(db, gateway)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[actix_web::test]
async fn verify_payment() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBackend::new();
    db.expect_fetch_payment_for_order()
        .returning(|id| Ok(Some(payment(id, PaymentStatus::Pending, Some("order_000001")))));
    db.expect_fetch_order().returning(|id| Ok(Some(order(id, OrderStatusType::Pending))));
    db.expect_settle_payment().with(eq(30), eq("pay_abc")).times(1).returning(|_, r| {
        let mut o = order(11, OrderStatusType::Pending);
        o.payment_status = OrderPaymentStatus::Paid;
        let p = payment(11, PaymentStatus::Success, Some(r));
        Ok(PaymentCommit { order: o, payment: p })
    });
    db.expect_mark_payment_failed().never();
    let proof = FakeGateway::sign("order_000001", "pay_abc");
    let body = json!({"order_id": 11, "gateway_order_ref": "order_000001", "gateway_payment_ref": "pay_abc", "proof": proof});
    let req = request(Method::POST, "/api/verify-payment", Some(&customer_token())).set_json(body);
    let (status, body) = send(req, payment_app(db, FakeGateway::default())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""status":"SUCCESS""#), "was: {body}");
    assert!(body.contains(r#""transaction_id":"pay_abc""#), "was: {body}");
}

#[actix_web::test]
async fn tampered_proof_fails_the_payment() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBackend::new();
    db.expect_fetch_payment_for_order()
        .returning(|id| Ok(Some(payment(id, PaymentStatus::Pending, Some("order_000001")))));
    db.expect_fetch_order().returning(|id| Ok(Some(order(id, OrderStatusType::Pending))));
    db.expect_settle_payment().never();
    db.expect_mark_payment_failed()
        .with(eq(30))
        .times(1)
        .returning(|_| Ok(Some(payment(11, PaymentStatus::Failed, Some("order_000001")))));
    let proof = FakeGateway::sign("order_000001", "pay_other");
    let body = json!({"order_id": 11, "gateway_order_ref": "order_000001", "gateway_payment_ref": "pay_abc", "proof": proof});
    let req = request(Method::POST, "/api/verify-payment", Some(&customer_token())).set_json(body);
    let (status, body) = send(req, payment_app(db, FakeGateway::default())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("Invalid payment signature"), "was: {body}");
}

#[actix_web::test]
async fn refund_more_than_was_paid() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBackend::new();
    db.expect_fetch_payment_for_order().returning(|id| Ok(Some(payment(id, PaymentStatus::Success, Some("pay_abc")))));
    db.expect_fetch_order().returning(|id| Ok(Some(order(id, OrderStatusType::Confirmed))));
    db.expect_refund_payment().never();
    let gateway = FakeGateway::default();
    let req = request(Method::POST, "/api/refund", Some(&customer_token()))
        .set_json(json!({"order_id": 11, "amount": 29_001, "reason": "cold food"}));
    let (status, body) = send(req, payment_app(db, gateway.clone())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("cannot exceed the payment amount"), "was: {body}");
    assert_eq!(gateway.refund_count(), 0);
}

#[actix_web::test]
async fn refund() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBackend::new();
    db.expect_fetch_payment_for_order().returning(|id| Ok(Some(payment(id, PaymentStatus::Success, Some("pay_abc")))));
    db.expect_fetch_order().returning(|id| Ok(Some(order(id, OrderStatusType::Confirmed))));
    db.expect_claim_refund()
        .with(eq(30))
        .times(1)
        .returning(|_| Ok(Some(payment(11, PaymentStatus::Success, Some("pay_abc")))));
    db.expect_release_refund().never();
    db.expect_refund_payment().with(eq(30), eq("rfnd_000001")).times(1).returning(|_, r| {
        let mut o = order(11, OrderStatusType::Confirmed);
        o.payment_status = OrderPaymentStatus::Refunded;
        Ok(PaymentCommit { order: o, payment: payment(11, PaymentStatus::Refunded, Some(r)) })
    });
    let gateway = FakeGateway::default();
    let req = request(Method::POST, "/api/refund", Some(&customer_token()))
        .set_json(json!({"order_id": 11, "amount": 10_000}));
    let (status, body) = send(req, payment_app(db, gateway.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""status":"REFUNDED""#), "was: {body}");
    assert_eq!(gateway.refunds.lock().unwrap().as_slice(), &[("pay_abc".to_string(), Money::from(10_000))]);
}

#[actix_web::test]
async fn refund_already_in_progress() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBackend::new();
    db.expect_fetch_payment_for_order().returning(|id| Ok(Some(payment(id, PaymentStatus::Success, Some("pay_abc")))));
    db.expect_fetch_order().returning(|id| Ok(Some(order(id, OrderStatusType::Confirmed))));
    db.expect_claim_refund().with(eq(30)).times(1).returning(|_| Ok(None));
    db.expect_refund_payment().never();
    let gateway = FakeGateway::default();
    let req = request(Method::POST, "/api/refund", Some(&customer_token()))
        .set_json(json!({"order_id": 11, "amount": 10_000}));
    let (status, body) = send(req, payment_app(db, gateway.clone())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("already in progress"), "was: {body}");
    assert_eq!(gateway.refund_count(), 0);
}

#[actix_web::test]
async fn refund_rejected_by_gateway_releases_the_claim() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBackend::new();
    db.expect_fetch_payment_for_order().returning(|id| Ok(Some(payment(id, PaymentStatus::Success, Some("pay_abc")))));
    db.expect_fetch_order().returning(|id| Ok(Some(order(id, OrderStatusType::Confirmed))));
    db.expect_claim_refund().times(1).returning(|_| Ok(Some(payment(11, PaymentStatus::Success, Some("pay_abc")))));
    db.expect_release_refund().with(eq(30)).times(1).returning(|_| Ok(true));
    db.expect_refund_payment().never();
    let gateway = FakeGateway::default();
    gateway.set_behaviour(GatewayBehaviour::Reject);
    let req = request(Method::POST, "/api/refund", Some(&customer_token()))
        .set_json(json!({"order_id": 11, "amount": 10_000}));
    let (status, _) = send(req, payment_app(db, gateway)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[actix_web::test]
async fn payment_for_order_without_payment() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBackend::new();
    db.expect_fetch_payment_for_order().returning(|_| Ok(None));
    let req = request(Method::GET, "/api/payment/11", Some(&customer_token()));
    let (status, body) = send(req, payment_app(db, FakeGateway::default())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("There is no payment for order #11"), "was: {body}");
}

#[actix_web::test]
async fn pending_payment_carries_the_checkout_details() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBackend::new();
    db.expect_fetch_payment_for_order()
        .returning(|id| Ok(Some(payment(id, PaymentStatus::Pending, Some("order_000009")))));
    db.expect_fetch_order().returning(|id| Ok(Some(order(id, OrderStatusType::Pending))));
    let req = request(Method::GET, "/api/payment/11", Some(&customer_token()));
    let (status, body) = send(req, payment_app(db, FakeGateway::default())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""gateway_order_ref":"order_000009""#), "was: {body}");
    assert!(body.contains(r#""gateway_public_key":"rzp_test_fake""#), "was: {body}");
}
