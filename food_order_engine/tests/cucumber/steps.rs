use cucumber::{then, when};
use food_order_engine::{
    db_types::{Money, OrderPaymentStatus, OrderStatusType, PaymentMethod, PaymentStatus},
    payment_objects::{CreatePaymentRequest, RefundRequest, VerifyPaymentRequest},
    test_utils::fake_gateway::FakeGateway,
    CartSnapshots,
    ErrorKind,
    OrderManagement,
    PaymentManagement,
};

use crate::cucumber::FoodWorld;

#[when("the customer places the order")]
async fn place_order(world: &mut FoodWorld) {
    let sys = world.system();
    let result = sys.orders.place_order(sys.cast.customer_id, sys.cast.address_id).await;
    if let Some(order) = world.record(result) {
        world.order_id = Some(order.order.id);
    }
}

#[when("the restaurant confirms the order")]
async fn confirm_order(world: &mut FoodWorld) {
    let sys = world.system();
    let result = sys.orders.confirm(world.order_id(), sys.cast.restaurant_id).await;
    world.record(result);
}

#[when("the customer cancels the order")]
async fn cancel_order(world: &mut FoodWorld) {
    let sys = world.system();
    let result = sys.orders.cancel(world.order_id(), sys.cast.customer_id).await;
    world.record(result);
}

#[when("the customer opens a payment for the order")]
async fn open_payment(world: &mut FoodWorld) {
    let sys = world.system();
    let request = CreatePaymentRequest { order_id: world.order_id(), method: PaymentMethod::Upi };
    let result = sys.payments.create_payment_order(sys.cast.customer_id, request).await;
    if let Some(opened) = world.record(result) {
        world.payment_ids.push(opened.payment_id);
        world.gateway_order_ref = Some(opened.gateway_order_ref);
    }
}

async fn verify(world: &mut FoodWorld, tamper: bool) {
    let sys = world.system();
    let gateway_order_ref = world.gateway_order_ref.clone().expect("No gateway order has been opened");
    let mut proof = FakeGateway::sign(&gateway_order_ref, "pay_cuke");
    if tamper {
        proof = proof.chars().rev().collect();
    }
    let request = VerifyPaymentRequest {
        order_id: world.order_id(),
        gateway_order_ref,
        gateway_payment_ref: "pay_cuke".into(),
        proof,
    };
    let result = sys.payments.verify_payment(sys.cast.customer_id, request).await;
    world.record(result);
}

#[when("the customer pays with a valid proof")]
async fn pay_valid(world: &mut FoodWorld) {
    verify(world, false).await;
}

#[when("the customer pays with a tampered proof")]
async fn pay_tampered(world: &mut FoodWorld) {
    verify(world, true).await;
}

#[when(expr = "the customer requests a refund of {word}")]
async fn request_refund(world: &mut FoodWorld, amount: String) {
    let sys = world.system();
    let amount = amount.parse::<Money>().expect("Invalid amount");
    let request = RefundRequest { order_id: world.order_id(), amount, reason: Some("customer request".into()) };
    let result = sys.payments.process_refund(sys.cast.customer_id, request).await;
    world.record(result);
}

#[then("the action succeeds")]
async fn action_succeeds(world: &mut FoodWorld) {
    assert!(world.last_error.is_none(), "Expected success, got {:?}", world.last_error);
}

#[then(expr = "the action fails with {word}")]
async fn action_fails(world: &mut FoodWorld, kind: String) {
    let err = world.last_error.as_ref().expect("Expected the last action to fail");
    let expected = match kind.as_str() {
        "NotFound" => ErrorKind::NotFound,
        "Forbidden" => ErrorKind::Forbidden,
        "InvalidState" => ErrorKind::InvalidState,
        "ExternalFailure" => ErrorKind::ExternalFailure,
        other => panic!("Unknown error kind {other}"),
    };
    assert_eq!(err.kind(), expected, "Unexpected error: {err}");
}

#[then(expr = "the order total is {word}")]
async fn order_total(world: &mut FoodWorld, total: String) {
    let order = world.system().db.fetch_order(world.order_id()).await.unwrap().expect("Order does not exist");
    assert_eq!(order.total_amount.to_string(), total);
}

#[then(expr = "the order status is {word}")]
async fn order_status(world: &mut FoodWorld, status: String) {
    let order = world.system().db.fetch_order(world.order_id()).await.unwrap().expect("Order does not exist");
    assert_eq!(order.status, status.parse::<OrderStatusType>().unwrap());
}

#[then(expr = "the order payment status is {word}")]
async fn order_payment_status(world: &mut FoodWorld, status: String) {
    let order = world.system().db.fetch_order(world.order_id()).await.unwrap().expect("Order does not exist");
    assert_eq!(order.payment_status, status.parse::<OrderPaymentStatus>().unwrap());
}

#[then(expr = "the order has {int} lines")]
async fn order_lines(world: &mut FoodWorld, count: usize) {
    let lines = world.system().db.fetch_order_lines(world.order_id()).await.unwrap();
    assert_eq!(lines.len(), count);
}

#[then("the customer's cart is empty")]
async fn cart_is_empty(world: &mut FoodWorld) {
    let sys = world.system();
    let cart = sys.db.fetch_cart_snapshot(sys.cast.customer_id).await.unwrap();
    assert!(cart.map(|c| c.is_empty()).unwrap_or(true));
}

#[then(expr = "the payment status is {word}")]
async fn payment_status(world: &mut FoodWorld, status: String) {
    let payment = world.system().db.fetch_payment_for_order(world.order_id()).await.unwrap().expect("No payment");
    assert_eq!(payment.status, status.parse::<PaymentStatus>().unwrap());
}

#[then(expr = "the payment amount is {word}")]
async fn payment_amount(world: &mut FoodWorld, amount: String) {
    let payment = world.system().db.fetch_payment_for_order(world.order_id()).await.unwrap().expect("No payment");
    assert_eq!(payment.amount.to_string(), amount);
}

#[then("every payment order used the same payment")]
async fn same_payment(world: &mut FoodWorld) {
    assert!(world.payment_ids.len() > 1, "Expected more than one payment order");
    assert!(world.payment_ids.windows(2).all(|w| w[0] == w[1]), "Payment ids differ: {:?}", world.payment_ids);
}

#[then(expr = "the gateway issued {int} refund(s)")]
async fn gateway_refunds(world: &mut FoodWorld, count: usize) {
    assert_eq!(world.system().gateway.refund_count(), count);
}
