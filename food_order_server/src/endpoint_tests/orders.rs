use actix_web::{
    http::{Method, StatusCode},
    web,
    web::ServiceConfig,
};
use food_order_engine::{
    db_types::{OrderLine, OrderStatusType, Role},
    events::EventProducers,
    order_objects::{FullOrder, OrderTransition},
    OrderFlowApi,
    OrderFlowError,
    OrderQueryApi,
    ProfileApi,
};
use mockall::predicate::eq;
use serde_json::json;

use super::{helpers::*, mocks::MockBackend};
use crate::routes::{
    AcceptDeliveryRoute,
    AvailableDeliveriesRoute,
    CancelOrderRoute,
    ConfirmOrderRoute,
    MyOrdersRoute,
    OrderByIdRoute,
    PlaceOrderRoute,
};

fn flow_app(db: MockBackend, profiles: ProfileApi<MockBackend>) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(OrderFlowApi::new(db, EventProducers::default())))
            .app_data(web::Data::new(profiles))
            .service(PlaceOrderRoute::<MockBackend>::new())
            .service(CancelOrderRoute::<MockBackend>::new())
            .service(ConfirmOrderRoute::<MockBackend>::new())
            .service(AcceptDeliveryRoute::<MockBackend>::new());
    }
}

fn query_app(db: MockBackend, profiles: ProfileApi<MockBackend>) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(OrderQueryApi::new(db)))
            .app_data(web::Data::new(profiles))
            .service(OrderByIdRoute::<MockBackend>::new())
            .service(MyOrdersRoute::<MockBackend>::new())
            .service(AvailableDeliveriesRoute::<MockBackend>::new());
    }
}

#[actix_web::test]
async fn place_order() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBackend::new();
    db.expect_place_order().with(eq(CUSTOMER_ID), eq(7)).times(1).returning(|_, _| {
        let line = OrderLine { id: 1, order_id: 11, menu_item_id: 101, quantity: 2, price: 12_000.into() };
        Ok(FullOrder::new(order(11, OrderStatusType::Pending), vec![line]))
    });
    let token = valid_token(&[Role::Customer]);
    let req = request(Method::POST, "/api/place-order", Some(&token)).set_json(json!({"address_id": 7}));
    let (status, body) = send(req, flow_app(db, profiles(&[(Role::Customer, CUSTOMER_ID)]))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body.contains(r#""id":11"#), "was: {body}");
    assert!(body.contains(r#""status":"PENDING""#), "was: {body}");
    assert!(body.contains(r#""menu_item_id":101"#), "was: {body}");
}

#[actix_web::test]
async fn place_order_needs_a_customer_profile() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBackend::new();
    db.expect_place_order().never();
    let token = valid_token(&[Role::Customer]);
    let req = request(Method::POST, "/api/place-order", Some(&token)).set_json(json!({"address_id": 7}));
    let (status, body) = send(req, flow_app(db, profiles(&[]))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("No customer profile exists for user user-1"), "was: {body}");
}

#[actix_web::test]
async fn empty_cart_is_a_conflict() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBackend::new();
    db.expect_place_order()
        .returning(|_, _| Err(OrderFlowError::InvalidState("The cart is empty. There is nothing to order.".into())));
    let token = valid_token(&[Role::Customer]);
    let req = request(Method::POST, "/api/place-order", Some(&token)).set_json(json!({"address_id": 7}));
    let (status, body) = send(req, flow_app(db, profiles(&[(Role::Customer, CUSTOMER_ID)]))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains(r#"{"error":"#), "was: {body}");
}

#[actix_web::test]
async fn routes_are_role_gated() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBackend::new();
    db.expect_try_transition().never();
    let token = valid_token(&[Role::Courier]);
    let req = request(Method::PUT, "/api/confirm-order/11", Some(&token));
    let (status, body) = send(req, flow_app(db, profiles(&[(Role::Courier, COURIER_ID)]))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("requires the restaurant role"), "was: {body}");
}

#[actix_web::test]
async fn confirm_order() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBackend::new();
    db.expect_try_transition()
        .with(eq(11), eq(RESTAURANT_ID), eq(OrderTransition::Confirm))
        .times(1)
        .returning(|id, _, _| Ok(Some(order(id, OrderStatusType::Confirmed))));
    let token = valid_token(&[Role::Restaurant]);
    let req = request(Method::PUT, "/api/confirm-order/11", Some(&token));
    let (status, body) = send(req, flow_app(db, profiles(&[(Role::Restaurant, RESTAURANT_ID)]))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""status":"CONFIRMED""#), "was: {body}");
}

#[actix_web::test]
async fn confirming_twice_is_a_conflict() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBackend::new();
    db.expect_try_transition().returning(|_, _, _| Ok(None));
    db.expect_fetch_order().with(eq(11)).returning(|id| Ok(Some(order(id, OrderStatusType::Confirmed))));
    let token = valid_token(&[Role::Restaurant]);
    let req = request(Method::PUT, "/api/confirm-order/11", Some(&token));
    let (status, body) = send(req, flow_app(db, profiles(&[(Role::Restaurant, RESTAURANT_ID)]))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("Order is CONFIRMED, but it must be PENDING for this action"), "was: {body}");
}

#[actix_web::test]
async fn confirming_another_restaurants_order_is_forbidden() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBackend::new();
    db.expect_try_transition().returning(|_, _, _| Ok(None));
    db.expect_fetch_order().returning(|id| Ok(Some(order(id, OrderStatusType::Pending))));
    let token = valid_token(&[Role::Restaurant]);
    let req = request(Method::PUT, "/api/confirm-order/11", Some(&token));
    let (status, _) = send(req, flow_app(db, profiles(&[(Role::Restaurant, 99)]))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn cancelling_a_missing_order_is_not_found() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBackend::new();
    db.expect_try_transition().returning(|_, _, _| Ok(None));
    db.expect_fetch_order().returning(|_| Ok(None));
    let token = valid_token(&[Role::Customer]);
    let req = request(Method::PUT, "/api/cancel-order/404", Some(&token));
    let (status, body) = send(req, flow_app(db, profiles(&[(Role::Customer, CUSTOMER_ID)]))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("The requested order #404 does not exist"), "was: {body}");
}

#[actix_web::test]
async fn accept_delivery_assigns_the_courier() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBackend::new();
    db.expect_try_transition().with(eq(11), eq(COURIER_ID), eq(OrderTransition::AcceptDelivery)).returning(
        |id, courier, _| {
            let mut o = order(id, OrderStatusType::OutForDelivery);
            o.courier_id = Some(courier);
            Ok(Some(o))
        },
    );
    let token = valid_token(&[Role::Courier]);
    let req = request(Method::PUT, "/api/accept-delivery/11", Some(&token));
    let (status, body) = send(req, flow_app(db, profiles(&[(Role::Courier, COURIER_ID)]))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""status":"OUT_FOR_DELIVERY""#), "was: {body}");
    assert!(body.contains(r#""courier_id":4"#), "was: {body}");
}

#[actix_web::test]
async fn order_is_found_through_any_role() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBackend::new();
    db.expect_fetch_order().returning(|id| Ok(Some(order(id, OrderStatusType::Preparing))));
    db.expect_fetch_order_lines().returning(|_| Ok(vec![]));
    // user-1 is a customer, but not the one who placed this order. As a courier, they may pick it up.
    let token = valid_token(&[Role::Customer, Role::Courier]);
    let req = request(Method::GET, "/api/orders/11", Some(&token));
    let (status, body) =
        send(req, query_app(db, profiles(&[(Role::Customer, 55), (Role::Courier, COURIER_ID)]))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""status":"PREPARING""#), "was: {body}");
}

#[actix_web::test]
async fn order_is_hidden_from_strangers() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBackend::new();
    db.expect_fetch_order().returning(|id| Ok(Some(order(id, OrderStatusType::Pending))));
    db.expect_fetch_order_lines().never();
    let token = valid_token(&[Role::Customer, Role::Courier]);
    let req = request(Method::GET, "/api/orders/11", Some(&token));
    let (status, _) = send(req, query_app(db, profiles(&[(Role::Customer, 55), (Role::Courier, COURIER_ID)]))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn my_orders_are_scoped_to_the_customer() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBackend::new();
    db.expect_search_orders()
        .withf(|f| {
            f.customer_id == Some(CUSTOMER_ID) &&
                f.restaurant_id.is_none() &&
                f.status == Some(OrderStatusType::Pending) &&
                f.page == Some(1)
        })
        .times(1)
        .returning(|_| Ok(vec![order(11, OrderStatusType::Pending), order(10, OrderStatusType::Pending)]));
    let token = valid_token(&[Role::Customer]);
    let req = request(Method::GET, "/api/my-orders?status=PENDING&page=1", Some(&token));
    let (status, body) = send(req, query_app(db, profiles(&[(Role::Customer, CUSTOMER_ID)]))).await;
    assert_eq!(status, StatusCode::OK);
    let orders: Vec<serde_json::Value> = serde_json::from_str(&body).unwrap();
    assert_eq!(orders.len(), 2);
}

#[actix_web::test]
async fn available_deliveries() {
    let _ = env_logger::try_init().ok();
    let mut db = MockBackend::new();
    db.expect_search_orders()
        .withf(|f| f.status == Some(OrderStatusType::Preparing) && f.unassigned && f.courier_id.is_none())
        .returning(|_| Ok(vec![order(12, OrderStatusType::Preparing)]));
    let token = valid_token(&[Role::Courier]);
    let req = request(Method::GET, "/api/available-deliveries", Some(&token));
    let (status, body) = send(req, query_app(db, profiles(&[]))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""id":12"#), "was: {body}");
}
