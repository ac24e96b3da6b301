#![allow(dead_code)]
use std::time::Duration;

use food_order_engine::{
    db_types::{Money, OrderStatusType},
    events::EventProducers,
    order_objects::FullOrder,
    test_utils::{
        fake_gateway::FakeGateway,
        fixtures::{fill_cart, seed_cast, standard_cart, Cast},
        prepare_env::{prepare_test_env, random_db_path},
    },
    OrderFlowApi,
    OrderManagement,
    OrderQueryApi,
    PaymentFlowApi,
    SqliteDatabase,
};
use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};

pub struct TestSystem {
    pub url: String,
    pub db: SqliteDatabase,
    pub cast: Cast,
    pub gateway: FakeGateway,
    pub orders: OrderFlowApi<SqliteDatabase>,
    pub payments: PaymentFlowApi<SqliteDatabase, FakeGateway>,
    pub queries: OrderQueryApi<SqliteDatabase>,
}

impl TestSystem {
    pub async fn new() -> Self {
        Self::with_producers(EventProducers::default()).await
    }

    pub async fn with_producers(producers: EventProducers) -> Self {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
        let cast = seed_cast(db.pool()).await;
        let gateway = FakeGateway::default();
        let orders = OrderFlowApi::new(db.clone(), producers.clone());
        let payments = PaymentFlowApi::new(db.clone(), gateway.clone(), producers)
            .with_gateway_timeout(Duration::from_millis(250));
        let queries = OrderQueryApi::new(db.clone());
        Self { url, db, cast, gateway, orders, payments, queries }
    }

    /// Fills Alice's cart with the standard 290.00 cart and checks it out.
    pub async fn place_standard_order(&self) -> FullOrder {
        fill_cart(self.db.pool(), self.cast.customer_id, self.cast.restaurant_id, &standard_cart()).await;
        self.orders.place_order(self.cast.customer_id, self.cast.address_id).await.expect("Error placing order")
    }

    /// Places an order and walks it forward until it reaches `status`.
    pub async fn order_in_status(&self, status: OrderStatusType) -> i64 {
        let id = self.place_standard_order().await.order.id;
        let c = self.cast;
        let steps = [
            OrderStatusType::Confirmed,
            OrderStatusType::Preparing,
            OrderStatusType::OutForDelivery,
            OrderStatusType::Delivered,
        ];
        for step in steps {
            if self.status_of(id).await == status {
                break;
            }
            let result = match step {
                OrderStatusType::Confirmed => self.orders.confirm(id, c.restaurant_id).await,
                OrderStatusType::Preparing => self.orders.mark_ready(id, c.restaurant_id).await,
                OrderStatusType::OutForDelivery => self.orders.accept_delivery(id, c.courier_id).await,
                _ => self.orders.mark_delivered(id, c.courier_id).await,
            };
            result.expect("Error advancing order");
        }
        assert_eq!(self.status_of(id).await, status);
        id
    }

    pub async fn status_of(&self, order_id: i64) -> OrderStatusType {
        self.db.fetch_order(order_id).await.expect("Error fetching order").expect("Order does not exist").status
    }

    pub async fn tear_down(self) {
        self.db.pool().close().await;
        if let Err(e) = Sqlite::drop_database(&self.url).await {
            warn!("🚀️ Could not remove test database {}: {e}", self.url);
        }
    }
}

pub fn rupees(amount: i64) -> Money {
    Money::from_major(amount)
}
