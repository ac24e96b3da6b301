use std::time::Duration;

use cucumber::World;
use food_order_engine::{
    events::EventProducers,
    test_utils::{
        fake_gateway::FakeGateway,
        fixtures::{seed_cast, Cast},
        prepare_env::{create_database, random_db_path, run_migrations},
    },
    OrderFlowApi,
    OrderFlowError,
    PaymentFlowApi,
    SqliteDatabase,
};
use log::*;

#[derive(Default, Debug, World)]
pub struct FoodWorld {
    pub system: Option<FoodOrderSystem>,
    pub order_id: Option<i64>,
    pub payment_ids: Vec<i64>,
    pub gateway_order_ref: Option<String>,
    pub last_error: Option<OrderFlowError>,
}

#[derive(Debug)]
pub struct FoodOrderSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub cast: Cast,
    pub gateway: FakeGateway,
    pub orders: OrderFlowApi<SqliteDatabase>,
    pub payments: PaymentFlowApi<SqliteDatabase, FakeGateway>,
}

impl FoodWorld {
    pub fn system(&self) -> &FoodOrderSystem {
        self.system.as_ref().expect("FoodOrderSystem not initialised")
    }

    pub fn order_id(&self) -> i64 {
        self.order_id.expect("No order has been placed")
    }

    /// Records the outcome of an action, so that a later step can check the error.
    pub fn record<T>(&mut self, result: Result<T, OrderFlowError>) -> Option<T> {
        match result {
            Ok(v) => {
                self.last_error = None;
                Some(v)
            },
            Err(e) => {
                debug!("🥒️ Action failed: {e}");
                self.last_error = Some(e);
                None
            },
        }
    }
}

impl FoodOrderSystem {
    pub async fn new() -> Self {
        let db_path = random_db_path();
        create_database(&db_path).await;
        run_migrations(&db_path).await;
        let db = SqliteDatabase::new_with_url(&db_path, 2).await.expect("Error creating connection to database");
        debug!("Created database: {db_path}");
        let cast = seed_cast(db.pool()).await;
        let gateway = FakeGateway::default();
        let orders = OrderFlowApi::new(db.clone(), EventProducers::default());
        let payments = PaymentFlowApi::new(db.clone(), gateway.clone(), EventProducers::default())
            .with_gateway_timeout(Duration::from_millis(500));
        Self { db_path, db, cast, gateway, orders, payments }
    }
}
