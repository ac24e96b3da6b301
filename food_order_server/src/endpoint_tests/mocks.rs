use food_order_engine::{
    db_types::{CartSnapshot, Order, OrderLine, Payment, PaymentMethod, Role},
    order_objects::{FullOrder, OrderQueryFilter, OrderTransition},
    traits::PaymentCommit,
    CartSnapshots,
    OrderFlowError,
    OrderManagement,
    PaymentManagement,
    ProfileDirectory,
};
use mockall::mock;

mock! {
    pub Backend {}
    impl Clone for Backend {
        fn clone(&self) -> Self;
    }
    impl OrderManagement for Backend {
        fn url(&self) -> &str;
        async fn place_order(&self, customer_id: i64, address_id: i64) -> Result<FullOrder, OrderFlowError>;
        async fn try_transition(&self, order_id: i64, actor_id: i64, transition: OrderTransition) -> Result<Option<Order>, OrderFlowError>;
        async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, OrderFlowError>;
        async fn fetch_order_lines(&self, order_id: i64) -> Result<Vec<OrderLine>, OrderFlowError>;
        async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderFlowError>;
    }
    impl PaymentManagement for Backend {
        async fn fetch_payment_for_order(&self, order_id: i64) -> Result<Option<Payment>, OrderFlowError>;
        async fn open_payment(&self, order: &Order, method: PaymentMethod) -> Result<Option<Payment>, OrderFlowError>;
        async fn attach_gateway_reference(&self, payment_id: i64, gateway_order_ref: &str) -> Result<Option<Payment>, OrderFlowError>;
        async fn mark_payment_failed(&self, payment_id: i64) -> Result<Option<Payment>, OrderFlowError>;
        async fn settle_payment(&self, payment_id: i64, gateway_payment_ref: &str) -> Result<PaymentCommit, OrderFlowError>;
        async fn claim_refund(&self, payment_id: i64) -> Result<Option<Payment>, OrderFlowError>;
        async fn release_refund(&self, payment_id: i64) -> Result<bool, OrderFlowError>;
        async fn refund_payment(&self, payment_id: i64, refund_ref: &str) -> Result<PaymentCommit, OrderFlowError>;
    }
    impl CartSnapshots for Backend {
        async fn fetch_cart_snapshot(&self, customer_id: i64) -> Result<Option<CartSnapshot>, OrderFlowError>;
    }
    impl ProfileDirectory for Backend {
        async fn fetch_profile_id(&self, role: Role, user_id: &str) -> Result<Option<i64>, OrderFlowError>;
    }
}
