use crate::{
    db_types::{Order, OrderLine},
    order_objects::{FullOrder, OrderQueryFilter, OrderTransition},
    traits::OrderFlowError,
};

/// Backend behaviour for creating orders and moving them through their lifecycle.
///
/// Every method that changes an order is atomic. Status changes are conditional updates that only succeed if the order
/// is still in the expected pre-state, so that of two racing requests exactly one wins.
#[allow(async_fn_in_trait)]
pub trait OrderManagement: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Converts the customer's cart into a new `PENDING` order, delivering to `address_id`.
    ///
    /// In a single atomic transaction, the cart is locked and read, the order and its lines are inserted, and the
    /// cart is drained. A concurrent checkout of the same cart will see an empty cart and fail with `InvalidState`.
    async fn place_order(&self, customer_id: i64, address_id: i64) -> Result<FullOrder, OrderFlowError>;

    /// Attempts the status change described by `transition` on behalf of the actor with profile id `actor_id`.
    ///
    /// Returns `None` if the order does not exist, does not belong to the actor, or is not in the required pre-state.
    /// The caller is responsible for working out which of these was the case.
    async fn try_transition(
        &self,
        order_id: i64,
        actor_id: i64,
        transition: OrderTransition,
    ) -> Result<Option<Order>, OrderFlowError>;

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, OrderFlowError>;

    /// The lines for the order, in the order they were inserted.
    async fn fetch_order_lines(&self, order_id: i64) -> Result<Vec<OrderLine>, OrderFlowError>;

    /// Orders matching the filter, most recent first.
    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderFlowError>;
}
