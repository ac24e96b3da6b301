use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Actor, CartSnapshot, Order, OrderStatusType},
    order_objects::{FullOrder, OrderQueryFilter},
    traits::{CartSnapshots, OrderFlowError, OrderManagement},
};

/// Read-only queries over orders and carts, scoped to the actor making the request.
pub struct OrderQueryApi<B> {
    db: B,
}

impl<B> Debug for OrderQueryApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderQueryApi")
    }
}

impl<B> OrderQueryApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

/// Customers see their own orders, restaurants see orders placed with them, and couriers see orders assigned to them
/// as well as the orders that are waiting for a courier.
pub fn order_is_visible_to(order: &Order, actor: Actor) -> bool {
    match actor {
        Actor::Customer(id) => order.customer_id == id,
        Actor::Restaurant(id) => order.restaurant_id == id,
        Actor::Courier(id) => {
            order.courier_id == Some(id) || (order.courier_id.is_none() && order.status == OrderStatusType::Preparing)
        },
    }
}

impl<B> OrderQueryApi<B>
where B: OrderManagement
{
    pub async fn fetch_order(&self, order_id: i64, actor: Actor) -> Result<FullOrder, OrderFlowError> {
        let order = self.db.fetch_order(order_id).await?.ok_or(OrderFlowError::OrderNotFound(order_id))?;
        if !order_is_visible_to(&order, actor) {
            debug!("🔍️ {actor} tried to view order #{order_id}");
            return Err(OrderFlowError::Forbidden(format!("Order #{order_id} is not visible to {actor}")));
        }
        let lines = self.db.fetch_order_lines(order_id).await?;
        Ok(FullOrder::new(order, lines))
    }

    /// The actor's own orders, most recent first. Any scoping fields in `filter` are replaced by the actor's id.
    pub async fn orders_for(&self, actor: Actor, filter: OrderQueryFilter) -> Result<Vec<Order>, OrderFlowError> {
        let filter = OrderQueryFilter { customer_id: None, restaurant_id: None, courier_id: None, ..filter };
        let filter = match actor {
            Actor::Customer(id) => filter.with_customer_id(id),
            Actor::Restaurant(id) => filter.with_restaurant_id(id),
            Actor::Courier(id) => filter.with_courier_id(id),
        };
        trace!("🔍️ Fetching orders for {actor}: {filter}");
        self.db.search_orders(filter).await
    }

    /// Orders that are being prepared and do not have a courier yet.
    pub async fn available_for_delivery(
        &self,
        page: Option<u32>,
        page_size: Option<u32>,
    ) -> Result<Vec<Order>, OrderFlowError> {
        let filter = OrderQueryFilter { page, page_size, ..Default::default() }
            .with_status(OrderStatusType::Preparing)
            .unassigned();
        self.db.search_orders(filter).await
    }
}

impl<B> OrderQueryApi<B>
where B: CartSnapshots
{
    pub async fn cart_snapshot(&self, customer_id: i64) -> Result<Option<CartSnapshot>, OrderFlowError> {
        self.db.fetch_cart_snapshot(customer_id).await
    }
}
