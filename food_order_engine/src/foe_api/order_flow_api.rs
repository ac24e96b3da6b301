use std::fmt::Debug;

use log::*;

use crate::{
    db_types::Order,
    events::{EventProducers, OrderStatusChangedEvent},
    order_objects::{FullOrder, OrderTransition},
    traits::{OrderFlowError, OrderManagement},
};

/// `OrderFlowApi` is the primary API for creating orders and moving them through their lifecycle.
///
/// Each transition is applied as a single conditional update in the backend. When the update does not match, the
/// order is re-read to report *why*: `OrderNotFound`, `Forbidden` (not the actor's order) or `InvalidStatus` (the
/// order is not in the required state), in that order of precedence.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}

impl<B> OrderFlowApi<B>
where B: OrderManagement
{
    /// Converts the customer's cart into a new order for delivery to `address_id`.
    ///
    /// The cart is drained atomically with the creation of the order. Fails with `InvalidState` if the cart is empty
    /// or not bound to a restaurant, and `AddressNotFound` if the address does not belong to the customer.
    pub async fn place_order(&self, customer_id: i64, address_id: i64) -> Result<FullOrder, OrderFlowError> {
        trace!("🔄️📦️ Customer #{customer_id} is checking out");
        let order = self.db.place_order(customer_id, address_id).await?;
        info!(
            "🔄️📦️ Order #{} placed by customer #{customer_id} for {} ({} lines)",
            order.order.id,
            order.order.total_amount,
            order.lines.len()
        );
        Ok(order)
    }

    /// The customer cancels a `PENDING`, unpaid order.
    pub async fn cancel(&self, order_id: i64, customer_id: i64) -> Result<Order, OrderFlowError> {
        self.transition(order_id, customer_id, OrderTransition::Cancel).await
    }

    /// The restaurant accepts a `PENDING` order.
    pub async fn confirm(&self, order_id: i64, restaurant_id: i64) -> Result<Order, OrderFlowError> {
        self.transition(order_id, restaurant_id, OrderTransition::Confirm).await
    }

    /// The restaurant starts preparing a `CONFIRMED` order, which makes it available to couriers.
    pub async fn mark_ready(&self, order_id: i64, restaurant_id: i64) -> Result<Order, OrderFlowError> {
        self.transition(order_id, restaurant_id, OrderTransition::MarkReady).await
    }

    /// A courier claims a `PREPARING` order. At most one courier can ever win this race.
    pub async fn accept_delivery(&self, order_id: i64, courier_id: i64) -> Result<Order, OrderFlowError> {
        self.transition(order_id, courier_id, OrderTransition::AcceptDelivery).await
    }

    /// The assigned courier hands the order over.
    pub async fn mark_delivered(&self, order_id: i64, courier_id: i64) -> Result<Order, OrderFlowError> {
        self.transition(order_id, courier_id, OrderTransition::MarkDelivered).await
    }

    async fn transition(
        &self,
        order_id: i64,
        actor_id: i64,
        transition: OrderTransition,
    ) -> Result<Order, OrderFlowError> {
        let role = transition.actor_role();
        trace!("🔄️🚦️ {role} #{actor_id} requests '{transition}' on order #{order_id}");
        match self.db.try_transition(order_id, actor_id, transition).await? {
            Some(order) => {
                info!("🔄️🚦️ Order #{order_id} is now {} ({transition} by {role} #{actor_id})", order.status);
                let event = OrderStatusChangedEvent::new(transition.required_status(), order.clone());
                self.producers.publish_order_status_changed(event).await;
                Ok(order)
            },
            None => {
                let order = self.db.fetch_order(order_id).await?.ok_or(OrderFlowError::OrderNotFound(order_id))?;
                let err = match transition.check(&order, actor_id) {
                    Err(e) => e,
                    // The order looks fine now, so it changed between the update and the re-read
                    Ok(()) => OrderFlowError::InvalidState(format!(
                        "Order #{order_id} was modified concurrently. Please try again."
                    )),
                };
                debug!("🔄️🚦️ '{transition}' on order #{order_id} by {role} #{actor_id} refused. {err}");
                Err(err)
            },
        }
    }
}
