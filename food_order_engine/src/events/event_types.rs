use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderStatusType, Payment, PaymentStatus};

/// Emitted after an order status transition has been committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusChangedEvent {
    pub old_status: OrderStatusType,
    pub order: Order,
}

impl OrderStatusChangedEvent {
    pub fn new(old_status: OrderStatusType, order: Order) -> Self {
        Self { old_status, order }
    }
}

/// Emitted after a payment status change has been committed. For settlements and refunds, `order` carries the order
/// as it was left by the same commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentStatusChangedEvent {
    pub old_status: Option<PaymentStatus>,
    pub payment: Payment,
    pub order: Option<Order>,
}

impl PaymentStatusChangedEvent {
    pub fn new(old_status: Option<PaymentStatus>, payment: Payment) -> Self {
        Self { old_status, payment, order: None }
    }

    pub fn with_order(mut self, order: Order) -> Self {
        self.order = Some(order);
        self
    }
}
