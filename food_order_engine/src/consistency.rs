//! Cross-cutting invariants shared by the order state machine and the payment flow.
//!
//! The central rule is that a paid order is never cancelled: `payment_status == PAID` implies `status != CANCELLED`.
//! Both sides of a race between `cancel` and `verify_payment` are conditional updates that re-check this rule in the
//! database (and the `orders` table carries a `CHECK` constraint for it), so whichever write comes second is refused.
//! The functions here state the same rules in code. The API layer checks them before a mutation, and the SQLite
//! backend checks the new state before it commits.
use log::error;

use crate::{
    db_types::{Money, Order, OrderPaymentStatus, OrderStatusType, Payment, PaymentStatus},
    traits::{OrderFlowError, PaymentCommit},
};

/// Fails if the order is in a state that should be unreachable.
pub fn check_order(order: &Order) -> Result<(), OrderFlowError> {
    if order.payment_status == OrderPaymentStatus::Paid && order.status == OrderStatusType::Cancelled {
        error!("🛡️ Order #{} is both PAID and CANCELLED. This should be impossible.", order.id);
        return Err(OrderFlowError::InvalidState(format!("Order #{} is paid but cancelled", order.id)));
    }
    Ok(())
}

/// An order can only be cancelled if it has not been paid for.
pub fn check_can_cancel(order: &Order) -> Result<(), OrderFlowError> {
    if order.payment_status == OrderPaymentStatus::Paid {
        return Err(OrderFlowError::InvalidState(format!(
            "Order #{} has been paid and cannot be cancelled. Request a refund instead.",
            order.id
        )));
    }
    Ok(())
}

/// Payments can only be opened or settled for orders that are not cancelled.
pub fn check_can_take_payment(order: &Order) -> Result<(), OrderFlowError> {
    if order.status == OrderStatusType::Cancelled {
        return Err(OrderFlowError::InvalidState(format!("Order #{} has been cancelled", order.id)));
    }
    Ok(())
}

/// A refund must be positive and may not exceed the amount that was paid.
pub fn check_refund_amount(payment: &Payment, amount: Money) -> Result<(), OrderFlowError> {
    if amount <= Money::default() {
        return Err(OrderFlowError::InvalidState(format!("Refund amount must be positive, not {amount}")));
    }
    if amount > payment.amount {
        return Err(OrderFlowError::InvalidState(format!(
            "Refund amount {amount} cannot exceed the payment amount {}",
            payment.amount
        )));
    }
    Ok(())
}

/// Checks that a payment commit left the order and the payment in agreement.
pub fn check_commit(commit: &PaymentCommit) -> Result<(), OrderFlowError> {
    let PaymentCommit { order, payment } = commit;
    check_order(order)?;
    let agrees = payment.order_id == order.id &&
        payment.amount == order.total_amount &&
        match payment.status {
            PaymentStatus::Success => order.payment_status == OrderPaymentStatus::Paid,
            PaymentStatus::Refunded => order.payment_status == OrderPaymentStatus::Refunded,
            PaymentStatus::Pending | PaymentStatus::Failed => order.payment_status != OrderPaymentStatus::Paid,
        };
    if !agrees {
        error!(
            "🛡️ Payment #{} ({}, {}) disagrees with order #{} ({}, {})",
            payment.id, payment.status, payment.amount, order.id, order.payment_status, order.total_amount
        );
        return Err(OrderFlowError::InvalidState(format!(
            "Payment #{} is inconsistent with order #{}",
            payment.id, order.id
        )));
    }
    Ok(())
}
