use crate::{
    db_types::{Order, Payment, PaymentMethod},
    traits::{data_objects::PaymentCommit, OrderFlowError},
};

/// Backend behaviour for the payment record attached to an order.
///
/// There is at most one payment per order. Its amount is copied from the order total when it is created and never
/// changes afterwards.
#[allow(async_fn_in_trait)]
pub trait PaymentManagement: Clone {
    async fn fetch_payment_for_order(&self, order_id: i64) -> Result<Option<Payment>, OrderFlowError>;

    /// Creates a `PENDING` payment for the order, or resets the existing unsettled (`PENDING` or `FAILED`) payment to
    /// `PENDING`. Returns `None` if the order already has a settled payment.
    async fn open_payment(&self, order: &Order, method: PaymentMethod) -> Result<Option<Payment>, OrderFlowError>;

    /// Stores the gateway order reference against a `PENDING` payment. Returns `None` if the payment is no longer
    /// pending.
    async fn attach_gateway_reference(
        &self,
        payment_id: i64,
        gateway_order_ref: &str,
    ) -> Result<Option<Payment>, OrderFlowError>;

    /// Marks an unsettled payment as `FAILED`. Returns `None` if the payment has been settled in the meantime.
    async fn mark_payment_failed(&self, payment_id: i64) -> Result<Option<Payment>, OrderFlowError>;

    /// Atomically marks the payment as `SUCCESS`, records the gateway payment reference, and marks the order as `PAID`.
    ///
    /// Fails with `InvalidState` (and changes nothing) if the payment has already been settled, or if the order has
    /// been cancelled.
    async fn settle_payment(&self, payment_id: i64, gateway_payment_ref: &str) -> Result<PaymentCommit, OrderFlowError>;

    /// Takes the refund claim on a `SUCCESS` payment. At most one refund can hold the claim at a time. Returns `None`
    /// if the payment is not `SUCCESS` or is already claimed.
    async fn claim_refund(&self, payment_id: i64) -> Result<Option<Payment>, OrderFlowError>;

    /// Releases the refund claim after the gateway refused or failed to process the refund.
    async fn release_refund(&self, payment_id: i64) -> Result<bool, OrderFlowError>;

    /// Atomically marks a claimed `SUCCESS` payment as `REFUNDED`, records the refund reference, and marks the order
    /// as `REFUNDED`.
    async fn refund_payment(&self, payment_id: i64, refund_ref: &str) -> Result<PaymentCommit, OrderFlowError>;
}
