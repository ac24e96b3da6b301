use std::{fmt::Debug, future::Future, time::Duration};

use log::*;

use crate::{
    consistency,
    db_types::{Order, Payment, PaymentStatus},
    events::{EventProducers, PaymentStatusChangedEvent},
    payment_objects::{CreatePaymentRequest, PaymentOrderResponse, PaymentResponse, RefundRequest, VerifyPaymentRequest},
    traits::{GatewayError, OpenTransaction, OrderFlowError, OrderManagement, PaymentGateway, PaymentManagement},
};

pub const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_secs(15);

/// `PaymentFlowApi` reconciles payments taken by the external gateway with the orders they pay for.
///
/// Every gateway call is bounded by a timeout. A gateway failure or timeout never changes any local state other than
/// the payment status itself, and the caller is free to retry.
///
/// The rule that ties the two state machines together is that a paid order is never cancelled. Settlement marks the
/// payment `SUCCESS` and the order `PAID` in one commit, and that commit is refused if the order has been cancelled.
pub struct PaymentFlowApi<B, G> {
    db: B,
    gateway: G,
    producers: EventProducers,
    gateway_timeout: Duration,
}

impl<B, G> Debug for PaymentFlowApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentFlowApi (gateway timeout: {:?})", self.gateway_timeout)
    }
}

impl<B, G> PaymentFlowApi<B, G> {
    pub fn new(db: B, gateway: G, producers: EventProducers) -> Self {
        Self { db, gateway, producers, gateway_timeout: DEFAULT_GATEWAY_TIMEOUT }
    }

    pub fn with_gateway_timeout(mut self, timeout: Duration) -> Self {
        self.gateway_timeout = timeout;
        self
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }
}

impl<B, G> PaymentFlowApi<B, G>
where
    B: OrderManagement + PaymentManagement,
    G: PaymentGateway,
{
    /// Opens (or re-opens) the payment for an order and creates a matching transaction on the gateway.
    ///
    /// Repeated calls while the payment is unsettled return the same payment, with a fresh gateway reference.
    pub async fn create_payment_order(
        &self,
        customer_id: i64,
        request: CreatePaymentRequest,
    ) -> Result<PaymentOrderResponse, OrderFlowError> {
        let CreatePaymentRequest { order_id, method } = request;
        let existing = self.db.fetch_payment_for_order(order_id).await?;
        if let Some(p) = existing.as_ref().filter(|p| p.status == PaymentStatus::Success) {
            return Err(OrderFlowError::InvalidState(format!(
                "Payment #{} for order #{order_id} has already been completed",
                p.id
            )));
        }
        let order = self.customer_order(order_id, customer_id).await?;
        consistency::check_can_take_payment(&order)?;
        let old_status = existing.as_ref().map(|p| p.status);
        if old_status == Some(PaymentStatus::Refunded) {
            return Err(OrderFlowError::InvalidState(format!("The payment for order #{order_id} has been refunded")));
        }
        let payment = self.db.open_payment(&order, method).await?.ok_or_else(|| {
            OrderFlowError::InvalidState(format!("The payment for order #{order_id} has already been settled"))
        })?;
        if old_status != Some(payment.status) {
            self.publish(old_status, payment.clone(), None).await;
        }
        debug!("💳️ Payment #{} for order #{order_id} is open. Opening a gateway transaction.", payment.id);
        let transaction = OpenTransaction {
            amount: payment.amount,
            receipt: format!("order_{order_id}"),
            notes: vec![
                ("order_id".to_string(), order_id.to_string()),
                ("payment_id".to_string(), payment.id.to_string()),
            ],
        };
        let gateway_ref = self.call_gateway(self.gateway.open_transaction(transaction)).await.map_err(|e| {
            warn!("💳️ Could not open a gateway transaction for payment #{}. {e}", payment.id);
            e
        })?;
        let payment = self.db.attach_gateway_reference(payment.id, &gateway_ref).await?.ok_or_else(|| {
            OrderFlowError::InvalidState(format!(
                "Payment #{} changed while the gateway transaction was being opened",
                payment.id
            ))
        })?;
        info!("💳️ Gateway transaction {gateway_ref} opened for payment #{} ({})", payment.id, payment.amount);
        Ok(PaymentOrderResponse {
            payment_id: payment.id,
            gateway_order_ref: gateway_ref,
            gateway_public_key: self.gateway.public_key().to_string(),
            amount: payment.amount,
            currency: self.gateway.currency().to_string(),
        })
    }

    /// Checks the gateway's proof of capture and, if it is valid, settles the payment and marks the order paid.
    ///
    /// An invalid proof marks the payment `FAILED`. The customer can open a new gateway transaction and try again.
    pub async fn verify_payment(
        &self,
        customer_id: i64,
        request: VerifyPaymentRequest,
    ) -> Result<PaymentResponse, OrderFlowError> {
        let order_id = request.order_id;
        let payment =
            self.db.fetch_payment_for_order(order_id).await?.ok_or(OrderFlowError::PaymentNotFound(order_id))?;
        self.customer_order(order_id, customer_id).await?;
        match payment.status {
            PaymentStatus::Success => {
                return Err(OrderFlowError::InvalidState(format!("Payment #{} has already been verified", payment.id)))
            },
            PaymentStatus::Refunded => {
                return Err(OrderFlowError::InvalidState(format!("Payment #{} has been refunded", payment.id)))
            },
            PaymentStatus::Pending | PaymentStatus::Failed => {},
        }
        let signature_valid = match self.gateway.verify_signature(
            &request.gateway_order_ref,
            &request.gateway_payment_ref,
            &request.proof,
        ) {
            Ok(valid) => valid,
            Err(e) => {
                self.fail_payment(&payment).await?;
                return Err(e.into());
            },
        };
        let reference_matches = payment.transaction_id.as_deref() == Some(request.gateway_order_ref.as_str());
        if !(signature_valid && reference_matches) {
            warn!(
                "💳️ Payment #{} for order #{order_id} failed verification (signature valid: {signature_valid}, \
                 reference matches: {reference_matches})",
                payment.id
            );
            self.fail_payment(&payment).await?;
            return Err(OrderFlowError::InvalidState("Invalid payment signature".into()));
        }
        let commit = self.db.settle_payment(payment.id, &request.gateway_payment_ref).await?;
        info!("💳️ Payment #{} verified. Order #{order_id} is {}", commit.payment.id, commit.order.payment_status);
        self.publish(Some(payment.status), commit.payment.clone(), Some(commit.order)).await;
        Ok(PaymentResponse::new(commit.payment, self.gateway.public_key()))
    }

    /// Refunds a successful payment, in full or in part, through the gateway.
    ///
    /// Any refund, partial or full, moves the payment to `REFUNDED` and the order's payment status to `REFUNDED`.
    /// The payment is claimed before the gateway is called, so concurrent refund requests for the same payment cannot
    /// both reach the gateway. The claim is released if the gateway call fails.
    pub async fn process_refund(
        &self,
        customer_id: i64,
        request: RefundRequest,
    ) -> Result<PaymentResponse, OrderFlowError> {
        let RefundRequest { order_id, amount, reason } = request;
        let payment =
            self.db.fetch_payment_for_order(order_id).await?.ok_or(OrderFlowError::PaymentNotFound(order_id))?;
        self.customer_order(order_id, customer_id).await?;
        if payment.status != PaymentStatus::Success {
            return Err(OrderFlowError::InvalidState(format!(
                "Only successful payments can be refunded. Payment #{} is {}",
                payment.id, payment.status
            )));
        }
        consistency::check_refund_amount(&payment, amount)?;
        let transaction_ref = payment.transaction_id.clone().ok_or_else(|| {
            OrderFlowError::InvalidState(format!("Payment #{} has no gateway transaction to refund", payment.id))
        })?;
        if self.db.claim_refund(payment.id).await?.is_none() {
            return Err(OrderFlowError::InvalidState(format!(
                "A refund for payment #{} is already in progress or has been completed",
                payment.id
            )));
        }
        let refund = self.call_gateway(self.gateway.refund(&transaction_ref, amount, reason.as_deref())).await;
        let refund_ref = match refund {
            Ok(refund_ref) => refund_ref,
            Err(e) => {
                warn!("💳️ The gateway did not refund payment #{}. Releasing the refund claim. {e}", payment.id);
                if let Err(release_err) = self.db.release_refund(payment.id).await {
                    error!("💳️ Could not release the refund claim on payment #{}. {release_err}", payment.id);
                }
                return Err(e);
            },
        };
        let commit = match self.db.refund_payment(payment.id, &refund_ref).await {
            Ok(commit) => commit,
            Err(e) => {
                error!(
                    "💳️ The gateway issued refund {refund_ref} of {amount} for payment #{}, but it could not be \
                     recorded. {e}",
                    payment.id
                );
                return Err(e);
            },
        };
        info!("💳️ Refunded {amount} of payment #{} (ref: {refund_ref})", payment.id);
        self.publish(Some(payment.status), commit.payment.clone(), Some(commit.order)).await;
        Ok(PaymentResponse::new(commit.payment, self.gateway.public_key()))
    }

    /// The payment for an order, as seen by the customer who placed it.
    pub async fn payment_for_order(&self, customer_id: i64, order_id: i64) -> Result<PaymentResponse, OrderFlowError> {
        let payment =
            self.db.fetch_payment_for_order(order_id).await?.ok_or(OrderFlowError::PaymentNotFound(order_id))?;
        self.customer_order(order_id, customer_id).await?;
        Ok(PaymentResponse::new(payment, self.gateway.public_key()))
    }

    async fn customer_order(&self, order_id: i64, customer_id: i64) -> Result<Order, OrderFlowError> {
        let order = self.db.fetch_order(order_id).await?.ok_or(OrderFlowError::OrderNotFound(order_id))?;
        if order.customer_id != customer_id {
            return Err(OrderFlowError::Forbidden(format!("Order #{order_id} does not belong to this customer")));
        }
        Ok(order)
    }

    async fn fail_payment(&self, payment: &Payment) -> Result<(), OrderFlowError> {
        match self.db.mark_payment_failed(payment.id).await? {
            Some(failed) => {
                if payment.status != PaymentStatus::Failed {
                    self.publish(Some(payment.status), failed, None).await;
                }
            },
            None => warn!("💳️ Payment #{} was settled before it could be marked as failed", payment.id),
        }
        Ok(())
    }

    async fn call_gateway<T, F>(&self, call: F) -> Result<T, OrderFlowError>
    where F: Future<Output = Result<T, GatewayError>> {
        match tokio::time::timeout(self.gateway_timeout, call).await {
            Ok(result) => result.map_err(OrderFlowError::from),
            Err(_) => {
                warn!("💳️ Gateway call timed out after {:?}", self.gateway_timeout);
                Err(OrderFlowError::GatewayTimeout(self.gateway_timeout.as_secs()))
            },
        }
    }

    async fn publish(&self, old_status: Option<PaymentStatus>, payment: Payment, order: Option<Order>) {
        let mut event = PaymentStatusChangedEvent::new(old_status, payment);
        if let Some(order) = order {
            event = event.with_order(order);
        }
        self.producers.publish_payment_status_changed(event).await;
    }
}
