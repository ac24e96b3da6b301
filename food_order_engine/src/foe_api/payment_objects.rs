use serde::{Deserialize, Serialize};

use crate::db_types::{Money, Payment, PaymentMethod, PaymentStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePaymentRequest {
    pub order_id: i64,
    pub method: PaymentMethod,
}

/// What the client needs to start the gateway checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentOrderResponse {
    pub payment_id: i64,
    pub gateway_order_ref: String,
    pub gateway_public_key: String,
    pub amount: Money,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyPaymentRequest {
    pub order_id: i64,
    pub gateway_order_ref: String,
    pub gateway_payment_ref: String,
    /// The signature returned to the client by the gateway checkout.
    pub proof: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundRequest {
    pub order_id: i64,
    /// Amount in minor currency units
    pub amount: Money,
    #[serde(default)]
    pub reason: Option<String>,
}

/// A payment as presented to the customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentResponse {
    #[serde(flatten)]
    pub payment: Payment,
    /// The gateway order reference, while the payment is still unsettled.
    pub gateway_order_ref: Option<String>,
    pub gateway_public_key: Option<String>,
}

impl PaymentResponse {
    pub fn new(payment: Payment, gateway_public_key: &str) -> Self {
        // Until the payment settles, the transaction id holds the gateway order reference
        let gateway_order_ref = match payment.status {
            PaymentStatus::Pending | PaymentStatus::Failed => payment.transaction_id.clone(),
            PaymentStatus::Success | PaymentStatus::Refunded => None,
        };
        let gateway_public_key = gateway_order_ref.as_ref().map(|_| gateway_public_key.to_string());
        Self { payment, gateway_order_ref, gateway_public_key }
    }
}
