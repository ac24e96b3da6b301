use crate::{db_types::Money, traits::GatewayError};

/// A request to open a payable transaction on the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenTransaction {
    pub amount: Money,
    /// Merchant-side reference, e.g. `order_42`.
    pub receipt: String,
    pub notes: Vec<(String, String)>,
}

/// The external payment gateway, as seen by the payment flow.
///
/// Implementations must not retry internally. Timeouts are applied by the caller.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    /// The public key id that clients need in order to start a checkout with the gateway.
    fn public_key(&self) -> &str;

    fn currency(&self) -> &str;

    /// Opens a payable transaction and returns the gateway's reference for it.
    async fn open_transaction(&self, request: OpenTransaction) -> Result<String, GatewayError>;

    /// Checks the client-supplied proof that the gateway captured `payment_ref` against `order_ref`.
    fn verify_signature(&self, order_ref: &str, payment_ref: &str, proof: &str) -> Result<bool, GatewayError>;

    /// Refunds `amount` of the captured payment `transaction_ref`, returning the gateway's refund reference.
    async fn refund(&self, transaction_ref: &str, amount: Money, reason: Option<&str>) -> Result<String, GatewayError>;
}
