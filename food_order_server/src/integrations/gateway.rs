//! Adapts the REST gateway client to the engine's [`PaymentGateway`] capability.
use food_order_engine::{
    db_types::Money,
    helpers::verify_payment_signature,
    traits::{GatewayError, OpenTransaction},
    PaymentGateway,
};
use gateway_tools::{gateway_amount, GatewayApi, GatewayApiError, GatewayConfig, NewGatewayOrder, RefundRequest};
use log::*;

use crate::errors::ServerError;

#[derive(Clone)]
pub struct HttpPaymentGateway {
    api: GatewayApi,
}

impl HttpPaymentGateway {
    pub fn new(config: GatewayConfig) -> Result<Self, ServerError> {
        let api = GatewayApi::new(config).map_err(|e| ServerError::InitializeError(e.to_string()))?;
        Ok(Self { api })
    }
}

impl From<GatewayApi> for HttpPaymentGateway {
    fn from(api: GatewayApi) -> Self {
        Self { api }
    }
}

fn to_gateway_error(e: GatewayApiError) -> GatewayError {
    match e {
        GatewayApiError::Timeout | GatewayApiError::RestRequestError(_) | GatewayApiError::Initialization(_) => {
            GatewayError::Unreachable(e.to_string())
        },
        GatewayApiError::QueryError { .. } | GatewayApiError::InvalidCurrencyAmount(_) => {
            GatewayError::Rejected(e.to_string())
        },
        GatewayApiError::RestResponseError(_) | GatewayApiError::JsonError(_) => {
            GatewayError::InvalidResponse(e.to_string())
        },
    }
}

impl PaymentGateway for HttpPaymentGateway {
    fn public_key(&self) -> &str {
        self.api.config().key_id.as_str()
    }

    fn currency(&self) -> &str {
        self.api.config().currency.as_str()
    }

    async fn open_transaction(&self, request: OpenTransaction) -> Result<String, GatewayError> {
        let amount = gateway_amount(request.amount).map_err(to_gateway_error)?;
        let order = request
            .notes
            .into_iter()
            .fold(NewGatewayOrder::new(amount, self.currency(), &request.receipt), |o, (k, v)| o.with_note(k, v));
        let result = self.api.create_order(order).await.map_err(|e| {
            warn!("💳️ Could not open gateway order for {}. {e}", request.receipt);
            to_gateway_error(e)
        })?;
        Ok(result.id)
    }

    fn verify_signature(&self, order_ref: &str, payment_ref: &str, proof: &str) -> Result<bool, GatewayError> {
        let secret = self.api.config().key_secret.reveal();
        if secret.is_empty() {
            return Err(GatewayError::Rejected("No gateway key secret is configured".into()));
        }
        Ok(verify_payment_signature(secret, order_ref, payment_ref, proof))
    }

    async fn refund(&self, transaction_ref: &str, amount: Money, reason: Option<&str>) -> Result<String, GatewayError> {
        let amount = gateway_amount(amount).map_err(to_gateway_error)?;
        let request = RefundRequest::new(amount).with_reason(reason);
        let refund = self.api.refund_payment(transaction_ref, request).await.map_err(|e| {
            warn!("💳️ Gateway refund on {transaction_ref} failed. {e}");
            to_gateway_error(e)
        })?;
        Ok(refund.id)
    }
}
