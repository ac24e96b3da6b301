use fos_common::Money;

use crate::GatewayApiError;

/// The gateway takes amounts as a non-negative integer count of the currency's minor unit (paise for INR).
pub fn gateway_amount(amount: Money) -> Result<u64, GatewayApiError> {
    u64::try_from(amount.value())
        .map_err(|_| GatewayApiError::InvalidCurrencyAmount(format!("{amount} cannot be sent to the gateway")))
}

pub fn money_from_gateway_amount(amount: u64) -> Result<Money, GatewayApiError> {
    Money::try_from(amount).map_err(|e| GatewayApiError::InvalidCurrencyAmount(e.to_string()))
}
