use thiserror::Error;

use crate::db_types::{CheckoutError, OrderStatusType};

/// The four failure classes that callers of the engine need to distinguish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    InvalidState,
    /// The payment gateway was unreachable, timed out, or rejected the call. Callers may retry.
    ExternalFailure,
    Internal,
}

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("The requested order #{0} does not exist")]
    OrderNotFound(i64),
    #[error("There is no payment for order #{0}")]
    PaymentNotFound(i64),
    #[error("Address #{address_id} does not exist for customer #{customer_id}")]
    AddressNotFound { address_id: i64, customer_id: i64 },
    #[error("No {role} profile exists for user {user_id}")]
    ProfileNotFound { role: String, user_id: String },
    #[error("Forbidden. {0}")]
    Forbidden(String),
    #[error("Order is {current}, but it must be {required} for this action")]
    InvalidStatus { current: OrderStatusType, required: OrderStatusType },
    #[error("{0}")]
    InvalidState(String),
    #[error("Payment gateway error. {0}")]
    GatewayError(String),
    #[error("The payment gateway did not respond within {0} seconds")]
    GatewayTimeout(u64),
}

impl OrderFlowError {
    pub fn kind(&self) -> ErrorKind {
        use OrderFlowError::*;
        match self {
            DatabaseError(_) => ErrorKind::Internal,
            OrderNotFound(_) | PaymentNotFound(_) | AddressNotFound { .. } | ProfileNotFound { .. } => {
                ErrorKind::NotFound
            },
            Forbidden(_) => ErrorKind::Forbidden,
            InvalidStatus { .. } | InvalidState(_) => ErrorKind::InvalidState,
            GatewayError(_) | GatewayTimeout(_) => ErrorKind::ExternalFailure,
        }
    }
}

impl From<sqlx::Error> for OrderFlowError {
    fn from(e: sqlx::Error) -> Self {
        OrderFlowError::DatabaseError(e.to_string())
    }
}

impl From<CheckoutError> for OrderFlowError {
    fn from(e: CheckoutError) -> Self {
        OrderFlowError::InvalidState(e.to_string())
    }
}

impl From<GatewayError> for OrderFlowError {
    fn from(e: GatewayError) -> Self {
        OrderFlowError::GatewayError(e.to_string())
    }
}

/// Failures reported by a [`crate::traits::PaymentGateway`] implementation.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("Could not reach the gateway. {0}")]
    Unreachable(String),
    #[error("The gateway rejected the request. {0}")]
    Rejected(String),
    #[error("Unexpected gateway response. {0}")]
    InvalidResponse(String),
}
