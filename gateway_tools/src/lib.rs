//! Thin async client for the external payment gateway.
//!
//! The gateway exposes two REST calls that the food order engine needs:
//! * `POST /v1/orders` opens a payable transaction and returns the gateway order reference;
//! * `POST /v1/payments/{id}/refund` refunds (part of) a captured payment.
//!
//! Signature verification of a completed payment happens locally and lives in the engine.
mod api;
mod config;
mod error;
mod helpers;

mod data_objects;

pub use api::GatewayApi;
pub use config::GatewayConfig;
pub use data_objects::{GatewayOrder, GatewayRefund, NewGatewayOrder, RefundRequest, RefundSpeed};
pub use error::GatewayApiError;
pub use helpers::{gateway_amount, money_from_gateway_amount};
