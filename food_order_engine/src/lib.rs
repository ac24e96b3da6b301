//! Food Order Engine
//!
//! The food order engine drives a delivery order from checkout to handover, and reconciles the payment taken for it by
//! an external payment gateway. It is storage- and gateway-agnostic.
//!
//! The library is divided into three main sections:
//! 1. The storage traits ([`mod@traits`]) and a SQLite implementation of them ([`SqliteDatabase`]). You should never
//!    need to access the database directly. The exception is the data types used in the database. These are defined in
//!    the `db_types` module and are public.
//! 2. The public API ([`OrderFlowApi`], [`PaymentFlowApi`], [`OrderQueryApi`] and [`ProfileApi`]). Every order status
//!    change is a single conditional update, so concurrent requests for the same order resolve to exactly one winner.
//! 3. Events. Status changes for orders and payments are published to any hooks registered with [`events::EventHooks`].
//!
//! A paid order can never be cancelled. The rule is enforced by the conditional updates, a database constraint, and
//! the checks in [`consistency`].
pub mod consistency;
pub mod db_types;
pub mod events;
pub mod helpers;
pub mod traits;

mod foe_api;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use foe_api::{
    order_flow_api::OrderFlowApi,
    order_objects,
    order_query_api::{order_is_visible_to, OrderQueryApi},
    payment_flow_api::{PaymentFlowApi, DEFAULT_GATEWAY_TIMEOUT},
    payment_objects,
    profile_api::ProfileApi,
};
#[cfg(feature = "sqlite")]
pub use sqlite::{db, SqliteDatabase};
pub use traits::{
    CartSnapshots,
    ErrorKind,
    GatewayError,
    OrderFlowError,
    OrderManagement,
    PaymentGateway,
    PaymentManagement,
    ProfileDirectory,
};
