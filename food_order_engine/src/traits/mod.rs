//! #  Backend interface contracts.
//!
//! This module defines the behaviour that storage backends and external collaborators need to expose in order to
//! support the food order engine.
//!
//! * [`OrderManagement`] creates orders from carts and applies status transitions atomically.
//! * [`PaymentManagement`] maintains the single payment record attached to an order, and commits payment outcomes to
//!   the order and payment together.
//! * [`CartSnapshots`] gives read-only access to a customer's cart.
//! * [`ProfileDirectory`] resolves authenticated user ids to customer, restaurant and courier profiles.
//! * [`PaymentGateway`] is the external payment provider.
mod cart_snapshots;
mod errors;
mod order_management;
mod payment_gateway;
mod payment_management;
mod profile_directory;

mod data_objects;

pub use cart_snapshots::CartSnapshots;
pub use data_objects::PaymentCommit;
pub use errors::{ErrorKind, GatewayError, OrderFlowError};
pub use order_management::OrderManagement;
pub use payment_gateway::{OpenTransaction, PaymentGateway};
pub use payment_management::PaymentManagement;
pub use profile_directory::ProfileDirectory;
