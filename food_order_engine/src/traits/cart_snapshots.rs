use crate::{db_types::CartSnapshot, traits::OrderFlowError};

/// Read-only access to shopping carts. Carts are written by the catalog/cart service; the engine only drains them
/// when an order is placed.
#[allow(async_fn_in_trait)]
pub trait CartSnapshots {
    /// The customer's cart and its lines, or `None` if the customer has never had a cart.
    async fn fetch_cart_snapshot(&self, customer_id: i64) -> Result<Option<CartSnapshot>, OrderFlowError>;
}
