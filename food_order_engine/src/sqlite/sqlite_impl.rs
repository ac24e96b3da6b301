//! `SqliteDatabase` is a concrete implementation of a food order engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the storage traits defined in the [`traits`]
//! module.
use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::db::{carts, db_url, new_pool, orders, payments, profiles};
use crate::{
    consistency,
    db_types::{CartSnapshot, CheckoutError, NewOrder, Order, OrderLine, Payment, PaymentMethod, Role},
    order_objects::{FullOrder, OrderQueryFilter, OrderTransition},
    traits::{CartSnapshots, OrderFlowError, OrderManagement, PaymentCommit, PaymentManagement, ProfileDirectory},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl OrderManagement for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Checks out the customer's cart in a single atomic transaction:
    /// * the cart row is touched first, which takes the write lock for the rest of the transaction,
    /// * the cart lines are read and validated, and the delivery address is checked,
    /// * the order and its lines are inserted,
    /// * the cart is drained.
    ///
    /// If anything fails, the transaction is rolled back and the cart is left as it was.
    async fn place_order(&self, customer_id: i64, address_id: i64) -> Result<FullOrder, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let cart = carts::lock_cart(customer_id, &mut tx).await?.ok_or(CheckoutError::EmptyCart)?;
        let lines = carts::fetch_cart_lines(cart.id, &mut tx).await?;
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart.into());
        }
        if !profiles::address_belongs_to(address_id, customer_id, &mut tx).await? {
            return Err(OrderFlowError::AddressNotFound { address_id, customer_id });
        }
        let snapshot = CartSnapshot { cart, lines };
        let new_order = NewOrder::from_cart(&snapshot, address_id)?;
        let order = orders::insert_order(&new_order, &mut tx).await?;
        let drained = carts::drain_cart(snapshot.cart.id, &mut tx).await?;
        if drained != snapshot.lines.len() as u64 {
            error!(
                "🗃️ Cart #{} changed during checkout ({} lines read, {drained} removed). Rolling back.",
                snapshot.cart.id,
                snapshot.lines.len()
            );
            tx.rollback().await?;
            return Err(OrderFlowError::InvalidState("The cart changed during checkout. Please try again.".into()));
        }
        tx.commit().await?;
        debug!("🗃️ Cart #{} checked out as order #{}", snapshot.cart.id, order.order.id);
        Ok(order)
    }

    /// Applies the transition in its own transaction. The new state is checked against the cross-entity rules before
    /// it is committed.
    async fn try_transition(
        &self,
        order_id: i64,
        actor_id: i64,
        transition: OrderTransition,
    ) -> Result<Option<Order>, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::apply_transition(order_id, actor_id, transition, &mut tx).await?;
        if let Some(Err(e)) = order.as_ref().map(consistency::check_order) {
            tx.rollback().await?;
            return Err(e);
        }
        tx.commit().await?;
        Ok(order)
    }

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_lines(&self, order_id: i64) -> Result<Vec<OrderLine>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let lines = orders::fetch_order_lines(order_id, &mut conn).await?;
        Ok(lines)
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let result = orders::search_orders(query, &mut conn).await?;
        Ok(result)
    }
}

impl PaymentManagement for SqliteDatabase {
    async fn fetch_payment_for_order(&self, order_id: i64) -> Result<Option<Payment>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let payment = payments::fetch_payment_for_order(order_id, &mut conn).await?;
        Ok(payment)
    }

    async fn open_payment(&self, order: &Order, method: PaymentMethod) -> Result<Option<Payment>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let payment = payments::upsert_pending_payment(order.id, order.total_amount, method, &mut conn).await?;
        Ok(payment)
    }

    async fn attach_gateway_reference(
        &self,
        payment_id: i64,
        gateway_order_ref: &str,
    ) -> Result<Option<Payment>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let payment = payments::set_gateway_reference(payment_id, gateway_order_ref, &mut conn).await?;
        Ok(payment)
    }

    async fn mark_payment_failed(&self, payment_id: i64) -> Result<Option<Payment>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let payment = payments::mark_failed(payment_id, &mut conn).await?;
        Ok(payment)
    }

    /// Settles the payment and marks the order as paid in one transaction. The payment update comes first, so the
    /// write lock is held from the start of the transaction.
    async fn settle_payment(
        &self,
        payment_id: i64,
        gateway_payment_ref: &str,
    ) -> Result<PaymentCommit, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let payment = payments::mark_success(payment_id, gateway_payment_ref, &mut tx)
            .await?
            .ok_or_else(|| OrderFlowError::InvalidState(format!("Payment #{payment_id} has already been settled")))?;
        let Some(order) = orders::mark_paid(payment.order_id, &mut tx).await? else {
            tx.rollback().await?;
            warn!("🗃️ Payment #{payment_id} could not be applied to order #{}. Rolled back.", payment.order_id);
            return Err(OrderFlowError::InvalidState(format!(
                "Order #{} has been cancelled or already paid. The payment cannot be applied.",
                payment.order_id
            )));
        };
        let commit = PaymentCommit { order, payment };
        if let Err(e) = consistency::check_commit(&commit) {
            tx.rollback().await?;
            return Err(e);
        }
        tx.commit().await?;
        debug!("🗃️ Payment #{payment_id} settled. Order #{} is {}", commit.order.id, commit.order.payment_status);
        Ok(commit)
    }

    async fn claim_refund(&self, payment_id: i64) -> Result<Option<Payment>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let payment = payments::claim_refund(payment_id, &mut conn).await?;
        Ok(payment)
    }

    async fn release_refund(&self, payment_id: i64) -> Result<bool, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let released = payments::release_refund(payment_id, &mut conn).await?;
        Ok(released)
    }

    async fn refund_payment(&self, payment_id: i64, refund_ref: &str) -> Result<PaymentCommit, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let payment = payments::mark_refunded(payment_id, refund_ref, &mut tx)
            .await?
            .ok_or_else(|| {
                OrderFlowError::InvalidState(format!("Payment #{payment_id} is not refundable or was not claimed"))
            })?;
        let Some(order) = orders::mark_refunded(payment.order_id, &mut tx).await? else {
            tx.rollback().await?;
            return Err(OrderFlowError::InvalidState(format!("Order #{} is not marked as paid", payment.order_id)));
        };
        let commit = PaymentCommit { order, payment };
        if let Err(e) = consistency::check_commit(&commit) {
            tx.rollback().await?;
            return Err(e);
        }
        tx.commit().await?;
        debug!("🗃️ Payment #{payment_id} refunded. Order #{} is {}", commit.order.id, commit.order.payment_status);
        Ok(commit)
    }
}

impl CartSnapshots for SqliteDatabase {
    async fn fetch_cart_snapshot(&self, customer_id: i64) -> Result<Option<CartSnapshot>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let snapshot = carts::fetch_cart_snapshot(customer_id, &mut conn).await?;
        Ok(snapshot)
    }
}

impl ProfileDirectory for SqliteDatabase {
    async fn fetch_profile_id(&self, role: Role, user_id: &str) -> Result<Option<i64>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let id = profiles::fetch_profile_id(role, user_id, &mut conn).await?;
        Ok(id)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object, using the URL in `FOS_DATABASE_URL`
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Applies any outstanding schema migrations.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub async fn close(&mut self) -> Result<(), sqlx::Error> {
        self.pool.close().await;
        Ok(())
    }
}
