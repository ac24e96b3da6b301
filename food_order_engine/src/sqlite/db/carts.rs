use log::trace;
use sqlx::SqliteConnection;

use crate::db_types::{Cart, CartLine, CartSnapshot};

pub async fn fetch_cart(customer_id: i64, conn: &mut SqliteConnection) -> Result<Option<Cart>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM carts WHERE customer_id = $1").bind(customer_id).fetch_optional(conn).await
}

/// Cart lines in insertion order.
pub async fn fetch_cart_lines(cart_id: i64, conn: &mut SqliteConnection) -> Result<Vec<CartLine>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM cart_lines WHERE cart_id = $1 ORDER BY id ASC").bind(cart_id).fetch_all(conn).await
}

pub async fn fetch_cart_snapshot(
    customer_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<CartSnapshot>, sqlx::Error> {
    let Some(cart) = fetch_cart(customer_id, conn).await? else {
        return Ok(None);
    };
    let lines = fetch_cart_lines(cart.id, conn).await?;
    Ok(Some(CartSnapshot { cart, lines }))
}

/// Touches the customer's cart row and returns it.
///
/// As the first statement of a transaction, this takes the database write lock, so that nobody else can check the
/// same cart out until the transaction completes.
pub async fn lock_cart(customer_id: i64, conn: &mut SqliteConnection) -> Result<Option<Cart>, sqlx::Error> {
    let rows: Vec<Cart> =
        sqlx::query_as("UPDATE carts SET updated_at = CURRENT_TIMESTAMP WHERE customer_id = $1 RETURNING *")
            .bind(customer_id)
            .fetch_all(conn)
            .await?;
    Ok(rows.into_iter().next())
}

/// Deletes all the lines in the cart and unbinds it from its restaurant. Returns the number of lines removed.
pub async fn drain_cart(cart_id: i64, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let removed = sqlx::query("DELETE FROM cart_lines WHERE cart_id = $1").bind(cart_id).execute(&mut *conn).await?;
    sqlx::query("UPDATE carts SET restaurant_id = NULL, updated_at = CURRENT_TIMESTAMP WHERE id = $1")
        .bind(cart_id)
        .execute(conn)
        .await?;
    trace!("🗃️ Cart #{cart_id} drained. {} lines removed", removed.rows_affected());
    Ok(removed.rows_affected())
}
