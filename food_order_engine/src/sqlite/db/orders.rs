use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{NewOrder, Order, OrderLine, OrderStatusType},
    order_objects::{FullOrder, OrderQueryFilter, OrderTransition},
};

/// Inserts a new order and its lines using the given connection. This is not atomic. You should embed this call
/// inside a transaction, and pass `&mut *tx` as the connection argument.
///
/// The order is created with `PENDING` status and `PENDING` payment status.
pub async fn insert_order(order: &NewOrder, conn: &mut SqliteConnection) -> Result<FullOrder, sqlx::Error> {
    let inserted: Order = sqlx::query_as::<_, Order>(
        r#"
            INSERT INTO orders (
                customer_id,
                restaurant_id,
                address_id,
                status,
                payment_status,
                total_amount
            ) VALUES ($1, $2, $3, 'PENDING', 'PENDING', $4)
            RETURNING *;
        "#,
    )
    .bind(order.customer_id)
    .bind(order.restaurant_id)
    .bind(order.address_id)
    .bind(order.total_amount)
    .fetch_all(&mut *conn)
    .await?
    .pop()
    .ok_or(sqlx::Error::RowNotFound)?;
    let mut lines = Vec::with_capacity(order.lines.len());
    for line in &order.lines {
        let line = sqlx::query_as::<_, OrderLine>(
            "INSERT INTO order_lines (order_id, menu_item_id, quantity, price) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(inserted.id)
        .bind(line.menu_item_id)
        .bind(line.quantity)
        .bind(line.price)
        .fetch_all(&mut *conn)
        .await?
        .pop()
        .ok_or(sqlx::Error::RowNotFound)?;
        lines.push(line);
    }
    debug!("🗃️ Order #{} inserted with {} lines. Total: {}", inserted.id, lines.len(), inserted.total_amount);
    Ok(FullOrder::new(inserted, lines))
}

pub async fn fetch_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(order_id).fetch_optional(conn).await
}

pub async fn fetch_order_lines(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderLine>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM order_lines WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id)
        .fetch_all(conn)
        .await
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`.
///
/// Resulting orders are sorted by `order_date`, most recent first.
pub async fn search_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM orders ");
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(cid) = query.customer_id {
        where_clause.push("customer_id = ");
        where_clause.push_bind_unseparated(cid);
    }
    if let Some(rid) = query.restaurant_id {
        where_clause.push("restaurant_id = ");
        where_clause.push_bind_unseparated(rid);
    }
    if let Some(courier) = query.courier_id {
        where_clause.push("courier_id = ");
        where_clause.push_bind_unseparated(courier);
    }
    if let Some(status) = query.status {
        where_clause.push("status = ");
        where_clause.push_bind_unseparated(status.to_string());
    }
    if query.unassigned {
        where_clause.push("courier_id IS NULL");
    }
    let (limit, offset) = query.limit_offset();
    builder.push(" ORDER BY order_date DESC, id DESC LIMIT ");
    builder.push_bind(limit);
    builder.push(" OFFSET ");
    builder.push_bind(offset);

    trace!("🗃️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("🗃️ Result of search_orders: {}", orders.len());
    Ok(orders)
}

/// Applies `transition` to the order as a single conditional update.
///
/// The update only matches if the actor owns (or, for couriers, is assigned to) the order and the order is in the
/// required pre-state. Returns `None` if nothing matched.
pub async fn apply_transition(
    order_id: i64,
    actor_id: i64,
    transition: OrderTransition,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let sql = match transition {
        OrderTransition::Cancel => {
            "UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 AND customer_id = $3 AND \
             status = $4 AND payment_status <> 'PAID' RETURNING *"
        },
        OrderTransition::Confirm | OrderTransition::MarkReady => {
            "UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 AND restaurant_id = $3 AND \
             status = $4 RETURNING *"
        },
        OrderTransition::AcceptDelivery => {
            "UPDATE orders SET status = $1, courier_id = $3, updated_at = CURRENT_TIMESTAMP WHERE id = $2 AND status = \
             $4 AND courier_id IS NULL RETURNING *"
        },
        OrderTransition::MarkDelivered => {
            "UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 AND courier_id = $3 AND \
             status = $4 RETURNING *"
        },
    };
    let rows: Vec<Order> = sqlx::query_as(sql)
        .bind(transition.target_status().to_string())
        .bind(order_id)
        .bind(actor_id)
        .bind(transition.required_status().to_string())
        .fetch_all(conn)
        .await?;
    Ok(rows.into_iter().next())
}

/// Marks the order as paid, unless it has been cancelled or is already paid.
pub(crate) async fn mark_paid(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let rows: Vec<Order> = sqlx::query_as(
        "UPDATE orders SET payment_status = 'PAID', updated_at = CURRENT_TIMESTAMP WHERE id = $1 AND status <> $2 AND \
         payment_status <> 'PAID' RETURNING *",
    )
    .bind(order_id)
    .bind(OrderStatusType::Cancelled.to_string())
    .fetch_all(conn)
    .await?;
    Ok(rows.into_iter().next())
}

pub(crate) async fn mark_refunded(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let rows: Vec<Order> = sqlx::query_as(
        "UPDATE orders SET payment_status = 'REFUNDED', updated_at = CURRENT_TIMESTAMP WHERE id = $1 AND \
         payment_status = 'PAID' RETURNING *",
    )
    .bind(order_id)
    .fetch_all(conn)
    .await?;
    Ok(rows.into_iter().next())
}
