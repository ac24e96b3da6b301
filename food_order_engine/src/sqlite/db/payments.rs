use log::trace;
use sqlx::SqliteConnection;

use crate::db_types::{Money, Payment, PaymentMethod};

pub async fn fetch_payment_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM payments WHERE order_id = $1").bind(order_id).fetch_optional(conn).await
}

/// Inserts a `PENDING` payment for the order. If the order already has a payment that is `PENDING` or `FAILED`, it is
/// reset to `PENDING` with the new method instead. Settled payments are left alone, and `None` is returned.
///
/// The amount of an existing payment is never changed.
pub async fn upsert_pending_payment(
    order_id: i64,
    amount: Money,
    method: PaymentMethod,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    let rows: Vec<Payment> = sqlx::query_as(
        r#"
            INSERT INTO payments (order_id, amount, method, status) VALUES ($1, $2, $3, 'PENDING')
            ON CONFLICT (order_id) DO UPDATE SET
                status = 'PENDING',
                method = excluded.method,
                updated_at = CURRENT_TIMESTAMP
            WHERE payments.status IN ('PENDING', 'FAILED')
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(amount)
    .bind(method.to_string())
    .fetch_all(conn)
    .await?;
    let payment = rows.into_iter().next();
    trace!("🗃️ Pending payment for order #{order_id}: {:?}", payment.as_ref().map(|p| p.id));
    Ok(payment)
}

pub async fn set_gateway_reference(
    payment_id: i64,
    reference: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    let rows: Vec<Payment> = sqlx::query_as(
        "UPDATE payments SET transaction_id = $2, updated_at = CURRENT_TIMESTAMP WHERE id = $1 AND status = 'PENDING' \
         RETURNING *",
    )
    .bind(payment_id)
    .bind(reference)
    .fetch_all(conn)
    .await?;
    Ok(rows.into_iter().next())
}

pub async fn mark_failed(payment_id: i64, conn: &mut SqliteConnection) -> Result<Option<Payment>, sqlx::Error> {
    let rows: Vec<Payment> = sqlx::query_as(
        "UPDATE payments SET status = 'FAILED', updated_at = CURRENT_TIMESTAMP WHERE id = $1 AND status IN \
         ('PENDING', 'FAILED') RETURNING *",
    )
    .bind(payment_id)
    .fetch_all(conn)
    .await?;
    Ok(rows.into_iter().next())
}

pub(crate) async fn mark_success(
    payment_id: i64,
    gateway_payment_ref: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    let rows: Vec<Payment> = sqlx::query_as(
        r#"
            UPDATE payments SET
                status = 'SUCCESS',
                transaction_id = $2,
                payment_date = CURRENT_TIMESTAMP,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND status IN ('PENDING', 'FAILED')
            RETURNING *;
        "#,
    )
    .bind(payment_id)
    .bind(gateway_payment_ref)
    .fetch_all(conn)
    .await?;
    Ok(rows.into_iter().next())
}

/// Claims a `SUCCESS` payment for a refund. Only one refund can be in flight for a payment, so this returns `None` if
/// the payment is not `SUCCESS` or another refund holds the claim.
pub async fn claim_refund(payment_id: i64, conn: &mut SqliteConnection) -> Result<Option<Payment>, sqlx::Error> {
    let rows: Vec<Payment> = sqlx::query_as(
        "UPDATE payments SET refund_in_flight = 1, updated_at = CURRENT_TIMESTAMP WHERE id = $1 AND status = \
         'SUCCESS' AND refund_in_flight = 0 RETURNING *",
    )
    .bind(payment_id)
    .fetch_all(conn)
    .await?;
    Ok(rows.into_iter().next())
}

/// Drops the refund claim on a payment that is still `SUCCESS`. Returns `true` if a claim was released.
pub async fn release_refund(payment_id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE payments SET refund_in_flight = 0, updated_at = CURRENT_TIMESTAMP WHERE id = $1 AND status = \
         'SUCCESS' AND refund_in_flight = 1",
    )
    .bind(payment_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Completes a claimed refund. Returns `None` unless the payment is `SUCCESS` and holds the refund claim.
pub(crate) async fn mark_refunded(
    payment_id: i64,
    refund_ref: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    let rows: Vec<Payment> = sqlx::query_as(
        r#"
            UPDATE payments SET
                status = 'REFUNDED',
                transaction_id = $2,
                refund_in_flight = 0,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND status = 'SUCCESS' AND refund_in_flight = 1
            RETURNING *;
        "#,
    )
    .bind(payment_id)
    .bind(refund_ref)
    .fetch_all(conn)
    .await?;
    Ok(rows.into_iter().next())
}
