//! Seed data for tests. Profiles, addresses and carts are owned by other services in production, so the engine has no
//! API for creating them.
use sqlx::SqlitePool;

use crate::db_types::Money;

pub async fn insert_customer(pool: &SqlitePool, user_id: &str) -> i64 {
    insert_profile(pool, "customers", user_id).await
}

pub async fn insert_restaurant(pool: &SqlitePool, user_id: &str) -> i64 {
    insert_profile(pool, "restaurants", user_id).await
}

pub async fn insert_courier(pool: &SqlitePool, user_id: &str) -> i64 {
    insert_profile(pool, "couriers", user_id).await
}

async fn insert_profile(pool: &SqlitePool, table: &str, user_id: &str) -> i64 {
    let sql = format!("INSERT INTO {table} (user_id, name) VALUES ($1, $2) RETURNING id");
    let rows: Vec<(i64,)> =
        sqlx::query_as(&sql).bind(user_id).bind(user_id).fetch_all(pool).await.expect("Error inserting profile");
    rows[0].0
}

pub async fn insert_address(pool: &SqlitePool, customer_id: i64) -> i64 {
    let rows: Vec<(i64,)> = sqlx::query_as(
        "INSERT INTO customer_addresses (customer_id, line1, city, postal_code) VALUES ($1, '12 MG Road', \
         'Bengaluru', '560001') RETURNING id",
    )
    .bind(customer_id)
    .fetch_all(pool)
    .await
    .expect("Error inserting address");
    rows[0].0
}

/// Replaces the customer's cart with `lines` of `(menu_item_id, quantity, unit price)` from `restaurant_id`.
pub async fn fill_cart(pool: &SqlitePool, customer_id: i64, restaurant_id: i64, lines: &[(i64, i64, Money)]) -> i64 {
    let rows: Vec<(i64,)> = sqlx::query_as(
        "INSERT INTO carts (customer_id, restaurant_id) VALUES ($1, $2) ON CONFLICT (customer_id) DO UPDATE SET \
         restaurant_id = excluded.restaurant_id RETURNING id",
    )
    .bind(customer_id)
    .bind(restaurant_id)
    .fetch_all(pool)
    .await
    .expect("Error inserting cart");
    let cart_id = rows[0].0;
    sqlx::query("DELETE FROM cart_lines WHERE cart_id = $1").bind(cart_id).execute(pool).await.expect("Error");
    for (menu_item_id, quantity, price) in lines {
        sqlx::query("INSERT INTO cart_lines (cart_id, menu_item_id, quantity, price) VALUES ($1, $2, $3, $4)")
            .bind(cart_id)
            .bind(menu_item_id)
            .bind(quantity)
            .bind(price)
            .execute(pool)
            .await
            .expect("Error inserting cart line");
    }
    cart_id
}

/// Everyone needed to walk an order through its whole life.
#[derive(Debug, Clone, Copy)]
pub struct Cast {
    pub customer_id: i64,
    pub other_customer_id: i64,
    pub restaurant_id: i64,
    pub other_restaurant_id: i64,
    pub courier_id: i64,
    pub other_courier_id: i64,
    pub address_id: i64,
}

pub async fn seed_cast(pool: &SqlitePool) -> Cast {
    let customer_id = insert_customer(pool, "alice").await;
    let other_customer_id = insert_customer(pool, "bob").await;
    let restaurant_id = insert_restaurant(pool, "dosa-house").await;
    let other_restaurant_id = insert_restaurant(pool, "pizza-place").await;
    let courier_id = insert_courier(pool, "ravi").await;
    let other_courier_id = insert_courier(pool, "meena").await;
    let address_id = insert_address(pool, customer_id).await;
    Cast {
        customer_id,
        other_customer_id,
        restaurant_id,
        other_restaurant_id,
        courier_id,
        other_courier_id,
        address_id,
    }
}

/// Two items at 120.00 and one at 50.00, for a total of 290.00.
pub fn standard_cart() -> Vec<(i64, i64, Money)> {
    vec![(101, 2, Money::from(12_000)), (102, 1, Money::from(5_000))]
}
