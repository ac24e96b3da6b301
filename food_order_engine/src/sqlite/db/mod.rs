//! # SQLite Database methods
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! All these interactions are simple functions (rather than stateful structs) that accept a `&mut SqliteConnection`
//! argument. Callers can obtain a connection from a pool, or open an atomic transaction as the need arises and call
//! through to the functions without any other changes.
//!
//! Functions that change the status of an order or a payment are *conditional* updates: the pre-state is part of the
//! `WHERE` clause, and they return `None` when no row matched.
//!
//! Statements that write and return rows (`… RETURNING *`) are always read with `fetch_all`. SQLite only completes the
//! write once the statement has been stepped to the end, and `fetch_optional`/`fetch_one` stop after the first row.
use std::env;

use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

pub mod carts;
pub mod orders;
pub mod payments;
pub mod profiles;

const SQLITE_DB_URL: &str = "sqlite://data/food_orders.db";

pub fn db_url() -> String {
    let result = env::var("FOS_DATABASE_URL").unwrap_or_else(|_| {
        info!("🗃️ FOS_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("🗃️ Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let options = url.parse::<SqliteConnectOptions>()?.foreign_keys(true).create_if_missing(true);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}
