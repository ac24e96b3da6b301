use sqlx::SqliteConnection;

use crate::db_types::Role;

fn profile_table(role: Role) -> &'static str {
    match role {
        Role::Customer => "customers",
        Role::Restaurant => "restaurants",
        Role::Courier => "couriers",
    }
}

pub async fn fetch_profile_id(
    role: Role,
    user_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<i64>, sqlx::Error> {
    let sql = format!("SELECT id FROM {} WHERE user_id = $1", profile_table(role));
    let id: Option<(i64,)> = sqlx::query_as(&sql).bind(user_id).fetch_optional(conn).await?;
    Ok(id.map(|(id,)| id))
}

pub async fn address_belongs_to(
    address_id: i64,
    customer_id: i64,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let found: Option<(i64,)> = sqlx::query_as("SELECT id FROM customer_addresses WHERE id = $1 AND customer_id = $2")
        .bind(address_id)
        .bind(customer_id)
        .fetch_optional(conn)
        .await?;
    Ok(found.is_some())
}
