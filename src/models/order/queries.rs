use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use super::status::OrderStatus;
use super::types::{NewOrder, Order, OrderItem};

/// Postgres NOTIFY channel fired by the `orders_changed` trigger.
/// The payload is the restaurant id of the touched row.
pub const ORDERS_CHANNEL: &str = "orders_changed";

const SELECT_ORDER: &str = "\
    SELECT id, order_number, table_number, status, items, total, created_at, updated_at \
    FROM orders";

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: String,
    order_number: Option<String>,
    table_number: Option<String>,
    status: Option<String>,
    items: Option<Json<Vec<OrderItem>>>,
    total: Option<f64>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        let status = row.status.as_deref().and_then(|s| match s.parse::<OrderStatus>() {
            Ok(status) => Some(status),
            Err(e) => {
                log::warn!("Order {}: {}; treating as pending", row.id, e);
                None
            }
        });
        Order {
            id: row.id,
            order_number: row.order_number,
            table_number: row.table_number,
            status,
            items: row.items.map(|Json(items)| items),
            total: row.total,
            timestamp: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Orders of one restaurant, newest first. `limit = None` returns the full history.
pub async fn find_recent(
    pool: &PgPool,
    restaurant_id: &str,
    limit: Option<i64>,
) -> Result<Vec<Order>, sqlx::Error> {
    let rows = sqlx::query_as::<_, OrderRow>(&format!(
        "{SELECT_ORDER} WHERE restaurant_id = $1 \
         ORDER BY created_at DESC NULLS LAST, id \
         LIMIT $2"
    ))
    .bind(restaurant_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Order::from).collect())
}

/// Orders created at or after `since`, newest first.
pub async fn find_since(
    pool: &PgPool,
    restaurant_id: &str,
    since: DateTime<Utc>,
) -> Result<Vec<Order>, sqlx::Error> {
    let rows = sqlx::query_as::<_, OrderRow>(&format!(
        "{SELECT_ORDER} WHERE restaurant_id = $1 AND created_at >= $2 \
         ORDER BY created_at DESC, id"
    ))
    .bind(restaurant_id)
    .bind(since)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Order::from).collect())
}

/// Partial update of `status` and `updated_at`. Returns the number of rows touched.
pub async fn update_status(
    pool: &PgPool,
    restaurant_id: &str,
    order_id: &str,
    status: OrderStatus,
    updated_at: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE orders SET status = $1, updated_at = $2 \
         WHERE restaurant_id = $3 AND id = $4",
    )
    .bind(status.as_str())
    .bind(updated_at)
    .bind(restaurant_id)
    .bind(order_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub async fn delete(pool: &PgPool, restaurant_id: &str, order_id: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM orders WHERE restaurant_id = $1 AND id = $2")
        .bind(restaurant_id)
        .bind(order_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn insert(
    pool: &PgPool,
    restaurant_id: &str,
    order_id: &str,
    order: &NewOrder,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO orders (id, restaurant_id, order_number, table_number, status, items, total, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, COALESCE($8, now()))",
    )
    .bind(order_id)
    .bind(restaurant_id)
    .bind(&order.order_number)
    .bind(&order.table_number)
    .bind(order.status.map(OrderStatus::as_str))
    .bind(Json(&order.items))
    .bind(order.computed_total())
    .bind(order.timestamp)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn count(pool: &PgPool, restaurant_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE restaurant_id = $1")
        .bind(restaurant_id)
        .fetch_one(pool)
        .await
}
