//! Order Repository

use super::{RepoError, RepoResult};
use shared::models::{GoodsSales, NewOrder, NewOrderItem, Order, OrderStatus, StatusTransition};
use sqlx::SqlitePool;

const ORDER_COLUMNS: &str = "id, user_id, status, amount, order_time, pay_time, cancel_time, cancel_reason, updated_at, updated_by";

/// Row shape of the `orders` table
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    user_id: i64,
    status: i64,
    amount: f64,
    order_time: i64,
    pay_time: Option<i64>,
    cancel_time: Option<i64>,
    cancel_reason: Option<String>,
    updated_at: Option<i64>,
    updated_by: Option<i64>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepoError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status = OrderStatus::from_code(row.status).ok_or_else(|| {
            RepoError::Database(format!("Order {} has unknown status code {}", row.id, row.status))
        })?;
        Ok(Order {
            id: row.id,
            user_id: row.user_id,
            status,
            amount: row.amount,
            order_time: row.order_time,
            pay_time: row.pay_time,
            cancel_time: row.cancel_time,
            cancel_reason: row.cancel_reason,
            updated_at: row.updated_at,
            updated_by: row.updated_by,
        })
    }
}

pub async fn insert(pool: &SqlitePool, data: &NewOrder) -> RepoResult<()> {
    if data.amount < 0.0 {
        return Err(RepoError::Validation(format!(
            "Order amount cannot be negative: {}",
            data.amount
        )));
    }
    sqlx::query(
        "INSERT INTO orders (id, user_id, status, amount, order_time, pay_time, updated_at, updated_by) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )
    .bind(data.id)
    .bind(data.user_id)
    .bind(data.status.code())
    .bind(data.amount)
    .bind(data.order_time)
    .bind(data.pay_time)
    .bind(data.updated_at)
    .bind(data.updated_by)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn insert_item(pool: &SqlitePool, data: &NewOrderItem) -> RepoResult<i64> {
    if data.quantity <= 0 {
        return Err(RepoError::Validation(format!(
            "Quantity must be positive: {}",
            data.quantity
        )));
    }
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO order_item (order_id, name, quantity) VALUES (?1, ?2, ?3) RETURNING id",
    )
    .bind(data.order_id)
    .bind(&data.name)
    .bind(data.quantity)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Order>> {
    let row = sqlx::query_as::<_, OrderRow>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.map(Order::try_from).transpose()
}

pub async fn exists(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let found = sqlx::query_scalar::<_, i64>("SELECT 1 FROM orders WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(found.is_some())
}

/// Orders in `status` created strictly before `before`
pub async fn find_by_status_before(
    pool: &SqlitePool,
    status: OrderStatus,
    before: i64,
) -> RepoResult<Vec<Order>> {
    let rows = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE status = ? AND order_time < ? ORDER BY order_time"
    ))
    .bind(status.code())
    .bind(before)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(Order::try_from).collect()
}

/// Compare-and-set on status; returns rows affected (0 or 1)
///
/// `pay_time` and audit fields are only overwritten when the transition
/// carries them. Cancel fields are written as-is, so non-cancel transitions
/// leave them NULL.
pub async fn update_status_if(
    pool: &SqlitePool,
    id: i64,
    expected: OrderStatus,
    transition: &StatusTransition,
) -> RepoResult<u64> {
    let result = sqlx::query(
        "UPDATE orders SET status = ?1, pay_time = COALESCE(?2, pay_time), cancel_time = ?3, cancel_reason = ?4, updated_at = COALESCE(?5, updated_at), updated_by = COALESCE(?6, updated_by) WHERE id = ?7 AND status = ?8",
    )
    .bind(transition.to().code())
    .bind(transition.pay_time())
    .bind(transition.cancel_time())
    .bind(transition.cancel_reason())
    .bind(transition.updated_at())
    .bind(transition.updated_by())
    .bind(id)
    .bind(expected.code())
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// `SUM(amount)` for `status` in `[start, end)`; `None` when no row matches
pub async fn sum_amount(
    pool: &SqlitePool,
    status: OrderStatus,
    start: i64,
    end: i64,
) -> RepoResult<Option<f64>> {
    let sum = sqlx::query_scalar::<_, Option<f64>>(
        "SELECT SUM(amount) FROM orders WHERE status = ? AND order_time >= ? AND order_time < ?",
    )
    .bind(status.code())
    .bind(start)
    .bind(end)
    .fetch_one(pool)
    .await?;
    Ok(sum)
}

/// Orders in `[start, end)`, optionally filtered by status
pub async fn count(
    pool: &SqlitePool,
    start: i64,
    end: i64,
    status: Option<OrderStatus>,
) -> RepoResult<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM orders WHERE order_time >= ?1 AND order_time < ?2 AND (?3 IS NULL OR status = ?3)",
    )
    .bind(start)
    .bind(end)
    .bind(status.map(|s| s.code()))
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/// Quantity per goods name over completed orders in `[start, end)`
///
/// Ordered by quantity desc, then name asc.
pub async fn top_goods(
    pool: &SqlitePool,
    start: i64,
    end: i64,
    limit: i64,
) -> RepoResult<Vec<GoodsSales>> {
    let rows = sqlx::query_as::<_, (String, i64)>(
        "SELECT oi.name, COALESCE(SUM(oi.quantity), 0) AS number \
         FROM order_item oi JOIN orders o ON o.id = oi.order_id \
         WHERE o.status = ? AND o.order_time >= ? AND o.order_time < ? \
         GROUP BY oi.name ORDER BY number DESC, oi.name ASC LIMIT ?",
    )
    .bind(OrderStatus::Completed.code())
    .bind(start)
    .bind(end)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows
        .into_iter()
        .map(|(name, number)| GoodsSales { name, number })
        .collect())
}
