//! Order Repository
//!
//! Orders, their line items and the append-only tracking log. Writes that
//! are part of a lifecycle step take a `&mut SqliteConnection` so the
//! caller can run them inside one transaction.

use super::{RepoError, RepoResult};
use shared::models::{
    Order, OrderItem, OrderStatus, PaymentDetails, PaymentMethod, ShippingAddress, TrackingEntry,
};
use sqlx::types::Json;
use sqlx::{SqliteConnection, SqlitePool};

const ORDER_SELECT: &str = "SELECT id, user_id, total, status, shipping_address, payment_method, payment_status, payment_details, otp_verified, notes, cancellation_reason, estimated_delivery, actual_delivery, created_at, updated_at FROM orders";

/// Insert payload for a fresh pending order
pub struct NewOrder<'a> {
    pub id: i64,
    pub user_id: i64,
    pub items: &'a [OrderItem],
    pub total: i64,
    pub shipping_address: &'a ShippingAddress,
    pub payment_method: PaymentMethod,
    pub payment_details: Option<&'a PaymentDetails>,
    pub notes: Option<&'a str>,
    pub otp_hash: &'a str,
    pub otp_expires_at: i64,
    pub created_at: i64,
}

/// Ownership and status columns, enough for authorization checks
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderHead {
    pub id: i64,
    pub user_id: i64,
    pub status: OrderStatus,
    pub otp_verified: bool,
}

/// Confirmation credential of one order
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OtpState {
    pub user_id: i64,
    pub status: OrderStatus,
    pub otp_verified: bool,
    pub otp_hash: Option<String>,
    pub otp_expires_at: Option<i64>,
    pub otp_attempts: i64,
}

pub async fn insert(conn: &mut SqliteConnection, order: &NewOrder<'_>) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO orders (id, user_id, total, status, shipping_address, payment_method, payment_status, payment_details, otp_hash, otp_expires_at, otp_attempts, otp_verified, notes, created_at, updated_at) VALUES (?1, ?2, ?3, 'pending', ?4, ?5, 'pending', ?6, ?7, ?8, 0, 0, ?9, ?10, ?10)",
    )
    .bind(order.id)
    .bind(order.user_id)
    .bind(order.total)
    .bind(Json(order.shipping_address))
    .bind(order.payment_method)
    .bind(Json(order.payment_details))
    .bind(order.otp_hash)
    .bind(order.otp_expires_at)
    .bind(order.notes)
    .bind(order.created_at)
    .execute(&mut *conn)
    .await?;

    for (line_no, item) in order.items.iter().enumerate() {
        sqlx::query(
            "INSERT INTO order_item (order_id, line_no, product_id, name, quantity, unit_price) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(order.id)
        .bind(line_no as i64)
        .bind(item.product_id)
        .bind(&item.name)
        .bind(item.quantity)
        .bind(item.unit_price)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Append one tracking entry; `seq` continues from the current maximum
pub async fn append_tracking(
    conn: &mut SqliteConnection,
    order_id: i64,
    status: &str,
    location: &str,
    description: &str,
    timestamp: i64,
) -> RepoResult<TrackingEntry> {
    let entry = sqlx::query_as::<_, TrackingEntry>(
        "INSERT INTO order_tracking (order_id, seq, status, location, description, timestamp) SELECT ?1, COALESCE(MAX(seq), 0) + 1, ?2, ?3, ?4, ?5 FROM order_tracking WHERE order_id = ?1 RETURNING seq, status, location, description, timestamp",
    )
    .bind(order_id)
    .bind(status)
    .bind(location)
    .bind(description)
    .bind(timestamp)
    .fetch_one(&mut *conn)
    .await?;
    Ok(entry)
}

/// Compare-and-set the status column
///
/// Returns false when the order is no longer in `from`. Moving to
/// `delivered` stamps `actual_delivery`; `cancellation_reason` is only
/// written when given.
pub async fn transition_status(
    conn: &mut SqliteConnection,
    order_id: i64,
    from: OrderStatus,
    to: OrderStatus,
    cancellation_reason: Option<&str>,
    estimated_delivery: Option<i64>,
    now: i64,
) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE orders SET status = ?1, updated_at = ?2, actual_delivery = CASE WHEN ?1 = 'delivered' THEN ?2 ELSE actual_delivery END, cancellation_reason = COALESCE(?3, cancellation_reason), estimated_delivery = COALESCE(?6, estimated_delivery) WHERE id = ?4 AND status = ?5",
    )
    .bind(to)
    .bind(now)
    .bind(cancellation_reason)
    .bind(order_id)
    .bind(from)
    .bind(estimated_delivery)
    .execute(&mut *conn)
    .await?;
    Ok(rows.rows_affected() == 1)
}

/// Mark the OTP verified, clear it, and confirm the order in one statement
///
/// Only succeeds from `pending` with an unverified code.
pub async fn confirm_verified(
    conn: &mut SqliteConnection,
    order_id: i64,
    now: i64,
) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE orders SET otp_verified = 1, otp_hash = NULL, otp_expires_at = NULL, status = 'confirmed', updated_at = ?1 WHERE id = ?2 AND status = 'pending' AND otp_verified = 0",
    )
    .bind(now)
    .bind(order_id)
    .execute(&mut *conn)
    .await?;
    Ok(rows.rows_affected() == 1)
}

pub async fn find_otp_state(pool: &SqlitePool, order_id: i64) -> RepoResult<Option<OtpState>> {
    let row = sqlx::query_as::<_, OtpState>(
        "SELECT user_id, status, otp_verified, otp_hash, otp_expires_at, otp_attempts FROM orders WHERE id = ?",
    )
    .bind(order_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn record_failed_otp(pool: &SqlitePool, order_id: i64) -> RepoResult<()> {
    sqlx::query("UPDATE orders SET otp_attempts = otp_attempts + 1 WHERE id = ?")
        .bind(order_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Replace the code of a still-unverified order and reset its attempt counter
pub async fn replace_otp(
    pool: &SqlitePool,
    order_id: i64,
    otp_hash: &str,
    otp_expires_at: i64,
) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE orders SET otp_hash = ?1, otp_expires_at = ?2, otp_attempts = 0 WHERE id = ?3 AND status = 'pending' AND otp_verified = 0",
    )
    .bind(otp_hash)
    .bind(otp_expires_at)
    .bind(order_id)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() == 1)
}

pub async fn find_head(pool: &SqlitePool, order_id: i64) -> RepoResult<Option<OrderHead>> {
    let row = sqlx::query_as::<_, OrderHead>(
        "SELECT id, user_id, status, otp_verified FROM orders WHERE id = ?",
    )
    .bind(order_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn find_head_in(
    conn: &mut SqliteConnection,
    order_id: i64,
) -> RepoResult<Option<OrderHead>> {
    let row = sqlx::query_as::<_, OrderHead>(
        "SELECT id, user_id, status, otp_verified FROM orders WHERE id = ?",
    )
    .bind(order_id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(row)
}

pub async fn find_items(conn: &mut SqliteConnection, order_id: i64) -> RepoResult<Vec<OrderItem>> {
    let rows = sqlx::query_as::<_, OrderItem>(
        "SELECT product_id, name, quantity, unit_price FROM order_item WHERE order_id = ? ORDER BY line_no",
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}

pub async fn find_tracking(pool: &SqlitePool, order_id: i64) -> RepoResult<Vec<TrackingEntry>> {
    let rows = sqlx::query_as::<_, TrackingEntry>(
        "SELECT seq, status, location, description, timestamp FROM order_tracking WHERE order_id = ? ORDER BY seq",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Full order with items and tracking history
pub async fn find_by_id(pool: &SqlitePool, order_id: i64) -> RepoResult<Option<Order>> {
    let sql = format!("{ORDER_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Order>(&sql)
        .bind(order_id)
        .fetch_optional(pool)
        .await?;
    match row {
        Some(order) => Ok(Some(hydrate(pool, order).await?)),
        None => Ok(None),
    }
}

pub async fn find_by_user(
    pool: &SqlitePool,
    user_id: i64,
    limit: u32,
    offset: i64,
) -> RepoResult<Vec<Order>> {
    let sql = format!("{ORDER_SELECT} WHERE user_id = ? ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?");
    let rows = sqlx::query_as::<_, Order>(&sql)
        .bind(user_id)
        .bind(i64::from(limit))
        .bind(offset)
        .fetch_all(pool)
        .await?;
    hydrate_all(pool, rows).await
}

pub async fn count_by_user(pool: &SqlitePool, user_id: i64) -> RepoResult<i64> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// All orders, optionally filtered by status, newest first
pub async fn find_all(
    pool: &SqlitePool,
    status: Option<OrderStatus>,
    limit: u32,
    offset: i64,
) -> RepoResult<Vec<Order>> {
    let sql = format!(
        "{ORDER_SELECT} WHERE (?1 IS NULL OR status = ?1) ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3"
    );
    let rows = sqlx::query_as::<_, Order>(&sql)
        .bind(status)
        .bind(i64::from(limit))
        .bind(offset)
        .fetch_all(pool)
        .await?;
    hydrate_all(pool, rows).await
}

pub async fn count_all(pool: &SqlitePool, status: Option<OrderStatus>) -> RepoResult<i64> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE (?1 IS NULL OR status = ?1)")
        .bind(status)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

async fn hydrate(pool: &SqlitePool, mut order: Order) -> RepoResult<Order> {
    let mut conn = pool.acquire().await.map_err(RepoError::from)?;
    order.items = find_items(&mut conn, order.id).await?;
    drop(conn);
    order.tracking = find_tracking(pool, order.id).await?;
    Ok(order)
}

async fn hydrate_all(pool: &SqlitePool, orders: Vec<Order>) -> RepoResult<Vec<Order>> {
    let mut out = Vec::with_capacity(orders.len());
    for order in orders {
        out.push(hydrate(pool, order).await?);
    }
    Ok(out)
}
