//! Inventory ledger
//!
//! Per-product stock counter. Reservation is one conditional `UPDATE`, so
//! stock can never go negative and concurrent checkouts cannot oversell.
//! Both operations take a connection so they compose into the caller's
//! transaction.

use sqlx::SqliteConnection;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("Product {0} not found")]
    ProductNotFound(i64),

    #[error("Insufficient stock for {name}: {available} available, {requested} requested")]
    InsufficientStock {
        product_id: i64,
        name: String,
        available: i64,
        requested: i64,
    },

    #[error("Inventory database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// What a successful reservation saw, for snapshotting into the order line
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Reserved {
    pub name: String,
    pub price: i64,
    /// Stock left after the reservation
    pub stock: i64,
}

/// Take `quantity` units of an active product
pub async fn reserve(
    conn: &mut SqliteConnection,
    product_id: i64,
    quantity: i64,
) -> Result<Reserved, InventoryError> {
    let now = shared::util::now_millis();
    let reserved = sqlx::query_as::<_, Reserved>(
        "UPDATE product SET stock = stock - ?1, updated_at = ?2 WHERE id = ?3 AND is_active = 1 AND stock >= ?1 RETURNING name, price, stock",
    )
    .bind(quantity)
    .bind(now)
    .bind(product_id)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(reserved) = reserved {
        return Ok(reserved);
    }

    // Nothing changed: tell a missing product apart from a short one
    let current: Option<(String, i64)> =
        sqlx::query_as("SELECT name, stock FROM product WHERE id = ? AND is_active = 1")
            .bind(product_id)
            .fetch_optional(&mut *conn)
            .await?;
    match current {
        None => Err(InventoryError::ProductNotFound(product_id)),
        Some((name, available)) => Err(InventoryError::InsufficientStock {
            product_id,
            name,
            available,
            requested: quantity,
        }),
    }
}

/// Return `quantity` units to a product, active or not
pub async fn release(
    conn: &mut SqliteConnection,
    product_id: i64,
    quantity: i64,
) -> Result<(), InventoryError> {
    let now = shared::util::now_millis();
    let rows = sqlx::query("UPDATE product SET stock = stock + ?1, updated_at = ?2 WHERE id = ?3")
        .bind(quantity)
        .bind(now)
        .bind(product_id)
        .execute(&mut *conn)
        .await?;
    if rows.rows_affected() == 0 {
        tracing::warn!(product_id, quantity, "Released stock for a product that no longer exists");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use crate::db::repository::product;
    use shared::models::ProductCreate;

    async fn seed(db: &DbService, stock: i64) -> i64 {
        product::create(
            &db.pool,
            ProductCreate {
                name: "Smartwatch".into(),
                description: String::new(),
                price: 1_999_900,
                original_price: None,
                images: vec![],
                category: "electronics".into(),
                stock,
                features: vec![],
                tags: vec![],
                is_featured: false,
            },
        )
        .await
        .unwrap()
        .id
    }

    async fn stock_of(db: &DbService, id: i64) -> i64 {
        sqlx::query_scalar("SELECT stock FROM product WHERE id = ?")
            .bind(id)
            .fetch_one(&db.pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_reserve_decrements() {
        let db = DbService::in_memory().await.unwrap();
        let id = seed(&db, 5).await;
        let mut conn = db.pool.acquire().await.unwrap();

        let reserved = reserve(&mut conn, id, 2).await.unwrap();
        assert_eq!(reserved.stock, 3);
        assert_eq!(reserved.price, 1_999_900);
        drop(conn);
        assert_eq!(stock_of(&db, id).await, 3);
    }

    #[tokio::test]
    async fn test_reserve_exact_stock_reaches_zero() {
        let db = DbService::in_memory().await.unwrap();
        let id = seed(&db, 2).await;
        let mut conn = db.pool.acquire().await.unwrap();
        assert_eq!(reserve(&mut conn, id, 2).await.unwrap().stock, 0);
    }

    #[tokio::test]
    async fn test_insufficient_stock_leaves_counter() {
        let db = DbService::in_memory().await.unwrap();
        let id = seed(&db, 3).await;
        let mut conn = db.pool.acquire().await.unwrap();

        let err = reserve(&mut conn, id, 10).await.unwrap_err();
        match err {
            InventoryError::InsufficientStock {
                available,
                requested,
                ref name,
                ..
            } => {
                assert_eq!(available, 3);
                assert_eq!(requested, 10);
                assert_eq!(name, "Smartwatch");
            }
            other => panic!("unexpected error: {other}"),
        }
        drop(conn);
        assert_eq!(stock_of(&db, id).await, 3);
    }

    #[tokio::test]
    async fn test_inactive_or_missing_product() {
        let db = DbService::in_memory().await.unwrap();
        let id = seed(&db, 3).await;
        product::deactivate(&db.pool, id).await.unwrap();
        let mut conn = db.pool.acquire().await.unwrap();

        assert!(matches!(
            reserve(&mut conn, id, 1).await,
            Err(InventoryError::ProductNotFound(p)) if p == id
        ));
        assert!(matches!(
            reserve(&mut conn, 404, 1).await,
            Err(InventoryError::ProductNotFound(404))
        ));
    }

    #[tokio::test]
    async fn test_release_restores() {
        let db = DbService::in_memory().await.unwrap();
        let id = seed(&db, 5).await;
        let mut conn = db.pool.acquire().await.unwrap();
        reserve(&mut conn, id, 4).await.unwrap();
        release(&mut conn, id, 4).await.unwrap();
        drop(conn);
        assert_eq!(stock_of(&db, id).await, 5);
    }
}
