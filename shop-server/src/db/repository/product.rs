//! Product Repository

use super::{RepoError, RepoResult};
use shared::models::{Product, ProductCreate, ProductUpdate};
use sqlx::SqlitePool;
use sqlx::types::Json;

const PRODUCT_SELECT: &str = "SELECT id, name, description, price, original_price, images, category, stock, stock > 0 AS in_stock, features, tags, is_featured, is_active, created_at, updated_at FROM product";

pub async fn find_active(pool: &SqlitePool, limit: u32, offset: i64) -> RepoResult<Vec<Product>> {
    let sql = format!(
        "{PRODUCT_SELECT} WHERE is_active = 1 ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
    );
    let rows = sqlx::query_as::<_, Product>(&sql)
        .bind(i64::from(limit))
        .bind(offset)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn count_active(pool: &SqlitePool) -> RepoResult<i64> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM product WHERE is_active = 1")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Distinct categories of active products, sorted
pub async fn categories(pool: &SqlitePool) -> RepoResult<Vec<String>> {
    let rows = sqlx::query_scalar(
        "SELECT DISTINCT category FROM product WHERE is_active = 1 ORDER BY category",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Find by id, including inactive products
pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Product>> {
    let sql = format!("{PRODUCT_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn create(pool: &SqlitePool, data: ProductCreate) -> RepoResult<Product> {
    validate_price(data.price, data.original_price)?;
    if data.stock < 0 {
        return Err(RepoError::Validation("stock must not be negative".into()));
    }
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO product (id, name, description, price, original_price, images, category, stock, features, tags, is_featured, is_active, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 1, ?12, ?12)",
    )
    .bind(id)
    .bind(&data.name)
    .bind(&data.description)
    .bind(data.price)
    .bind(data.original_price)
    .bind(Json(&data.images))
    .bind(&data.category)
    .bind(data.stock)
    .bind(Json(&data.features))
    .bind(Json(&data.tags))
    .bind(data.is_featured)
    .bind(now)
    .execute(pool)
    .await?;
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create product".into()))
}

/// Partial update; absent fields keep their current value
pub async fn update(pool: &SqlitePool, id: i64, data: ProductUpdate) -> RepoResult<Product> {
    if let Some(price) = data.price {
        validate_price(price, data.original_price)?;
    }
    if data.stock.is_some_and(|s| s < 0) {
        return Err(RepoError::Validation("stock must not be negative".into()));
    }
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE product SET name = COALESCE(?1, name), description = COALESCE(?2, description), price = COALESCE(?3, price), original_price = COALESCE(?4, original_price), images = COALESCE(?5, images), category = COALESCE(?6, category), stock = COALESCE(?7, stock), features = COALESCE(?8, features), tags = COALESCE(?9, tags), is_featured = COALESCE(?10, is_featured), is_active = COALESCE(?11, is_active), updated_at = ?12 WHERE id = ?13",
    )
    .bind(data.name)
    .bind(data.description)
    .bind(data.price)
    .bind(data.original_price)
    .bind(data.images.map(Json))
    .bind(data.category)
    .bind(data.stock)
    .bind(data.features.map(Json))
    .bind(data.tags.map(Json))
    .bind(data.is_featured)
    .bind(data.is_active)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Product {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Product {id} not found")))
}

/// Overwrite the stock count; `in_stock` follows from it
pub async fn set_stock(pool: &SqlitePool, id: i64, stock: i64) -> RepoResult<Product> {
    if stock < 0 {
        return Err(RepoError::Validation("stock must not be negative".into()));
    }
    let now = shared::util::now_millis();
    let rows = sqlx::query("UPDATE product SET stock = ?, updated_at = ? WHERE id = ?")
        .bind(stock)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Product {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Product {id} not found")))
}

/// Soft delete: the row stays for order history but can no longer be ordered
pub async fn deactivate(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query("UPDATE product SET is_active = 0, updated_at = ? WHERE id = ? AND is_active = 1")
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

fn validate_price(price: i64, original_price: Option<i64>) -> RepoResult<()> {
    if price < 0 {
        return Err(RepoError::Validation("price must not be negative".into()));
    }
    if original_price.is_some_and(|p| p < 0) {
        return Err(RepoError::Validation(
            "original_price must not be negative".into(),
        ));
    }
    Ok(())
}
