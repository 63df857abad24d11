//! Product API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{CategoryList, Product, ProductCreate, ProductPage, ProductUpdate, StockUpdate};

use crate::auth::CurrentUser;
use crate::db::repository::{RepoError, paginate, product as product_repo};
use crate::error::{ServiceError, ServiceResult};
use crate::state::AppState;
use crate::utils::validation::{
    MAX_DESCRIPTION_LEN, MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, validate_optional_text,
    validate_required_text,
};

const DEFAULT_PAGE_SIZE: u32 = 20;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// GET /api/products - active products, newest first
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ServiceResult<Json<ProductPage>> {
    let (page, limit, offset) = paginate(query.page, query.limit, DEFAULT_PAGE_SIZE);
    let products = product_repo::find_active(&state.db.pool, limit, offset).await?;
    let total = product_repo::count_active(&state.db.pool).await?;
    Ok(Json(ProductPage {
        products,
        page,
        limit,
        total,
    }))
}

/// GET /api/products/categories
pub async fn categories(State(state): State<AppState>) -> ServiceResult<Json<CategoryList>> {
    let categories = product_repo::categories(&state.db.pool).await?;
    Ok(Json(CategoryList { categories }))
}

/// GET /api/products/{id} - inactive products are hidden
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ServiceResult<Json<Product>> {
    let product = product_repo::find_by_id(&state.db.pool, id)
        .await?
        .filter(|p| p.is_active)
        .ok_or_else(|| not_found(id))?;
    Ok(Json(product))
}

/// POST /api/products
pub async fn create(
    State(state): State<AppState>,
    admin: CurrentUser,
    Json(payload): Json<ProductCreate>,
) -> ServiceResult<Json<Product>> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_required_text(&payload.category, "category", MAX_SHORT_TEXT_LEN)?;
    if payload.description.len() > MAX_DESCRIPTION_LEN {
        return Err(AppError::validation(format!(
            "description is too long (max {MAX_DESCRIPTION_LEN})"
        ))
        .into());
    }

    let product = product_repo::create(&state.db.pool, payload)
        .await
        .map_err(price_error)?;
    tracing::info!(product_id = product.id, admin_id = admin.id, "Product created");
    Ok(Json(product))
}

/// PUT /api/products/{id} - partial update, stock included
pub async fn update(
    State(state): State<AppState>,
    admin: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<ProductUpdate>,
) -> ServiceResult<Json<Product>> {
    if let Some(name) = &payload.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    if let Some(category) = &payload.category {
        validate_required_text(category, "category", MAX_SHORT_TEXT_LEN)?;
    }
    validate_optional_text(&payload.description, "description", MAX_DESCRIPTION_LEN)?;

    let product = product_repo::update(&state.db.pool, id, payload)
        .await
        .map_err(|e| match e {
            RepoError::NotFound(_) => not_found(id).into(),
            other => price_error(other),
        })?;
    tracing::info!(product_id = id, admin_id = admin.id, "Product updated");
    Ok(Json(product))
}

/// PATCH /api/products/{id}/stock
pub async fn update_stock(
    State(state): State<AppState>,
    admin: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<StockUpdate>,
) -> ServiceResult<Json<Product>> {
    let product = product_repo::set_stock(&state.db.pool, id, payload.stock)
        .await
        .map_err(|e| match e {
            RepoError::NotFound(_) => ServiceError::from(not_found(id)),
            other => other.into(),
        })?;
    tracing::info!(product_id = id, admin_id = admin.id, stock = product.stock, "Product stock set");
    Ok(Json(product))
}

/// DELETE /api/products/{id} - soft delete
pub async fn delete(
    State(state): State<AppState>,
    admin: CurrentUser,
    Path(id): Path<i64>,
) -> ServiceResult<Json<bool>> {
    if !product_repo::deactivate(&state.db.pool, id).await? {
        return Err(not_found(id).into());
    }
    tracing::info!(product_id = id, admin_id = admin.id, "Product deactivated");
    Ok(Json(true))
}

fn not_found(id: i64) -> AppError {
    AppError::with_message(ErrorCode::ProductNotFound, format!("Product {id} not found"))
        .with_detail("product_id", id)
}

/// Price problems get their own code; everything else passes through
fn price_error(err: RepoError) -> ServiceError {
    match err {
        RepoError::Validation(msg) if msg.contains("price") => {
            AppError::with_message(ErrorCode::ProductInvalidPrice, msg).into()
        }
        other => other.into(),
    }
}
