//! Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::models::{
    Order, OrderCancel, OrderCreate, OrderPage, OrderStatusUpdate, OtpIssued, OtpVerify,
};

use crate::auth::CurrentUser;
use crate::error::ServiceResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<String>,
}

/// POST /api/orders
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<OrderCreate>,
) -> ServiceResult<Json<Order>> {
    let order = state.orders.create_order(&user, payload).await?;
    Ok(Json(order))
}

/// POST /api/orders/verify-otp
pub async fn verify_otp(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<OtpVerify>,
) -> ServiceResult<Json<Order>> {
    let order = state
        .orders
        .verify_otp(&user, payload.order_id, &payload.otp)
        .await?;
    Ok(Json(order))
}

/// POST /api/orders/{id}/resend-otp
pub async fn resend_otp(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> ServiceResult<Json<OtpIssued>> {
    Ok(Json(state.orders.resend_otp(&user, id).await?))
}

/// GET /api/orders/my-orders
pub async fn list_mine(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> ServiceResult<Json<OrderPage>> {
    let page = state
        .orders
        .list_my_orders(&user, query.page, query.limit)
        .await?;
    Ok(Json(page))
}

/// GET /api/orders/{id} - owner or admin
pub async fn get_by_id(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> ServiceResult<Json<Order>> {
    Ok(Json(state.orders.get_order(&user, id).await?))
}

/// PATCH /api/orders/{id}/cancel - owner only
pub async fn cancel(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    payload: Option<Json<OrderCancel>>,
) -> ServiceResult<Json<Order>> {
    let reason = payload.and_then(|Json(p)| p.reason);
    Ok(Json(state.orders.cancel_order(&user, id, reason).await?))
}

/// GET /api/orders - admin
pub async fn list_all(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ServiceResult<Json<OrderPage>> {
    let page = state
        .orders
        .list_orders(query.page, query.limit, query.status.as_deref())
        .await?;
    Ok(Json(page))
}

/// PATCH /api/orders/{id}/status - admin
pub async fn update_status(
    State(state): State<AppState>,
    admin: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<OrderStatusUpdate>,
) -> ServiceResult<Json<Order>> {
    let order = state.orders.update_status(id, payload).await?;
    tracing::info!(order_id = id, admin_id = admin.id, status = %order.status, "Admin updated order status");
    Ok(Json(order))
}
