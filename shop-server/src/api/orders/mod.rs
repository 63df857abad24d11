//! Order API
//!
//! Customer routes are scoped to the caller's own orders; listing all
//! orders and changing status need an admin. All mutations go through
//! [`OrdersManager`](crate::orders::OrdersManager).

mod handler;

use axum::{
    Router, middleware,
    routing::{get, patch, post},
};

use crate::auth::require_admin;
use crate::state::AppState;

pub fn router(state: &AppState) -> Router<AppState> {
    let customer = Router::new()
        .route("/api/orders", post(handler::create))
        .route("/api/orders/verify-otp", post(handler::verify_otp))
        .route("/api/orders/my-orders", get(handler::list_mine))
        .route("/api/orders/{id}", get(handler::get_by_id))
        .route("/api/orders/{id}/resend-otp", post(handler::resend_otp))
        .route("/api/orders/{id}/cancel", patch(handler::cancel));

    let admin = Router::new()
        .route("/api/orders", get(handler::list_all))
        .route("/api/orders/{id}/status", patch(handler::update_status))
        .layer(middleware::from_fn_with_state(state.clone(), require_admin));

    customer.merge(admin)
}
