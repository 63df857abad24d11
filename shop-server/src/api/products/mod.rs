//! Product API
//!
//! Catalog reads are public; writes need an admin.

mod handler;

use axum::{
    Router, middleware,
    routing::{get, patch, post, put},
};

use crate::auth::require_admin;
use crate::state::AppState;

pub fn router(state: &AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/api/products", get(handler::list))
        .route("/api/products/categories", get(handler::categories))
        .route("/api/products/{id}", get(handler::get_by_id));

    let admin = Router::new()
        .route("/api/products", post(handler::create))
        .route(
            "/api/products/{id}",
            put(handler::update).delete(handler::delete),
        )
        .route("/api/products/{id}/stock", patch(handler::update_stock))
        .layer(middleware::from_fn_with_state(state.clone(), require_admin));

    public.merge(admin)
}
