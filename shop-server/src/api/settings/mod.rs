//! Site settings API
//!
//! One versioned storefront document. Anyone can read it; admins replace it
//! whole, naming the version they edited.

mod handler;

use axum::{
    Router, middleware,
    routing::{get, put},
};

use crate::auth::require_admin;
use crate::state::AppState;

pub fn router(state: &AppState) -> Router<AppState> {
    let public = Router::new().route("/api/settings", get(handler::get));

    let admin = Router::new()
        .route("/api/settings", put(handler::replace))
        .layer(middleware::from_fn_with_state(state.clone(), require_admin));

    public.merge(admin)
}
