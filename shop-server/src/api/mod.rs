//! HTTP API
//!
//! | Prefix | Auth |
//! |--------|------|
//! | /health | none |
//! | /api/auth | register/login public, `me` bearer |
//! | /api/products | reads public, writes admin |
//! | /api/orders | bearer; list-all and status admin |
//! | /api/settings | read public, write admin |
//! | /ws | JWT in `?token=` |

pub mod auth;
pub mod health;
pub mod orders;
pub mod products;
pub mod settings;

use axum::Router;
use axum::routing::get;
use http::{HeaderName, HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::live::ws::handle_live_ws;
use crate::state::AppState;

const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// All routes, no middleware
pub fn build_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(products::router(state))
        .merge(orders::router(state))
        .merge(settings::router(state))
        .route("/ws", get(handle_live_ws))
}

/// Routes with CORS, tracing and request ids, bound to `state`
///
/// Used by the server and by router tests through `oneshot`.
pub fn build_app(state: AppState, cors_origin: Option<&str>) -> Router {
    build_router(&state)
        .layer(cors_layer(cors_origin))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static(REQUEST_ID_HEADER),
            XRequestId,
        ))
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            REQUEST_ID_HEADER,
        )))
        .with_state(state)
}

/// One configured origin, or any origin when unset
fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers(Any);
    match origin.and_then(|o| HeaderValue::from_str(o).ok()) {
        Some(origin) => base.allow_origin(origin),
        None => base.allow_origin(Any),
    }
}
