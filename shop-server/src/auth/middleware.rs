//! Authorization middleware

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use shared::error::{AppError, ErrorCode};

use crate::auth::extractor::authenticate;
use crate::security_log;
use crate::state::AppState;

/// Require an authenticated admin
///
/// Injects the resolved [`CurrentUser`](crate::auth::CurrentUser) into the
/// request extensions so handlers can extract it without re-validating.
///
/// ```ignore
/// Router::new()
///     .route("/", get(handler::list))
///     .layer(middleware::from_fn_with_state(state, require_admin));
/// ```
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if req.method() == http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    let user = authenticate(req.headers(), &state.jwt, req.uri().path())?;
    if !user.is_admin() {
        security_log!(
            WARN,
            "admin_required",
            user_id = user.id,
            path = %req.uri().path()
        );
        return Err(AppError::new(ErrorCode::AdminRequired));
    }

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}
