//! JWT Extractor
//!
//! Validates the bearer token and yields a [`CurrentUser`].

use axum::{extract::FromRequestParts, http::request::Parts};
use http::HeaderMap;
use shared::error::AppError;

use crate::auth::{CurrentUser, JwtError, JwtService};
use crate::security_log;
use crate::state::AppState;

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Already resolved by middleware
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let user = authenticate(&parts.headers, &state.jwt, parts.uri.path())?;
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}

/// Resolve the caller from the `Authorization` header
pub fn authenticate(headers: &HeaderMap, jwt: &JwtService, path: &str) -> Result<CurrentUser, AppError> {
    let auth_header = headers
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) => JwtService::extract_from_header(header)
            .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?,
        None => {
            security_log!(WARN, "auth_missing", path = %path);
            return Err(AppError::not_authenticated());
        }
    };

    authenticate_token(token, jwt, path)
}

/// Resolve the caller from a raw token (WebSocket query parameter)
pub fn authenticate_token(token: &str, jwt: &JwtService, path: &str) -> Result<CurrentUser, AppError> {
    match jwt.validate_token(token) {
        Ok(claims) => CurrentUser::try_from(claims)
            .map_err(|e| AppError::invalid_token(format!("Malformed JWT claims: {e}"))),
        Err(e) => {
            security_log!(WARN, "auth_failed", error = %e, path = %path);
            match e {
                JwtError::ExpiredToken => Err(AppError::token_expired()),
                _ => Err(AppError::invalid_token("Invalid token")),
            }
        }
    }
}
