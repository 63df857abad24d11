//! Auth API Handlers

use axum::{Json, extract::State};
use shared::error::{AppError, ErrorCode};
use shared::models::{AuthResponse, LoginRequest, ProfileUpdate, User, UserRegister, UserRole};

use crate::auth::{CurrentUser, hash_password, verify_password};
use crate::db::repository::RepoError;
use crate::db::repository::user as user_repo;
use crate::error::{ServiceError, ServiceResult};
use crate::notify::{EmailTemplate, send_in_background};
use crate::security_log;
use crate::state::AppState;
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_PASSWORD_LEN, MAX_PROFILE_ADDRESS_LEN, MIN_PASSWORD_LEN, normalize_phone,
    validate_email, validate_optional_text, validate_required_text,
};

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<UserRegister>,
) -> ServiceResult<Json<AuthResponse>> {
    let email = req.email.trim().to_lowercase();
    validate_required_text(&req.name, "name", MAX_NAME_LEN)?;
    validate_email(&email)?;
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::with_message(
            ErrorCode::PasswordTooShort,
            format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
        )
        .into());
    }
    if req.password.len() > MAX_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "password is too long (max {MAX_PASSWORD_LEN})"
        ))
        .into());
    }
    let phone = match req.phone.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        Some(p) => Some(normalize_phone(p).ok_or_else(invalid_phone)?),
        None => None,
    };

    let password_hash = hash_password(&req.password)
        .map_err(|e| AppError::internal(format!("Failed to hash password: {e}")))?;
    let name = req.name.trim();
    let user = user_repo::create(
        &state.db.pool,
        user_repo::NewUser {
            name,
            email: &email,
            password_hash: &password_hash,
            role: UserRole::Customer,
            phone: phone.as_deref(),
        },
    )
    .await
    .map_err(|e| match e {
        RepoError::Duplicate(_) => {
            security_log!(WARN, "register_duplicate_email", email = %email);
            ServiceError::App(AppError::with_message(
                ErrorCode::EmailAlreadyRegistered,
                "An account with this email already exists",
            ))
        }
        other => ServiceError::from(other),
    })?;

    let token = issue_token(&state, &user)?;
    security_log!(INFO, "user_registered", user_id = user.id, email = %user.email);
    send_in_background(
        state.mailer.clone(),
        user.email.clone(),
        EmailTemplate::Welcome {
            name: user.name.clone(),
        },
    );

    Ok(Json(AuthResponse { token, user }))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ServiceResult<Json<AuthResponse>> {
    let email = req.email.trim().to_lowercase();

    // Same error for unknown email and wrong password
    let Some(credentials) = user_repo::find_credentials(&state.db.pool, &email).await? else {
        security_log!(WARN, "login_failed", email = %email, reason = "unknown_email");
        return Err(AppError::invalid_credentials().into());
    };
    if !verify_password(&req.password, &credentials.password_hash) {
        security_log!(WARN, "login_failed", email = %email, reason = "invalid_password");
        return Err(AppError::invalid_credentials().into());
    }

    let user = user_repo::find_by_id(&state.db.pool, credentials.id)
        .await?
        .ok_or_else(AppError::invalid_credentials)?;
    let token = issue_token(&state, &user)?;
    security_log!(INFO, "login_success", user_id = user.id);

    Ok(Json(AuthResponse { token, user }))
}

/// GET /api/auth/me
pub async fn me(State(state): State<AppState>, current: CurrentUser) -> ServiceResult<Json<User>> {
    let user = user_repo::find_by_id(&state.db.pool, current.id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("User {}", current.id)))?;
    Ok(Json(user))
}

/// PUT /api/auth/profile
///
/// Absent fields are kept. An empty `phone` or `address` clears it.
pub async fn update_profile(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(req): Json<ProfileUpdate>,
) -> ServiceResult<Json<User>> {
    let name = req.name.as_deref().map(str::trim);
    if let Some(name) = name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    let phone = match req.phone.as_deref().map(str::trim) {
        Some("") => Some(String::new()),
        Some(p) => Some(normalize_phone(p).ok_or_else(invalid_phone)?),
        None => None,
    };
    let address = req.address.as_deref().map(str::trim).map(str::to_string);
    validate_optional_text(&address, "address", MAX_PROFILE_ADDRESS_LEN)?;

    let user = user_repo::update_profile(
        &state.db.pool,
        current.id,
        user_repo::ProfileChanges {
            name,
            phone: phone.as_deref(),
            address: address.as_deref(),
        },
    )
    .await?
    .ok_or_else(|| AppError::not_found(format!("User {}", current.id)))?;

    tracing::info!(user_id = user.id, "Profile updated");
    Ok(Json(user))
}

fn invalid_phone() -> AppError {
    AppError::validation("phone must be a 10 digit number, optionally prefixed with +91")
}

fn issue_token(state: &AppState, user: &User) -> Result<String, AppError> {
    state
        .jwt
        .generate_token(user.id, &user.email, user.role)
        .map_err(|e| AppError::internal(e.to_string()))
}
