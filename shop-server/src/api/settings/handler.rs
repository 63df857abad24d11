//! Site Settings API Handlers

use axum::{Json, extract::State};
use shared::error::{AppError, ErrorCode};
use shared::models::{SiteSettingsRecord, SiteSettingsUpdate};

use crate::auth::CurrentUser;
use crate::db::repository::site_settings as settings_repo;
use crate::error::ServiceResult;
use crate::state::AppState;
use crate::utils::validation::validate_site_settings;

/// GET /api/settings
pub async fn get(State(state): State<AppState>) -> ServiceResult<Json<SiteSettingsRecord>> {
    Ok(Json(settings_repo::get(&state.db.pool).await?))
}

/// PUT /api/settings - stale `expected_version` is a conflict
pub async fn replace(
    State(state): State<AppState>,
    admin: CurrentUser,
    Json(payload): Json<SiteSettingsUpdate>,
) -> ServiceResult<Json<SiteSettingsRecord>> {
    validate_site_settings(&payload.settings)?;

    let Some(record) = settings_repo::replace(
        &state.db.pool,
        payload.expected_version,
        &payload.settings,
        admin.id,
    )
    .await?
    else {
        let current = settings_repo::get(&state.db.pool).await?;
        return Err(AppError::with_message(
            ErrorCode::VersionConflict,
            format!(
                "Settings were changed by someone else (version {} is current, {} was edited)",
                current.version, payload.expected_version
            ),
        )
        .with_detail("current_version", current.version)
        .into());
    };

    tracing::info!(version = record.version, admin_id = admin.id, "Site settings updated");
    Ok(Json(record))
}
