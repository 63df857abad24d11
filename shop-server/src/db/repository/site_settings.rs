//! Site Settings Repository
//!
//! Single versioned row. Writes are compare-and-set on `version`.

use super::{RepoError, RepoResult};
use shared::models::{SiteSettings, SiteSettingsRecord};
use sqlx::SqlitePool;
use sqlx::types::Json;

pub async fn get(pool: &SqlitePool) -> RepoResult<SiteSettingsRecord> {
    let row = sqlx::query_as::<_, SiteSettingsRecord>(
        "SELECT version, settings, updated_at, updated_by FROM site_settings WHERE id = 1",
    )
    .fetch_optional(pool)
    .await?;
    row.ok_or_else(|| RepoError::NotFound("Site settings not initialized".into()))
}

/// Replace the document if it is still at `expected_version`
///
/// Returns `None` when another write got there first.
pub async fn replace(
    pool: &SqlitePool,
    expected_version: i64,
    settings: &SiteSettings,
    updated_by: i64,
) -> RepoResult<Option<SiteSettingsRecord>> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE site_settings SET version = version + 1, settings = ?1, updated_at = ?2, updated_by = ?3 WHERE id = 1 AND version = ?4",
    )
    .bind(Json(settings))
    .bind(now)
    .bind(updated_by)
    .bind(expected_version)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Ok(None);
    }
    get(pool).await.map(Some)
}
