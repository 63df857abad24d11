//! Application state shared by all handlers

use shared::error::AppError;
use shared::models::UserRole;
use std::sync::Arc;
use std::time::Instant;

use crate::auth::{JwtService, hash_password};
use crate::config::{Config, MailMode};
use crate::db::DbService;
use crate::db::repository::user as user_repo;
use crate::error::BoxError;
use crate::live::RoomHub;
use crate::notify::{LogMailer, Mailer, OrderEventBus, SesMailer};
use crate::orders::OrdersManager;

#[derive(Clone)]
pub struct AppState {
    pub db: DbService,
    pub jwt: Arc<JwtService>,
    /// Outgoing email (SES, log or recording)
    pub mailer: Arc<dyn Mailer>,
    /// Order lifecycle events; subscribers are started by `notify::spawn_workers`
    pub events: OrderEventBus,
    /// Live WebSocket rooms
    pub rooms: RoomHub,
    pub orders: OrdersManager,
    pub started_at: Instant,
}

impl AppState {
    /// Open the database and pick the mailer from config
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let db = DbService::new(&config.database_url).await?;

        let mailer: Arc<dyn Mailer> = match config.mail_mode {
            MailMode::Ses => {
                tracing::info!(from = %config.ses_from_email, "Email delivery via SES");
                Arc::new(SesMailer::from_env(config.ses_from_email.clone()).await)
            }
            MailMode::Log => {
                tracing::info!("Email delivery disabled, emails are logged");
                Arc::new(LogMailer)
            }
        };

        Ok(Self::from_parts(db, mailer, config))
    }

    /// Assemble state around an existing database and mailer
    pub fn from_parts(db: DbService, mailer: Arc<dyn Mailer>, config: &Config) -> Self {
        let events = OrderEventBus::new();
        let orders = OrdersManager::new(
            db.pool.clone(),
            events.clone(),
            mailer.clone(),
            config.otp_policy(),
        );
        Self {
            jwt: Arc::new(JwtService::with_config(config.jwt_config())),
            db,
            mailer,
            events,
            rooms: RoomHub::new(),
            orders,
            started_at: Instant::now(),
        }
    }

    /// Create the configured admin account if it does not exist yet
    pub async fn ensure_bootstrap_admin(&self, config: &Config) -> Result<(), AppError> {
        let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
            return Ok(());
        };
        let email = email.trim().to_lowercase();

        if user_repo::find_by_email(&self.db.pool, &email).await?.is_some() {
            tracing::debug!(email = %email, "Bootstrap admin already exists");
            return Ok(());
        }

        let password_hash = hash_password(password)
            .map_err(|e| AppError::internal(format!("Failed to hash admin password: {e}")))?;
        let admin = user_repo::create(
            &self.db.pool,
            user_repo::NewUser {
                name: "Administrator",
                email: &email,
                password_hash: &password_hash,
                role: UserRole::Admin,
                phone: None,
            },
        )
        .await?;

        crate::security_log!(INFO, "bootstrap_admin_created", user_id = admin.id, email = %email);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bootstrap_admin_is_idempotent() {
        let db = DbService::in_memory().await.unwrap();
        let config = Config {
            admin_email: Some("Admin@Example.com".into()),
            admin_password: Some("correct horse battery".into()),
            ..Config::default()
        };
        let state = AppState::from_parts(db, Arc::new(LogMailer), &config);

        state.ensure_bootstrap_admin(&config).await.unwrap();
        state.ensure_bootstrap_admin(&config).await.unwrap();

        let admin = user_repo::find_by_email(&state.db.pool, "admin@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(admin.role, UserRole::Admin);
    }
}
