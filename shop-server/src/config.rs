//! Storefront server configuration

use crate::auth::{JwtConfig, generate_secure_printable_jwt_secret};
use crate::error::BoxError;
use crate::orders::OtpPolicy;

/// Minimum JWT secret length outside development
const MIN_JWT_SECRET_LEN: usize = 32;

/// How outgoing email is delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailMode {
    /// Write emails to the log (development)
    Log,
    /// Deliver through AWS SES v2
    Ses,
}

impl std::str::FromStr for MailMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "log" => Ok(Self::Log),
            "ses" => Ok(Self::Ses),
            other => Err(format!("MAIL_MODE must be 'log' or 'ses', got '{other}'")),
        }
    }
}

/// Storefront server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite connection URL
    pub database_url: String,
    /// HTTP port (API + WebSocket)
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// JWT signing secret
    pub jwt_secret: String,
    /// Access token lifetime
    pub jwt_expiration_minutes: i64,
    pub mail_mode: MailMode,
    /// SES sender email address
    pub ses_from_email: String,
    /// Order OTP lifetime in seconds
    pub otp_ttl_secs: i64,
    /// Failed OTP attempts allowed per issued code (0 = unlimited)
    pub otp_max_attempts: u32,
    pub log_level: String,
    /// Daily rolling file output when set
    pub log_dir: Option<String>,
    /// Bootstrap admin account created at startup when both are set
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    /// Allowed CORS origin; any origin when unset
    pub cors_origin: Option<String>,
}

impl Default for Config {
    /// Development defaults with an in-memory database
    fn default() -> Self {
        Self {
            database_url: "sqlite::memory:".into(),
            http_port: 8080,
            environment: "development".into(),
            jwt_secret: generate_secure_printable_jwt_secret(),
            jwt_expiration_minutes: 1440,
            mail_mode: MailMode::Log,
            ses_from_email: "noreply@shop.local".into(),
            otp_ttl_secs: 600,
            otp_max_attempts: 5,
            log_level: "info".into(),
            log_dir: None,
            admin_email: None,
            admin_password: None,
            cors_origin: None,
        }
    }
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    ///
    /// Development falls back to a freshly generated random value.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                tracing::warn!("{name} not set, generating a temporary development secret");
                generate_secure_printable_jwt_secret()
            }
        };
        if environment != "development" && val.len() < MIN_JWT_SECRET_LEN {
            return Err(format!(
                "{name} must be at least {MIN_JWT_SECRET_LEN} characters in {environment} environment"
            )
            .into());
        }
        Ok(val)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let mail_mode = match std::env::var("MAIL_MODE") {
            Ok(mode) => mode.parse::<MailMode>()?,
            Err(_) if environment == "development" => MailMode::Log,
            Err(_) => MailMode::Ses,
        };

        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://shop.db?mode=rwc".into()),
            http_port: parse_var("HTTP_PORT", 8080),
            jwt_secret: Self::require_secret("JWT_SECRET", &environment)?,
            jwt_expiration_minutes: parse_var("JWT_EXPIRATION_MINUTES", 1440),
            mail_mode,
            ses_from_email: std::env::var("SES_FROM_EMAIL")
                .unwrap_or_else(|_| "noreply@shop.local".into()),
            otp_ttl_secs: parse_var("OTP_TTL_SECS", 600),
            otp_max_attempts: parse_var("OTP_MAX_ATTEMPTS", 5),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok().filter(|s| !s.is_empty()),
            admin_email: std::env::var("ADMIN_EMAIL").ok().filter(|s| !s.is_empty()),
            admin_password: std::env::var("ADMIN_PASSWORD")
                .ok()
                .filter(|s| !s.is_empty()),
            cors_origin: std::env::var("CORS_ORIGIN").ok().filter(|s| !s.is_empty()),
            environment,
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn jwt_config(&self) -> JwtConfig {
        JwtConfig {
            secret: self.jwt_secret.clone(),
            expiration_minutes: self.jwt_expiration_minutes,
            issuer: "shop-server".into(),
            audience: "shop-clients".into(),
        }
    }

    pub fn otp_policy(&self) -> OtpPolicy {
        OtpPolicy {
            ttl_secs: self.otp_ttl_secs,
            max_attempts: self.otp_max_attempts,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mail_mode_parse() {
        assert_eq!("log".parse::<MailMode>(), Ok(MailMode::Log));
        assert_eq!("SES".parse::<MailMode>(), Ok(MailMode::Ses));
        assert!("smtp".parse::<MailMode>().is_err());
    }

    #[test]
    fn test_default_is_development() {
        let config = Config::default();
        assert!(config.is_development());
        assert_eq!(config.otp_policy().ttl_secs, 600);
        assert_eq!(config.otp_policy().max_attempts, 5);
        assert!(config.jwt_secret.len() >= MIN_JWT_SECRET_LEN);
    }
}
