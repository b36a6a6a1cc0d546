/// Configuration management for the helpdesk service
use crate::error::{HelpdeskError, HelpdeskResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub authentication: AuthConfig,
    pub email: Option<EmailConfig>,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub database_path: PathBuf,
    pub max_connections: u32,
    /// Deadline applied uniformly to every store call
    pub query_timeout: Duration,
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl: Duration,
    /// Admin account created at startup when its phone is not yet registered
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct BootstrapAdmin {
    pub name: String,
    pub phone: String,
    pub password: String,
}

impl std::fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("name", &self.name)
            .field("phone", &self.phone)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Email configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_address: String,
    pub send_timeout: Duration,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> HelpdeskResult<Self> {
        dotenv::dotenv().ok();

        let hostname = env::var("HELPDESK_HOSTNAME").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|_| HelpdeskError::Validation("Invalid port number".to_string()))?;

        let database_path: PathBuf = env::var("HELPDESK_DATABASE_PATH")
            .unwrap_or_else(|_| "./data/helpdesk.sqlite".to_string())
            .into();
        let max_connections = env::var("HELPDESK_DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .unwrap_or(10);
        let query_timeout_secs: u64 = env::var("HELPDESK_DB_TIMEOUT_SECS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .unwrap_or(5);

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| HelpdeskError::Validation("JWT secret required".to_string()))?;
        let token_ttl_hours: u64 = env::var("HELPDESK_TOKEN_TTL_HOURS")
            .unwrap_or_else(|_| "72".to_string())
            .parse()
            .unwrap_or(72);

        let bootstrap_admin = match (
            env::var("HELPDESK_BOOTSTRAP_ADMIN_PHONE"),
            env::var("HELPDESK_BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (Ok(phone), Ok(password)) => Some(BootstrapAdmin {
                name: env::var("HELPDESK_BOOTSTRAP_ADMIN_NAME")
                    .unwrap_or_else(|_| "Administrator".to_string()),
                phone,
                password,
            }),
            _ => None,
        };

        let email = if let Ok(smtp_host) = env::var("SMTP_HOST") {
            let smtp_port = env::var("SMTP_PORT")
                .unwrap_or_else(|_| "587".to_string())
                .parse()
                .map_err(|_| HelpdeskError::Validation("Invalid SMTP port".to_string()))?;
            let send_timeout_secs: u64 = env::var("HELPDESK_MAIL_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10);
            let from_address = env::var("MAIL_FROM")
                .unwrap_or_else(|_| format!("noreply@{}", smtp_host));

            Some(EmailConfig {
                // SMTP username defaults to the sender address
                username: env::var("SMTP_USER").ok().or_else(|| Some(from_address.clone())),
                password: env::var("SMTP_PASS").ok(),
                smtp_host,
                smtp_port,
                from_address,
                send_timeout: Duration::from_secs(send_timeout_secs),
            })
        } else {
            None
        };

        let log_level = env::var("RUST_LOG")
            .unwrap_or_else(|_| "helpdesk=debug,tower_http=debug".to_string());

        Ok(ServerConfig {
            service: ServiceConfig { hostname, port },
            storage: StorageConfig {
                database_path,
                max_connections,
                query_timeout: Duration::from_secs(query_timeout_secs),
            },
            authentication: AuthConfig {
                jwt_secret,
                token_ttl: token_ttl_from_hours(token_ttl_hours)?,
                bootstrap_admin,
            },
            email,
            logging: LoggingConfig { level: log_level },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> HelpdeskResult<()> {
        if self.service.hostname.is_empty() {
            return Err(HelpdeskError::Validation("Hostname cannot be empty".to_string()));
        }

        if self.authentication.jwt_secret.len() < 32 {
            return Err(HelpdeskError::Validation(
                "JWT secret must be at least 32 characters".to_string(),
            ));
        }

        if self.storage.query_timeout.is_zero() {
            return Err(HelpdeskError::Validation(
                "Database timeout must be greater than zero".to_string(),
            ));
        }

        if let Some(admin) = &self.authentication.bootstrap_admin {
            if admin.phone.trim().is_empty() || admin.password.is_empty() {
                return Err(HelpdeskError::Validation(
                    "Bootstrap admin requires a phone and a password".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Token lifetime from a configured number of hours
fn token_ttl_from_hours(hours: u64) -> HelpdeskResult<Duration> {
    hours
        .checked_mul(3600)
        .map(Duration::from_secs)
        .ok_or_else(|| HelpdeskError::Validation(format!("Token lifetime of {} hours is too large", hours)))
}
