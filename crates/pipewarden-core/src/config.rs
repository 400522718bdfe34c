//! Configuration management utilities

use serde::{Deserialize, Serialize};

use crate::error::{ServiceError, ServiceResult};

pub const DEFAULT_POSTGRES_HOST: &str = "localhost";
pub const DEFAULT_POSTGRES_PORT: u16 = 5440;
pub const DEFAULT_POSTGRES_DB: &str = "pipeline_db";
pub const DEFAULT_POSTGRES_USER: &str = "admin";
pub const DEFAULT_POSTGRES_PASSWORD: &str = "secret_password";

/// Database configuration: connection URL plus pool tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
    pub sqlx_logging: bool,
}

impl DatabaseConfig {
    /// Configuration with the default pool settings
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 20,
            min_connections: 2,
            connect_timeout_secs: 30,
            acquire_timeout_secs: 30,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
            sqlx_logging: false,
        }
    }

    /// Configuration whose pool settings may be overridden through
    /// `PIPEWARDEN_POSTGRES_*` environment variables
    pub fn from_env(url: impl Into<String>) -> Self {
        Self::from_vars(url, |key| std::env::var(key).ok())
    }

    pub fn from_vars<F>(url: impl Into<String>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::new(url);
        let parsed = |key: &str| lookup(key).and_then(|s| s.trim().parse::<u64>().ok());
        let pool_size = |key: &str| lookup(key).and_then(|s| s.trim().parse::<u32>().ok());

        Self {
            max_connections: pool_size("PIPEWARDEN_POSTGRES_MAX_CONNECTIONS")
                .unwrap_or(defaults.max_connections),
            min_connections: pool_size("PIPEWARDEN_POSTGRES_MIN_CONNECTIONS")
                .unwrap_or(defaults.min_connections),
            connect_timeout_secs: parsed("PIPEWARDEN_POSTGRES_CONNECT_TIMEOUT")
                .unwrap_or(defaults.connect_timeout_secs),
            acquire_timeout_secs: parsed("PIPEWARDEN_POSTGRES_ACQUIRE_TIMEOUT")
                .unwrap_or(defaults.acquire_timeout_secs),
            idle_timeout_secs: parsed("PIPEWARDEN_POSTGRES_IDLE_TIMEOUT")
                .unwrap_or(defaults.idle_timeout_secs),
            max_lifetime_secs: parsed("PIPEWARDEN_POSTGRES_MAX_LIFETIME")
                .unwrap_or(defaults.max_lifetime_secs),
            sqlx_logging: lookup("PIPEWARDEN_SQLX_LOGGING")
                .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.sqlx_logging),
            ..defaults
        }
    }
}

/// PostgreSQL connection settings assembled from the `POSTGRES_*` variables
/// shared with the docker-compose deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostgresSettings {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
}

impl Default for PostgresSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_POSTGRES_HOST.to_string(),
            port: DEFAULT_POSTGRES_PORT,
            database: DEFAULT_POSTGRES_DB.to_string(),
            user: DEFAULT_POSTGRES_USER.to_string(),
            password: DEFAULT_POSTGRES_PASSWORD.to_string(),
        }
    }
}

impl PostgresSettings {
    pub fn from_env() -> ServiceResult<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars<F>(lookup: F) -> ServiceResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = match lookup("POSTGRES_PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| {
                ServiceError::configuration(format!("POSTGRES_PORT is not a valid port: {}", raw))
            })?,
            None => defaults.port,
        };

        Ok(Self {
            host: lookup("POSTGRES_HOST").unwrap_or(defaults.host),
            port,
            database: lookup("POSTGRES_DB").unwrap_or(defaults.database),
            user: lookup("POSTGRES_USER").unwrap_or(defaults.user),
            password: lookup("POSTGRES_PASSWORD").unwrap_or(defaults.password),
        })
    }

    /// Full connection URL, password included; credentials are percent-encoded
    pub fn url(&self) -> String {
        format!(
            "postgresql://{}:{}@{}:{}/{}",
            urlencoding::encode(&self.user),
            urlencoding::encode(&self.password),
            self.host,
            self.port,
            self.database
        )
    }

    /// Connection URL safe for logs
    pub fn display_url(&self) -> String {
        format!(
            "postgresql://{}:***@{}:{}/{}",
            urlencoding::encode(&self.user),
            self.host,
            self.port,
            self.database
        )
    }
}

/// Common pagination parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationParams {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: Some(1),
            page_size: Some(20),
        }
    }
}

impl PaginationParams {
    /// Returns `(page, page_size)` with page >= 1 and page_size clamped to 1..=100
    pub fn normalize(self) -> (u64, u64) {
        let page = self.page.unwrap_or(1).max(1);
        let page_size = self.page_size.unwrap_or(20).min(100).max(1);
        (page, page_size)
    }
}
