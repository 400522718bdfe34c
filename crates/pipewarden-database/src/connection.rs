//! Database connection management

use pipewarden_core::{redact_database_url, DatabaseConfig, ServiceError, ServiceResult};
use pipewarden_migrations::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub type DbConnection = DatabaseConnection;

/// Pool options derived from the configuration
pub fn connect_options(config: &DatabaseConfig) -> ConnectOptions {
    let mut opt = ConnectOptions::new(config.url.clone());
    opt.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
        .sqlx_logging(config.sqlx_logging);
    opt
}

/// Connects without touching the schema
pub async fn connect_without_migrations(config: &DatabaseConfig) -> ServiceResult<Arc<DbConnection>> {
    debug!("Connecting to {}", redact_database_url(&config.url));

    let db = Database::connect(connect_options(config))
        .await
        .map_err(|e| ServiceError::Database(e.to_string()))?;

    Ok(Arc::new(db))
}

/// Connects and applies every pending migration
pub async fn establish_connection(config: &DatabaseConfig) -> ServiceResult<Arc<DbConnection>> {
    let db = connect_without_migrations(config).await?;

    let pending = Migrator::get_pending_migrations(&*db)
        .await
        .map_err(|e| ServiceError::Database(e.to_string()))?;

    Migrator::up(&*db, None)
        .await
        .map_err(|e| ServiceError::Database(e.to_string()))?;

    info!(
        "Database ready at {} ({} migrations applied)",
        redact_database_url(&config.url),
        pending.len()
    );

    Ok(db)
}
