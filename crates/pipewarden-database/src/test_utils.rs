//! Test utilities for database integration tests
//!
//! Provides a PostgreSQL testcontainer shared by every test in a test binary,
//! with the Pipewarden migrations applied once and the managed schemas emptied
//! before each test.

use crate::DbConnection;
use pipewarden_core::MANAGED_SCHEMAS;
use pipewarden_migrations::Migrator;
use sea_orm::*;
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;
use testcontainers::{runners::AsyncRunner, ContainerAsync, GenericImage, ImageExt};
use tokio::sync::{Mutex, OnceCell, OwnedMutexGuard};

/// Shared test database container that lives for the duration of the test run
static TEST_CONTAINER: OnceCell<Arc<Mutex<SharedContainer>>> = OnceCell::const_new();

/// Global migration lock to ensure only one test runs migrations at a time
static MIGRATION_LOCK: OnceCell<Arc<Mutex<()>>> = OnceCell::const_new();

/// Held by every live `TestDatabase`; tests truncate the shared schemas, so
/// they must not overlap
static USAGE_LOCK: OnceCell<Arc<Mutex<()>>> = OnceCell::const_new();

struct SharedContainer {
    #[allow(dead_code)]
    container: ContainerAsync<GenericImage>,
    database_url: String,
}

impl SharedContainer {
    async fn new() -> anyhow::Result<Self> {
        let db_name = "test_db";
        let username = "test_user";
        let password = "test_password";

        let postgres_container = GenericImage::new("postgres", "17-alpine")
            .with_env_var("POSTGRES_DB", db_name)
            .with_env_var("POSTGRES_USER", username)
            .with_env_var("POSTGRES_PASSWORD", password)
            .with_env_var("POSTGRES_HOST_AUTH_METHOD", "trust")
            .start()
            .await?;

        let port = postgres_container.get_host_port_ipv4(5432).await?;
        let database_url = format!(
            "postgresql://{}:{}@localhost:{}/{}",
            username, password, port, db_name
        );

        // Wait for the database to be ready
        tokio::time::sleep(tokio::time::Duration::from_secs(3)).await;

        Ok(Self {
            container: postgres_container,
            database_url,
        })
    }
}

/// Test database backed by the shared PostgreSQL container
pub struct TestDatabase {
    pub db: Arc<DbConnection>,
    pub database_url: String,
    _guard: OwnedMutexGuard<()>,
}

impl TestDatabase {
    async fn get_or_create_container() -> anyhow::Result<Arc<Mutex<SharedContainer>>> {
        TEST_CONTAINER
            .get_or_try_init(|| async {
                let container = SharedContainer::new().await?;
                Ok(Arc::new(Mutex::new(container)))
            })
            .await
            .map(Arc::clone)
    }

    /// Connect to the shared container without running migrations.
    ///
    /// Whatever tables already exist in the managed schemas are emptied.
    pub async fn new() -> anyhow::Result<Self> {
        let usage_lock = USAGE_LOCK
            .get_or_init(|| async { Arc::new(Mutex::new(())) })
            .await;
        let guard = Arc::clone(usage_lock).lock_owned().await;

        let container = Self::get_or_create_container().await?;
        let database_url = container.lock().await.database_url.clone();

        let db = Self::connect_with_retry(&database_url, 20).await?;

        let test_db = TestDatabase {
            db: Arc::new(db),
            database_url,
            _guard: guard,
        };

        test_db
            .test_connection()
            .await
            .map_err(|e| anyhow::anyhow!("Initial connection test failed: {}", e))?;

        test_db.cleanup_all_tables().await?;

        Ok(test_db)
    }

    /// Connect to the shared container with the full schema in place.
    ///
    /// Migrations run once per container; later calls find them applied.
    pub async fn with_migrations() -> anyhow::Result<Self> {
        let test_db = Self::new().await?;

        let migration_lock = MIGRATION_LOCK
            .get_or_init(|| async { Arc::new(Mutex::new(())) })
            .await;
        let _lock = migration_lock.lock().await;

        let pending = Migrator::get_pending_migrations(test_db.connection()).await?;
        if !pending.is_empty() {
            Migrator::up(test_db.connection(), None)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))?;
        }

        // Seed rows inserted by the migrations are removed as well
        test_db.cleanup_all_tables().await?;

        Ok(test_db)
    }

    async fn connect_with_retry(
        database_url: &str,
        max_retries: u32,
    ) -> anyhow::Result<DbConnection> {
        use std::time::Duration;

        let mut retries = max_retries;

        let mut opt = ConnectOptions::new(database_url.to_owned());
        opt.max_connections(5)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(10))
            .max_lifetime(Duration::from_secs(60))
            .sqlx_logging(false);

        loop {
            match Database::connect(opt.clone()).await {
                Ok(db) => {
                    let test = Statement::from_string(DatabaseBackend::Postgres, "SELECT 1");
                    match db.execute(test).await {
                        Ok(_) => return Ok(db),
                        Err(e) if retries > 0 => {
                            eprintln!(
                                "Database connected but test query failed (retries left: {}): {}",
                                retries, e
                            );
                        }
                        Err(e) => {
                            return Err(anyhow::anyhow!(
                                "Database connected but not responsive: {}",
                                e
                            ));
                        }
                    }
                }
                Err(e) if retries > 0 => {
                    eprintln!(
                        "Failed to connect to database (retries left: {}): {}",
                        retries, e
                    );
                }
                Err(e) => {
                    return Err(anyhow::anyhow!("Failed to connect to database: {}", e));
                }
            }

            retries -= 1;
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
    }

    /// Execute raw SQL
    pub async fn execute_sql(&self, sql: &str) -> anyhow::Result<ExecResult> {
        let statement = Statement::from_string(DatabaseBackend::Postgres, sql.to_owned());
        Ok(self.db.execute(statement).await?)
    }

    /// Query raw SQL and return the rows
    pub async fn query_sql(&self, sql: &str) -> anyhow::Result<Vec<QueryResult>> {
        let statement = Statement::from_string(DatabaseBackend::Postgres, sql.to_owned());
        Ok(self.db.query_all(statement).await?)
    }

    /// Truncate every table in the managed schemas.
    ///
    /// `seaql_migrations` lives in `public` and is left alone.
    pub async fn cleanup_all_tables(&self) -> anyhow::Result<()> {
        let schemas = MANAGED_SCHEMAS
            .iter()
            .map(|s| format!("'{}'", s))
            .collect::<Vec<_>>()
            .join(", ");

        let tables = self
            .query_sql(&format!(
                "SELECT schemaname || '.' || tablename AS qualified FROM pg_tables \
                 WHERE schemaname IN ({}) ORDER BY qualified",
                schemas
            ))
            .await?;

        let names: Vec<String> = tables
            .iter()
            .filter_map(|row| row.try_get::<String>("", "qualified").ok())
            .collect();

        if names.is_empty() {
            return Ok(());
        }

        self.execute_sql(&format!(
            "TRUNCATE TABLE {} RESTART IDENTITY CASCADE",
            names.join(", ")
        ))
        .await?;

        Ok(())
    }

    pub async fn test_connection(&self) -> anyhow::Result<()> {
        let statement = Statement::from_string(DatabaseBackend::Postgres, "SELECT 1".to_owned());
        let result = self.db.query_one(statement).await?;

        if result.is_none() {
            return Err(anyhow::anyhow!("Connection test failed"));
        }

        Ok(())
    }

    pub fn connection(&self) -> &DbConnection {
        &self.db
    }

    pub fn connection_arc(&self) -> Arc<DbConnection> {
        Arc::clone(&self.db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_database_setup() -> anyhow::Result<()> {
        let test_db = TestDatabase::new().await?;

        test_db.test_connection().await?;

        let result = test_db.query_sql("SELECT 1 as test_value").await?;
        assert_eq!(result.len(), 1);
        assert!(test_db.database_url.contains("test_db"));

        Ok(())
    }

    #[tokio::test]
    async fn test_with_migrations_leaves_tables_empty() -> anyhow::Result<()> {
        let test_db = TestDatabase::with_migrations().await?;

        let columns = test_db
            .query_sql(
                "SELECT column_name FROM information_schema.columns \
                 WHERE table_schema = 'pipeline' AND table_name = 'pipelines'",
            )
            .await?;
        assert!(!columns.is_empty(), "pipeline.pipelines should have columns");

        // Seeded rows are truncated away
        let rows = test_db.query_sql("SELECT id FROM pipeline.pipelines").await?;
        assert!(rows.is_empty());

        let applied = test_db
            .query_sql("SELECT version FROM seaql_migrations")
            .await?;
        assert_eq!(applied.len(), Migrator::migrations().len());

        Ok(())
    }

    #[tokio::test]
    async fn test_cleanup_removes_rows() -> anyhow::Result<()> {
        let test_db = TestDatabase::with_migrations().await?;

        test_db
            .execute_sql("INSERT INTO monitoring.metrics (metric_name, metric_type, value) VALUES ('rows_in', 'counter', 1)")
            .await?;
        test_db.cleanup_all_tables().await?;

        let rows = test_db.query_sql("SELECT id FROM monitoring.metrics").await?;
        assert!(rows.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_queries_against_migrated_database() -> anyhow::Result<()> {
        let test_db = TestDatabase::with_migrations().await?;
        let db = test_db.connection();

        let version = crate::queries::server_version(db).await?;
        assert!(version.contains("PostgreSQL"));

        let identity = crate::queries::current_identity(db).await?;
        assert_eq!(identity.database, "test_db");
        assert_eq!(identity.user_name, "test_user");

        let tables = crate::queries::schema_tables(db, "security").await?;
        assert_eq!(tables, vec!["attack_scenarios", "simulation_results"]);

        test_db
            .execute_sql("INSERT INTO pipeline.pipelines (name, is_active) VALUES ('zeta', true), ('alpha', true), ('off', false)")
            .await?;
        let active = crate::queries::active_pipeline_names(db).await?;
        assert_eq!(active, vec!["alpha", "zeta"]);

        let counts = crate::queries::row_counts(db).await?;
        let pipelines = counts
            .iter()
            .find(|c| c.table == "pipelines")
            .expect("pipelines counted");
        assert_eq!(pipelines.rows, Some(3));

        Ok(())
    }
}
