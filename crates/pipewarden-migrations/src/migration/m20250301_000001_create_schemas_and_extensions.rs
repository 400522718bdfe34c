use sea_orm_migration::prelude::*;

/// Schemas owning the framework tables, in creation order
const SCHEMAS: [&str; 3] = ["pipeline", "security", "monitoring"];

/// `uuid-ossp` backs the UUID primary key defaults, `pg_trgm` the fuzzy
/// search indexes, `pgcrypto` is made available for hashing in ad-hoc queries.
const EXTENSIONS: [&str; 3] = ["uuid-ossp", "pg_trgm", "pgcrypto"];

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        for extension in EXTENSIONS {
            db.execute_unprepared(&format!(
                "CREATE EXTENSION IF NOT EXISTS \"{}\"",
                extension
            ))
            .await
            .map_err(|e| {
                DbErr::Custom(format!("Failed to create extension {}: {}", extension, e))
            })?;
        }

        for schema in SCHEMAS {
            db.execute_unprepared(&format!("CREATE SCHEMA IF NOT EXISTS {}", schema))
                .await?;
        }

        tracing::debug!("Schemas {:?} ready", SCHEMAS);

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // Extensions stay installed: objects outside these schemas may rely on them
        for schema in SCHEMAS.iter().rev() {
            db.execute_unprepared(&format!("DROP SCHEMA IF EXISTS {}", schema))
                .await?;
        }

        Ok(())
    }
}
