use sea_orm_migration::prelude::*;

const SCHEMAS: [&str; 3] = ["pipeline", "security", "monitoring"];

/// Opens the framework schemas to every role. Development convenience only;
/// production deployments should replace this with role-scoped grants.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        for schema in SCHEMAS {
            db.execute_unprepared(&format!(
                r#"
                GRANT USAGE ON SCHEMA {schema} TO PUBLIC;
                GRANT SELECT, INSERT, UPDATE, DELETE ON ALL TABLES IN SCHEMA {schema} TO PUBLIC;
                GRANT USAGE, SELECT ON ALL SEQUENCES IN SCHEMA {schema} TO PUBLIC;
                ALTER DEFAULT PRIVILEGES IN SCHEMA {schema}
                    GRANT SELECT, INSERT, UPDATE, DELETE ON TABLES TO PUBLIC;
                ALTER DEFAULT PRIVILEGES IN SCHEMA {schema}
                    GRANT USAGE, SELECT ON SEQUENCES TO PUBLIC;
                "#
            ))
            .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        for schema in SCHEMAS.iter().rev() {
            db.execute_unprepared(&format!(
                r#"
                ALTER DEFAULT PRIVILEGES IN SCHEMA {schema}
                    REVOKE USAGE, SELECT ON SEQUENCES FROM PUBLIC;
                ALTER DEFAULT PRIVILEGES IN SCHEMA {schema}
                    REVOKE SELECT, INSERT, UPDATE, DELETE ON TABLES FROM PUBLIC;
                REVOKE USAGE, SELECT ON ALL SEQUENCES IN SCHEMA {schema} FROM PUBLIC;
                REVOKE SELECT, INSERT, UPDATE, DELETE ON ALL TABLES IN SCHEMA {schema} FROM PUBLIC;
                REVOKE USAGE ON SCHEMA {schema} FROM PUBLIC;
                "#
            ))
            .await?;
        }

        Ok(())
    }
}
