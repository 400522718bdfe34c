use sea_orm_migration::prelude::*;

/// Tables carrying an `updated_at` column, as (trigger name, qualified table)
const TRIGGERED_TABLES: [(&str, &str); 2] = [
    ("update_pipelines_updated_at", "pipeline.pipelines"),
    ("update_attack_scenarios_updated_at", "security.attack_scenarios"),
];

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(
            r#"
            CREATE OR REPLACE FUNCTION pipeline.update_updated_at_column()
            RETURNS TRIGGER AS $$
            BEGIN
                NEW.updated_at = NOW();
                RETURN NEW;
            END;
            $$ LANGUAGE plpgsql
            "#,
        )
        .await?;

        for (trigger, table) in TRIGGERED_TABLES {
            db.execute_unprepared(&format!(
                "DROP TRIGGER IF EXISTS {trigger} ON {table}"
            ))
            .await?;
            db.execute_unprepared(&format!(
                "CREATE TRIGGER {trigger} BEFORE UPDATE ON {table} \
                 FOR EACH ROW EXECUTE FUNCTION pipeline.update_updated_at_column()"
            ))
            .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        for (trigger, table) in TRIGGERED_TABLES {
            db.execute_unprepared(&format!(
                "DROP TRIGGER IF EXISTS {trigger} ON {table}"
            ))
            .await?;
        }

        db.execute_unprepared("DROP FUNCTION IF EXISTS pipeline.update_updated_at_column()")
            .await?;

        Ok(())
    }
}
