use sea_orm_migration::prelude::*;

pub const EXAMPLE_PIPELINE: &str = "example_csv_pipeline";
pub const EXAMPLE_SCENARIO: &str = "basic_injection_scenario";

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(&format!(
            r#"
            INSERT INTO pipeline.pipelines (name, description, config, created_by)
            VALUES (
                '{EXAMPLE_PIPELINE}',
                'Example pipeline for CSV data ingestion',
                '{{"source": {{"type": "csv", "path": "data/input"}}, "validation": {{"schema_check": true, "null_check": true}}}}'::jsonb,
                'system'
            )
            ON CONFLICT (name) DO NOTHING
            "#
        ))
        .await?;

        db.execute_unprepared(&format!(
            r#"
            INSERT INTO security.attack_scenarios (name, description, attack_types, config)
            VALUES (
                '{EXAMPLE_SCENARIO}',
                'Basic injection attack scenarios',
                ARRAY['sql_injection', 'schema_poisoning', 'data_tampering'],
                '{{"intensity": "low", "duration_seconds": 60}}'::jsonb
            )
            ON CONFLICT (name) DO NOTHING
            "#
        ))
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(&format!(
            "DELETE FROM security.attack_scenarios WHERE name = '{EXAMPLE_SCENARIO}'"
        ))
        .await?;
        db.execute_unprepared(&format!(
            "DELETE FROM pipeline.pipelines WHERE name = '{EXAMPLE_PIPELINE}'"
        ))
        .await?;

        Ok(())
    }
}
