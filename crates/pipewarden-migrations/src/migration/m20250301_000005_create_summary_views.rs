use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // One row per execution; rate is 0 until something has been processed
        db.execute_unprepared(
            r#"
            CREATE OR REPLACE VIEW pipeline.execution_summary AS
            SELECT
                e.id AS execution_id,
                p.id AS pipeline_id,
                p.name AS pipeline_name,
                e.status,
                e.start_time,
                e.end_time,
                EXTRACT(EPOCH FROM (e.end_time - e.start_time))::DOUBLE PRECISION AS duration_seconds,
                e.records_processed,
                e.records_failed,
                (CASE
                    WHEN e.records_processed = 0 THEN 0
                    ELSE ROUND(e.records_failed::NUMERIC / e.records_processed * 100, 2)
                END)::DOUBLE PRECISION AS failure_rate_percent
            FROM pipeline.executions e
            JOIN pipeline.pipelines p ON p.id = e.pipeline_id
            "#,
        )
        .await?;

        db.execute_unprepared(
            r#"
            CREATE OR REPLACE VIEW security.security_posture AS
            SELECT
                attack_type,
                COUNT(*) AS total_simulations,
                ROUND(AVG(security_score)::NUMERIC, 2)::DOUBLE PRECISION AS avg_security_score,
                ROUND(AVG(attempts_detected::NUMERIC / NULLIF(attempts_total, 0)), 4)::DOUBLE PRECISION
                    AS avg_detection_rate,
                AVG(mttd_mean_ms)::DOUBLE PRECISION AS avg_mttd_ms,
                COALESCE(SUM(attempts_successful), 0)::BIGINT AS total_successful_attacks,
                MAX(start_time) AS last_simulation
            FROM security.simulation_results
            WHERE attempts_total > 0
            GROUP BY attack_type
            "#,
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared("DROP VIEW IF EXISTS security.security_posture")
            .await?;
        db.execute_unprepared("DROP VIEW IF EXISTS pipeline.execution_summary")
            .await?;

        Ok(())
    }
}
