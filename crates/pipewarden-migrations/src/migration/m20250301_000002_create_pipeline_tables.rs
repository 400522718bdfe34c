use sea_orm_migration::prelude::*;

use super::idens::{qualified, AuditLogs, DbSchema, Executions, Pipelines, ValidationResults};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ========================================
        // PIPELINES TABLE
        // ========================================
        manager
            .create_table(
                Table::create()
                    .table(qualified(DbSchema::Pipeline, Pipelines::Table))
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Pipelines::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .default(Expr::cust("uuid_generate_v4()")),
                    )
                    .col(
                        ColumnDef::new(Pipelines::Name)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Pipelines::Description).text().null())
                    .col(
                        ColumnDef::new(Pipelines::Config)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'{}'::jsonb")),
                    )
                    .col(
                        ColumnDef::new(Pipelines::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Pipelines::CreatedBy).string_len(100).null())
                    .col(
                        ColumnDef::new(Pipelines::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Pipelines::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .check(Expr::cust("length(trim(name)) > 0"))
                    .to_owned(),
            )
            .await?;

        // ========================================
        // EXECUTIONS TABLE
        // ========================================
        manager
            .create_table(
                Table::create()
                    .table(qualified(DbSchema::Pipeline, Executions::Table))
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Executions::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .default(Expr::cust("uuid_generate_v4()")),
                    )
                    .col(ColumnDef::new(Executions::PipelineId).uuid().not_null())
                    .col(
                        ColumnDef::new(Executions::Status)
                            .string_len(20)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Executions::StartTime)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Executions::EndTime)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Executions::RecordsProcessed)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Executions::RecordsFailed)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Executions::ErrorMessage).text().null())
                    .col(
                        ColumnDef::new(Executions::Metrics)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'{}'::jsonb")),
                    )
                    .col(
                        ColumnDef::new(Executions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .check(Expr::cust(
                        "status IN ('pending', 'running', 'completed', 'failed', 'cancelled')",
                    ))
                    .check(Expr::cust("end_time IS NULL OR end_time >= start_time"))
                    .check(Expr::cust("records_processed >= 0 AND records_failed >= 0"))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_executions_pipeline_id")
                            .from(
                                qualified(DbSchema::Pipeline, Executions::Table),
                                Executions::PipelineId,
                            )
                            .to(qualified(DbSchema::Pipeline, Pipelines::Table), Pipelines::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ========================================
        // VALIDATION_RESULTS TABLE
        // ========================================
        manager
            .create_table(
                Table::create()
                    .table(qualified(DbSchema::Pipeline, ValidationResults::Table))
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ValidationResults::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ValidationResults::ExecutionId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ValidationResults::RuleName)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ValidationResults::RuleType)
                            .string_len(50)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ValidationResults::Passed).boolean().not_null())
                    .col(
                        ColumnDef::new(ValidationResults::FailedCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ValidationResults::FailureDetails)
                            .json_binary()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ValidationResults::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .check(Expr::cust("failed_count >= 0"))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_validation_results_execution_id")
                            .from(
                                qualified(DbSchema::Pipeline, ValidationResults::Table),
                                ValidationResults::ExecutionId,
                            )
                            .to(
                                qualified(DbSchema::Pipeline, Executions::Table),
                                Executions::Id,
                            )
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ========================================
        // AUDIT_LOGS TABLE
        // ========================================
        manager
            .create_table(
                Table::create()
                    .table(qualified(DbSchema::Pipeline, AuditLogs::Table))
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AuditLogs::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AuditLogs::ExecutionId).uuid().null())
                    .col(
                        ColumnDef::new(AuditLogs::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(AuditLogs::Level).string_len(10).not_null())
                    .col(ColumnDef::new(AuditLogs::Module).string_len(100).not_null())
                    .col(ColumnDef::new(AuditLogs::Event).string_len(255).not_null())
                    .col(ColumnDef::new(AuditLogs::Message).text().null())
                    .col(ColumnDef::new(AuditLogs::CorrelationId).uuid().null())
                    .col(
                        ColumnDef::new(AuditLogs::Context)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'{}'::jsonb")),
                    )
                    .check(Expr::cust(
                        "level IN ('DEBUG', 'INFO', 'WARNING', 'ERROR', 'CRITICAL')",
                    ))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_audit_logs_execution_id")
                            .from(
                                qualified(DbSchema::Pipeline, AuditLogs::Table),
                                AuditLogs::ExecutionId,
                            )
                            .to(
                                qualified(DbSchema::Pipeline, Executions::Table),
                                Executions::Id,
                            )
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // ========================================
        // INDEXES
        // ========================================
        let indexes = [
            Index::create()
                .if_not_exists()
                .name("idx_executions_pipeline_id")
                .table(qualified(DbSchema::Pipeline, Executions::Table))
                .col(Executions::PipelineId)
                .to_owned(),
            Index::create()
                .if_not_exists()
                .name("idx_executions_status")
                .table(qualified(DbSchema::Pipeline, Executions::Table))
                .col(Executions::Status)
                .to_owned(),
            Index::create()
                .if_not_exists()
                .name("idx_executions_start_time")
                .table(qualified(DbSchema::Pipeline, Executions::Table))
                .col((Executions::StartTime, IndexOrder::Desc))
                .to_owned(),
            Index::create()
                .if_not_exists()
                .name("idx_validation_results_execution_id")
                .table(qualified(DbSchema::Pipeline, ValidationResults::Table))
                .col(ValidationResults::ExecutionId)
                .to_owned(),
            Index::create()
                .if_not_exists()
                .name("idx_validation_results_passed")
                .table(qualified(DbSchema::Pipeline, ValidationResults::Table))
                .col(ValidationResults::Passed)
                .to_owned(),
            Index::create()
                .if_not_exists()
                .name("idx_audit_logs_execution_id")
                .table(qualified(DbSchema::Pipeline, AuditLogs::Table))
                .col(AuditLogs::ExecutionId)
                .to_owned(),
            Index::create()
                .if_not_exists()
                .name("idx_audit_logs_timestamp")
                .table(qualified(DbSchema::Pipeline, AuditLogs::Table))
                .col((AuditLogs::Timestamp, IndexOrder::Desc))
                .to_owned(),
            Index::create()
                .if_not_exists()
                .name("idx_audit_logs_level")
                .table(qualified(DbSchema::Pipeline, AuditLogs::Table))
                .col(AuditLogs::Level)
                .to_owned(),
            Index::create()
                .if_not_exists()
                .name("idx_audit_logs_correlation_id")
                .table(qualified(DbSchema::Pipeline, AuditLogs::Table))
                .col(AuditLogs::CorrelationId)
                .to_owned(),
        ];

        for index in indexes {
            manager.create_index(index).await?;
        }

        // Trigram indexes back the case-insensitive substring searches
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE INDEX IF NOT EXISTS idx_pipelines_name_trgm
                    ON pipeline.pipelines USING gin (name gin_trgm_ops);

                CREATE INDEX IF NOT EXISTS idx_audit_logs_event_trgm
                    ON pipeline.audit_logs USING gin (event gin_trgm_ops);
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Children first; indexes go with their tables
        for table in [
            qualified(DbSchema::Pipeline, AuditLogs::Table),
            qualified(DbSchema::Pipeline, ValidationResults::Table),
            qualified(DbSchema::Pipeline, Executions::Table),
            qualified(DbSchema::Pipeline, Pipelines::Table),
        ] {
            manager
                .drop_table(Table::drop().table(table).if_exists().to_owned())
                .await?;
        }

        Ok(())
    }
}
