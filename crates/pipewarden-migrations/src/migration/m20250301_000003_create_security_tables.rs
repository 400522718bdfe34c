use sea_orm_migration::prelude::*;

use super::idens::{qualified, AttackScenarios, DbSchema, Executions, SimulationResults};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ========================================
        // ATTACK_SCENARIOS TABLE
        // ========================================
        manager
            .create_table(
                Table::create()
                    .table(qualified(DbSchema::Security, AttackScenarios::Table))
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AttackScenarios::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .default(Expr::cust("uuid_generate_v4()")),
                    )
                    .col(
                        ColumnDef::new(AttackScenarios::Name)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(AttackScenarios::Description).text().null())
                    .col(
                        ColumnDef::new(AttackScenarios::AttackTypes)
                            .array(ColumnType::Text)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AttackScenarios::Config)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'{}'::jsonb")),
                    )
                    .col(
                        ColumnDef::new(AttackScenarios::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(AttackScenarios::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(AttackScenarios::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .check(Expr::cust("length(trim(name)) > 0"))
                    .check(Expr::cust("cardinality(attack_types) > 0"))
                    .to_owned(),
            )
            .await?;

        // ========================================
        // SIMULATION_RESULTS TABLE
        // ========================================
        manager
            .create_table(
                Table::create()
                    .table(qualified(DbSchema::Security, SimulationResults::Table))
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SimulationResults::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .default(Expr::cust("uuid_generate_v4()")),
                    )
                    .col(ColumnDef::new(SimulationResults::ScenarioId).uuid().not_null())
                    .col(ColumnDef::new(SimulationResults::ExecutionId).uuid().null())
                    .col(
                        ColumnDef::new(SimulationResults::AttackType)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SimulationResults::StartTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SimulationResults::EndTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SimulationResults::AttemptsTotal)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SimulationResults::AttemptsDetected)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SimulationResults::AttemptsBlocked)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SimulationResults::AttemptsSuccessful)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(SimulationResults::MttdMeanMs).double().null())
                    .col(ColumnDef::new(SimulationResults::MttdP50Ms).double().null())
                    .col(ColumnDef::new(SimulationResults::MttdP95Ms).double().null())
                    .col(ColumnDef::new(SimulationResults::MttdP99Ms).double().null())
                    .col(
                        ColumnDef::new(SimulationResults::SecurityScore)
                            .double()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SimulationResults::VulnerabilitiesFound)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'[]'::jsonb")),
                    )
                    .col(
                        ColumnDef::new(SimulationResults::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .check(Expr::cust("end_time >= start_time"))
                    .check(Expr::cust(
                        "attempts_total >= 0 AND attempts_detected >= 0 \
                         AND attempts_blocked >= 0 AND attempts_successful >= 0",
                    ))
                    .check(Expr::cust(
                        "attempts_detected + attempts_blocked + attempts_successful <= attempts_total",
                    ))
                    .check(Expr::cust(
                        "security_score IS NULL OR (security_score >= 0 AND security_score <= 100)",
                    ))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_simulation_results_scenario_id")
                            .from(
                                qualified(DbSchema::Security, SimulationResults::Table),
                                SimulationResults::ScenarioId,
                            )
                            .to(
                                qualified(DbSchema::Security, AttackScenarios::Table),
                                AttackScenarios::Id,
                            )
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_simulation_results_execution_id")
                            .from(
                                qualified(DbSchema::Security, SimulationResults::Table),
                                SimulationResults::ExecutionId,
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

        let indexes = [
            Index::create()
                .if_not_exists()
                .name("idx_simulation_results_scenario_id")
                .table(qualified(DbSchema::Security, SimulationResults::Table))
                .col(SimulationResults::ScenarioId)
                .to_owned(),
            Index::create()
                .if_not_exists()
                .name("idx_simulation_results_attack_type")
                .table(qualified(DbSchema::Security, SimulationResults::Table))
                .col(SimulationResults::AttackType)
                .to_owned(),
            Index::create()
                .if_not_exists()
                .name("idx_simulation_results_execution_id")
                .table(qualified(DbSchema::Security, SimulationResults::Table))
                .col(SimulationResults::ExecutionId)
                .to_owned(),
            Index::create()
                .if_not_exists()
                .name("idx_simulation_results_start_time")
                .table(qualified(DbSchema::Security, SimulationResults::Table))
                .col((SimulationResults::StartTime, IndexOrder::Desc))
                .to_owned(),
        ];

        for index in indexes {
            manager.create_index(index).await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(qualified(DbSchema::Security, SimulationResults::Table))
                    .if_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(
                Table::drop()
                    .table(qualified(DbSchema::Security, AttackScenarios::Table))
                    .if_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}
