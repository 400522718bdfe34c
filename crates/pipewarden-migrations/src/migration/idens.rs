use sea_orm_migration::prelude::*;

#[derive(DeriveIden, Clone, Copy)]
pub enum DbSchema {
    Pipeline,
    Security,
    Monitoring,
}

#[derive(DeriveIden)]
pub enum Pipelines {
    Table,
    Id,
    Name,
    Description,
    Config,
    IsActive,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum Executions {
    Table,
    Id,
    PipelineId,
    Status,
    StartTime,
    EndTime,
    RecordsProcessed,
    RecordsFailed,
    ErrorMessage,
    Metrics,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum ValidationResults {
    Table,
    Id,
    ExecutionId,
    RuleName,
    RuleType,
    Passed,
    FailedCount,
    FailureDetails,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum AuditLogs {
    Table,
    Id,
    ExecutionId,
    Timestamp,
    Level,
    Module,
    Event,
    Message,
    CorrelationId,
    Context,
}

#[derive(DeriveIden)]
pub enum AttackScenarios {
    Table,
    Id,
    Name,
    Description,
    AttackTypes,
    Config,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum SimulationResults {
    Table,
    Id,
    ScenarioId,
    ExecutionId,
    AttackType,
    StartTime,
    EndTime,
    AttemptsTotal,
    AttemptsDetected,
    AttemptsBlocked,
    AttemptsSuccessful,
    MttdMeanMs,
    #[sea_orm(iden = "mttd_p50_ms")]
    MttdP50Ms,
    #[sea_orm(iden = "mttd_p95_ms")]
    MttdP95Ms,
    #[sea_orm(iden = "mttd_p99_ms")]
    MttdP99Ms,
    SecurityScore,
    VulnerabilitiesFound,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum Metrics {
    Table,
    Id,
    MetricName,
    MetricType,
    Value,
    Labels,
    Timestamp,
}

/// Schema-qualified table reference, e.g. `pipeline.executions`
pub fn qualified<T>(schema: DbSchema, table: T) -> TableRef
where
    T: IntoIden + 'static,
{
    (schema, table).into_table_ref()
}
