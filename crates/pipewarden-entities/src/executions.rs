use async_trait::async_trait;
use pipewarden_core::DBDateTime;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue::Set, ConnectionTrait, DbErr};
use serde::{Deserialize, Serialize};

use crate::types::ExecutionStatus;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(schema_name = "pipeline", table_name = "executions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub pipeline_id: Uuid,
    pub status: ExecutionStatus,
    pub start_time: DBDateTime,
    /// Set once the execution reaches a terminal status; never before `start_time`
    pub end_time: Option<DBDateTime>,
    pub records_processed: i64,
    pub records_failed: i64,
    pub error_message: Option<String>,
    #[sea_orm(column_type = "JsonBinary")]
    pub metrics: Json,
    pub created_at: DBDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::pipelines::Entity",
        from = "Column::PipelineId",
        to = "super::pipelines::Column::Id",
        on_delete = "Cascade"
    )]
    Pipeline,
    #[sea_orm(has_many = "super::validation_results::Entity")]
    ValidationResults,
    #[sea_orm(has_many = "super::audit_logs::Entity")]
    AuditLogs,
    #[sea_orm(has_many = "super::simulation_results::Entity")]
    SimulationResults,
}

impl Related<super::pipelines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Pipeline.def()
    }
}

impl Related<super::validation_results::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ValidationResults.def()
    }
}

impl Related<super::audit_logs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AuditLogs.def()
    }
}

impl Related<super::simulation_results::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SimulationResults.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if insert {
            let now = chrono::Utc::now();
            if self.id.is_not_set() {
                self.id = Set(Uuid::new_v4());
            }
            if self.status.is_not_set() {
                self.status = Set(ExecutionStatus::Pending);
            }
            if self.start_time.is_not_set() {
                self.start_time = Set(now);
            }
            if self.records_processed.is_not_set() {
                self.records_processed = Set(0);
            }
            if self.records_failed.is_not_set() {
                self.records_failed = Set(0);
            }
            if self.metrics.is_not_set() {
                self.metrics = Set(serde_json::json!({}));
            }
            if self.created_at.is_not_set() {
                self.created_at = Set(now);
            }
        }

        Ok(self)
    }
}
