use async_trait::async_trait;
use pipewarden_core::DBDateTime;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue::Set, ConnectionTrait, DbErr};
use serde::{Deserialize, Serialize};

use crate::types::LogLevel;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(schema_name = "pipeline", table_name = "audit_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Cleared when the execution is deleted; the log row is kept
    pub execution_id: Option<Uuid>,
    pub timestamp: DBDateTime,
    pub level: LogLevel,
    pub module: String,
    pub event: String,
    pub message: Option<String>,
    pub correlation_id: Option<Uuid>,
    #[sea_orm(column_type = "JsonBinary")]
    pub context: Json,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::executions::Entity",
        from = "Column::ExecutionId",
        to = "super::executions::Column::Id",
        on_delete = "SetNull"
    )]
    Execution,
}

impl Related<super::executions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Execution.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if insert {
            if self.timestamp.is_not_set() {
                self.timestamp = Set(chrono::Utc::now());
            }
            if self.context.is_not_set() {
                self.context = Set(serde_json::json!({}));
            }
        }

        Ok(self)
    }
}
