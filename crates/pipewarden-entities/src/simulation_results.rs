use async_trait::async_trait;
use pipewarden_core::DBDateTime;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue::Set, ConnectionTrait, DbErr};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(schema_name = "security", table_name = "simulation_results")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub scenario_id: Uuid,
    /// Pipeline run the attack was aimed at; cleared if that run is purged
    pub execution_id: Option<Uuid>,
    pub attack_type: String,
    pub start_time: DBDateTime,
    pub end_time: DBDateTime,
    pub attempts_total: i32,
    pub attempts_detected: i32,
    pub attempts_blocked: i32,
    pub attempts_successful: i32,
    pub mttd_mean_ms: Option<f64>,
    pub mttd_p50_ms: Option<f64>,
    pub mttd_p95_ms: Option<f64>,
    pub mttd_p99_ms: Option<f64>,
    pub security_score: Option<f64>,
    #[sea_orm(column_type = "JsonBinary")]
    pub vulnerabilities_found: Json,
    pub created_at: DBDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::attack_scenarios::Entity",
        from = "Column::ScenarioId",
        to = "super::attack_scenarios::Column::Id",
        on_delete = "Cascade"
    )]
    Scenario,
    #[sea_orm(
        belongs_to = "super::executions::Entity",
        from = "Column::ExecutionId",
        to = "super::executions::Column::Id",
        on_delete = "SetNull"
    )]
    Execution,
}

impl Related<super::attack_scenarios::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Scenario.def()
    }
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
            if self.id.is_not_set() {
                self.id = Set(Uuid::new_v4());
            }
            if self.vulnerabilities_found.is_not_set() {
                self.vulnerabilities_found = Set(serde_json::json!([]));
            }
            if self.created_at.is_not_set() {
                self.created_at = Set(chrono::Utc::now());
            }
        }

        Ok(self)
    }
}
