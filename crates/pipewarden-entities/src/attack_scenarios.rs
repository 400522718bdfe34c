use async_trait::async_trait;
use pipewarden_core::DBDateTime;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue::Set, ConnectionTrait, DbErr};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(schema_name = "security", table_name = "attack_scenarios")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
    pub description: Option<String>,
    /// Attack families exercised by this scenario; never empty
    pub attack_types: Vec<String>,
    #[sea_orm(column_type = "JsonBinary")]
    pub config: Json,
    pub is_active: bool,
    pub created_at: DBDateTime,
    pub updated_at: DBDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::simulation_results::Entity")]
    SimulationResults,
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
        let now = chrono::Utc::now();

        if insert {
            if self.id.is_not_set() {
                self.id = Set(Uuid::new_v4());
            }
            if self.config.is_not_set() {
                self.config = Set(serde_json::json!({}));
            }
            if self.is_active.is_not_set() {
                self.is_active = Set(true);
            }
            if self.created_at.is_not_set() {
                self.created_at = Set(now);
            }
            if self.updated_at.is_not_set() {
                self.updated_at = Set(now);
            }
        } else {
            self.updated_at = Set(now);
        }

        Ok(self)
    }
}

impl Model {
    pub fn covers(&self, attack_type: &str) -> bool {
        self.attack_types.iter().any(|t| t == attack_type)
    }
}
