use async_trait::async_trait;
use pipewarden_core::DBDateTime;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue::Set, ConnectionTrait, DbErr};
use serde::{Deserialize, Serialize};

use crate::types::MetricType;

/// One sample of a labelled time series
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(schema_name = "monitoring", table_name = "metrics")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub metric_name: String,
    pub metric_type: MetricType,
    pub value: f64,
    #[sea_orm(column_type = "JsonBinary")]
    pub labels: Json,
    pub timestamp: DBDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if insert {
            if self.labels.is_not_set() {
                self.labels = Set(serde_json::json!({}));
            }
            if self.timestamp.is_not_set() {
                self.timestamp = Set(chrono::Utc::now());
            }
        }

        Ok(self)
    }
}
