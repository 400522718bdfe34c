use pipewarden_core::require_non_blank;
use pipewarden_database::DbConnection;
use pipewarden_entities::attack_scenarios;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::types::{
    normalize_attack_types, CreateScenarioRequest, SecurityError, UpdateScenarioRequest,
};

pub struct ScenarioService {
    db: Arc<DbConnection>,
}

impl ScenarioService {
    pub fn new(db: Arc<DbConnection>) -> Self {
        Self { db }
    }

    pub async fn create_scenario(
        &self,
        request: CreateScenarioRequest,
    ) -> Result<attack_scenarios::Model, SecurityError> {
        let name = require_non_blank("name", &request.name)?;
        let attack_types = normalize_attack_types(request.attack_types)?;

        let mut scenario = attack_scenarios::ActiveModel {
            name: Set(name.clone()),
            description: Set(request.description),
            attack_types: Set(attack_types),
            ..Default::default()
        };
        if let Some(config) = request.config {
            scenario.config = Set(config);
        }
        if let Some(is_active) = request.is_active {
            scenario.is_active = Set(is_active);
        }

        let created = scenario.insert(self.db.as_ref()).await.map_err(|e| {
            SecurityError::from_write(e, || format!("scenario '{}' already exists", name))
        })?;

        info!(
            "Created attack scenario {} covering {:?}",
            created.name, created.attack_types
        );
        Ok(created)
    }

    pub async fn get_scenario(&self, id: Uuid) -> Result<attack_scenarios::Model, SecurityError> {
        attack_scenarios::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| SecurityError::NotFound(format!("scenario {}", id)))
    }

    pub async fn get_scenario_by_name(
        &self,
        name: &str,
    ) -> Result<attack_scenarios::Model, SecurityError> {
        attack_scenarios::Entity::find()
            .filter(attack_scenarios::Column::Name.eq(name))
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| SecurityError::NotFound(format!("scenario '{}'", name)))
    }

    pub async fn list_scenarios(
        &self,
        active_only: bool,
    ) -> Result<Vec<attack_scenarios::Model>, SecurityError> {
        let mut query = attack_scenarios::Entity::find();
        if active_only {
            query = query.filter(attack_scenarios::Column::IsActive.eq(true));
        }

        Ok(query
            .order_by_asc(attack_scenarios::Column::Name)
            .all(self.db.as_ref())
            .await?)
    }

    pub async fn update_scenario(
        &self,
        id: Uuid,
        request: UpdateScenarioRequest,
    ) -> Result<attack_scenarios::Model, SecurityError> {
        let name = request
            .name
            .as_deref()
            .map(|n| require_non_blank("name", n))
            .transpose()?;
        let attack_types = request
            .attack_types
            .map(normalize_attack_types)
            .transpose()?;

        let existing = self.get_scenario(id).await?;
        let mut scenario: attack_scenarios::ActiveModel = existing.into();

        if let Some(name) = name.clone() {
            scenario.name = Set(name);
        }
        if let Some(description) = request.description {
            scenario.description = Set(Some(description));
        }
        if let Some(attack_types) = attack_types {
            scenario.attack_types = Set(attack_types);
        }
        if let Some(config) = request.config {
            scenario.config = Set(config);
        }
        if let Some(is_active) = request.is_active {
            scenario.is_active = Set(is_active);
        }

        Ok(scenario.update(self.db.as_ref()).await.map_err(|e| {
            SecurityError::from_write(e, || {
                format!("scenario '{}' already exists", name.unwrap_or_default())
            })
        })?)
    }

    /// Removes the scenario together with its simulation results
    pub async fn delete_scenario(&self, id: Uuid) -> Result<(), SecurityError> {
        let result = attack_scenarios::Entity::delete_by_id(id)
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(SecurityError::NotFound(format!("scenario {}", id)));
        }

        info!("Deleted attack scenario {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_rejects_empty_attack_types_without_querying() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = ScenarioService::new(db.clone());

        let result = service
            .create_scenario(CreateScenarioRequest {
                name: "replay_only".to_string(),
                description: None,
                attack_types: vec![],
                config: None,
                is_active: None,
            })
            .await;
        assert!(matches!(result, Err(SecurityError::Validation(_))));

        drop(service);
        let db = Arc::try_unwrap(db).expect("single owner");
        assert!(db.into_transaction_log().is_empty());
    }

    #[tokio::test]
    async fn test_update_rejects_blank_attack_type() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = ScenarioService::new(db);

        let result = service
            .update_scenario(
                Uuid::new_v4(),
                UpdateScenarioRequest {
                    attack_types: Some(vec!["sql_injection".to_string(), "".to_string()]),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(SecurityError::Validation(_))));
    }
}
