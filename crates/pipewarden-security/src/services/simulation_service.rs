use pipewarden_database::DbConnection;
use pipewarden_entities::views::{SecurityPosture, SECURITY_POSTURE_VIEW};
use pipewarden_entities::{attack_scenarios, executions, simulation_results};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseBackend, EntityTrait, FromQueryResult, QueryFilter,
    QueryOrder, Set, Statement,
};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::types::{RecordSimulationRequest, SecurityError};

/// Results of attack simulations run against pipelines
pub struct SimulationService {
    db: Arc<DbConnection>,
}

impl SimulationService {
    pub fn new(db: Arc<DbConnection>) -> Self {
        Self { db }
    }

    pub async fn record_result(
        &self,
        request: RecordSimulationRequest,
    ) -> Result<simulation_results::Model, SecurityError> {
        request.validate()?;
        let attack_type = request.attack_type.trim().to_string();

        let scenario = attack_scenarios::Entity::find_by_id(request.scenario_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| SecurityError::NotFound(format!("scenario {}", request.scenario_id)))?;
        if !scenario.covers(&attack_type) {
            return Err(SecurityError::Validation(format!(
                "scenario '{}' does not cover attack type '{}'",
                scenario.name, attack_type
            )));
        }

        if let Some(execution_id) = request.execution_id {
            if executions::Entity::find_by_id(execution_id)
                .one(self.db.as_ref())
                .await?
                .is_none()
            {
                return Err(SecurityError::NotFound(format!("execution {}", execution_id)));
            }
        }

        let counters = request.counters;
        let mut result = simulation_results::ActiveModel {
            scenario_id: Set(request.scenario_id),
            execution_id: Set(request.execution_id),
            attack_type: Set(attack_type),
            start_time: Set(request.start_time),
            end_time: Set(request.end_time),
            attempts_total: Set(counters.total),
            attempts_detected: Set(counters.detected),
            attempts_blocked: Set(counters.blocked),
            attempts_successful: Set(counters.successful),
            mttd_mean_ms: Set(request.mttd.mean_ms),
            mttd_p50_ms: Set(request.mttd.p50_ms),
            mttd_p95_ms: Set(request.mttd.p95_ms),
            mttd_p99_ms: Set(request.mttd.p99_ms),
            security_score: Set(request.security_score),
            ..Default::default()
        };
        if let Some(found) = request.vulnerabilities_found {
            result.vulnerabilities_found = Set(found);
        }

        let saved = result.insert(self.db.as_ref()).await?;

        if saved.attempts_successful > 0 {
            warn!(
                "Simulation {} ({}): {} of {} attempts succeeded",
                saved.id, saved.attack_type, saved.attempts_successful, saved.attempts_total
            );
        } else {
            info!(
                "Simulation {} ({}) recorded, score {:?}",
                saved.id, saved.attack_type, saved.security_score
            );
        }
        Ok(saved)
    }

    /// Newest first
    pub async fn list_for_scenario(
        &self,
        scenario_id: Uuid,
    ) -> Result<Vec<simulation_results::Model>, SecurityError> {
        Ok(simulation_results::Entity::find()
            .filter(simulation_results::Column::ScenarioId.eq(scenario_id))
            .order_by_desc(simulation_results::Column::StartTime)
            .all(self.db.as_ref())
            .await?)
    }

    pub async fn list_for_execution(
        &self,
        execution_id: Uuid,
    ) -> Result<Vec<simulation_results::Model>, SecurityError> {
        Ok(simulation_results::Entity::find()
            .filter(simulation_results::Column::ExecutionId.eq(execution_id))
            .order_by_desc(simulation_results::Column::StartTime)
            .all(self.db.as_ref())
            .await?)
    }

    /// One rollup row per attack type
    pub async fn security_posture(&self) -> Result<Vec<SecurityPosture>, SecurityError> {
        Ok(SecurityPosture::find_by_statement(Statement::from_string(
            DatabaseBackend::Postgres,
            format!("SELECT * FROM {} ORDER BY attack_type", SECURITY_POSTURE_VIEW),
        ))
        .all(self.db.as_ref())
        .await?)
    }

    /// `None` when no simulation with attempts exists for the type
    pub async fn posture_for(
        &self,
        attack_type: &str,
    ) -> Result<Option<SecurityPosture>, SecurityError> {
        Ok(SecurityPosture::find_by_statement(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            format!("SELECT * FROM {} WHERE attack_type = $1", SECURITY_POSTURE_VIEW),
            [attack_type.trim().into()],
        ))
        .one(self.db.as_ref())
        .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counters::SimulationCounters;
    use crate::services::MttdStats;
    use chrono::Utc;
    use sea_orm::MockDatabase;

    fn scenario(attack_types: &[&str]) -> attack_scenarios::Model {
        let now = Utc::now();
        attack_scenarios::Model {
            id: Uuid::new_v4(),
            name: "injection".to_string(),
            description: None,
            attack_types: attack_types.iter().map(|t| t.to_string()).collect(),
            config: serde_json::json!({}),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn request(scenario_id: Uuid, attack_type: &str) -> RecordSimulationRequest {
        let now = Utc::now();
        RecordSimulationRequest {
            scenario_id,
            execution_id: None,
            attack_type: attack_type.to_string(),
            start_time: now,
            end_time: now,
            counters: SimulationCounters::new(4, 2, 1, 1),
            mttd: MttdStats::default(),
            security_score: Some(75.0),
            vulnerabilities_found: None,
        }
    }

    #[tokio::test]
    async fn test_rejects_attack_type_outside_scenario() {
        let scenario = scenario(&["sql_injection"]);
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![scenario.clone()]])
                .into_connection(),
        );
        let service = SimulationService::new(db);

        let result = service
            .record_result(request(scenario.id, "replay_attack"))
            .await;
        assert!(matches!(result, Err(SecurityError::Validation(_))));
    }

    #[tokio::test]
    async fn test_rejects_unknown_scenario() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<attack_scenarios::Model>::new()])
                .into_connection(),
        );
        let service = SimulationService::new(db);

        let result = service
            .record_result(request(Uuid::new_v4(), "sql_injection"))
            .await;
        assert!(matches!(result, Err(SecurityError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_invalid_counters_never_reach_database() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = SimulationService::new(db);

        let mut bad = request(Uuid::new_v4(), "sql_injection");
        bad.counters = SimulationCounters::new(3, 2, 1, 1);
        let result = service.record_result(bad).await;
        assert!(matches!(result, Err(SecurityError::Validation(_))));
    }
}
