use pipewarden_core::require_non_blank;
use pipewarden_database::DbConnection;
use pipewarden_entities::{executions, validation_results};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::types::{PipelineError, RecordValidationRequest};

/// Outcomes of data-quality rules evaluated during an execution
pub struct ValidationResultService {
    db: Arc<DbConnection>,
}

impl ValidationResultService {
    pub fn new(db: Arc<DbConnection>) -> Self {
        Self { db }
    }

    pub async fn record_result(
        &self,
        execution_id: Uuid,
        request: RecordValidationRequest,
    ) -> Result<validation_results::Model, PipelineError> {
        let rule_name = require_non_blank("rule_name", &request.rule_name)?;
        let rule_type = require_non_blank("rule_type", &request.rule_type)?;
        if request.failed_count < 0 {
            return Err(PipelineError::Validation(
                "failed_count must not be negative".to_string(),
            ));
        }
        if request.passed && request.failed_count > 0 {
            return Err(PipelineError::Validation(format!(
                "rule '{}' passed but reports {} failures",
                rule_name, request.failed_count
            )));
        }

        if executions::Entity::find_by_id(execution_id)
            .one(self.db.as_ref())
            .await?
            .is_none()
        {
            return Err(PipelineError::NotFound(format!("execution {}", execution_id)));
        }

        let result = validation_results::ActiveModel {
            execution_id: Set(execution_id),
            rule_name: Set(rule_name),
            rule_type: Set(rule_type),
            passed: Set(request.passed),
            failed_count: Set(request.failed_count),
            failure_details: Set(request.failure_details),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await?;

        debug!(
            "Rule {} on execution {}: passed={}",
            result.rule_name, execution_id, result.passed
        );
        Ok(result)
    }

    /// All results of an execution in recording order
    pub async fn list_results(
        &self,
        execution_id: Uuid,
    ) -> Result<Vec<validation_results::Model>, PipelineError> {
        Ok(validation_results::Entity::find()
            .filter(validation_results::Column::ExecutionId.eq(execution_id))
            .order_by_asc(validation_results::Column::Id)
            .all(self.db.as_ref())
            .await?)
    }

    pub async fn failed_results(
        &self,
        execution_id: Uuid,
    ) -> Result<Vec<validation_results::Model>, PipelineError> {
        Ok(validation_results::Entity::find()
            .filter(validation_results::Column::ExecutionId.eq(execution_id))
            .filter(validation_results::Column::Passed.eq(false))
            .order_by_asc(validation_results::Column::Id)
            .all(self.db.as_ref())
            .await?)
    }

    /// Fraction of rules that passed, `None` when nothing was recorded
    pub async fn pass_rate(&self, execution_id: Uuid) -> Result<Option<f64>, PipelineError> {
        let total = validation_results::Entity::find()
            .filter(validation_results::Column::ExecutionId.eq(execution_id))
            .count(self.db.as_ref())
            .await?;
        if total == 0 {
            return Ok(None);
        }

        let passed = validation_results::Entity::find()
            .filter(validation_results::Column::ExecutionId.eq(execution_id))
            .filter(validation_results::Column::Passed.eq(true))
            .count(self.db.as_ref())
            .await?;

        Ok(Some(passed as f64 / total as f64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn request(passed: bool, failed_count: i64) -> RecordValidationRequest {
        RecordValidationRequest {
            rule_name: "customer_id_not_null".to_string(),
            rule_type: "completeness".to_string(),
            passed,
            failed_count,
            failure_details: None,
        }
    }

    #[tokio::test]
    async fn test_rejects_inconsistent_results_before_querying() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = ValidationResultService::new(db);
        let execution = Uuid::new_v4();

        let passed_with_failures = service.record_result(execution, request(true, 3)).await;
        assert!(matches!(
            passed_with_failures,
            Err(PipelineError::Validation(_))
        ));

        let negative = service.record_result(execution, request(false, -1)).await;
        assert!(matches!(negative, Err(PipelineError::Validation(_))));

        let mut blank = request(false, 1);
        blank.rule_name = " ".to_string();
        let blank = service.record_result(execution, blank).await;
        assert!(matches!(blank, Err(PipelineError::Validation(_))));
    }
}
