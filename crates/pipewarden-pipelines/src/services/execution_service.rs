use chrono::Utc;
use pipewarden_core::PaginationParams;
use pipewarden_database::DbConnection;
use pipewarden_entities::types::ExecutionStatus;
use pipewarden_entities::views::{ExecutionSummary, EXECUTION_SUMMARY_VIEW};
use pipewarden_entities::{executions, pipelines};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseBackend, DatabaseTransaction, EntityTrait,
    FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, Statement,
    TransactionTrait,
};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::types::{FinishExecutionRequest, PipelineError};

/// Lifecycle of pipeline runs: pending -> running -> completed | failed | cancelled
pub struct ExecutionService {
    db: Arc<DbConnection>,
}

fn validate_counts(processed: i64, failed: i64) -> Result<(), PipelineError> {
    if processed < 0 || failed < 0 {
        return Err(PipelineError::Validation(
            "record counts must not be negative".to_string(),
        ));
    }
    if failed > processed {
        return Err(PipelineError::Validation(format!(
            "records_failed ({}) exceeds records_processed ({})",
            failed, processed
        )));
    }
    Ok(())
}

/// `LIMIT` value for a caller-supplied row count
fn summary_limit(limit: u64) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

/// Reads the execution with `FOR UPDATE`; concurrent writers queue behind the
/// transaction and see its committed status
async fn lock_execution(
    txn: &DatabaseTransaction,
    id: Uuid,
) -> Result<executions::Model, PipelineError> {
    executions::Entity::find_by_id(id)
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or_else(|| PipelineError::NotFound(format!("execution {}", id)))
}

impl ExecutionService {
    pub fn new(db: Arc<DbConnection>) -> Self {
        Self { db }
    }

    async fn ensure_pipeline(&self, pipeline_id: Uuid) -> Result<(), PipelineError> {
        let exists = pipelines::Entity::find_by_id(pipeline_id)
            .one(self.db.as_ref())
            .await?
            .is_some();
        if !exists {
            return Err(PipelineError::NotFound(format!("pipeline {}", pipeline_id)));
        }
        Ok(())
    }

    async fn insert_with_status(
        &self,
        pipeline_id: Uuid,
        status: ExecutionStatus,
    ) -> Result<executions::Model, PipelineError> {
        self.ensure_pipeline(pipeline_id).await?;

        let execution = executions::ActiveModel {
            pipeline_id: Set(pipeline_id),
            status: Set(status),
            start_time: Set(Utc::now()),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await?;

        info!(
            "Execution {} of pipeline {} created as {}",
            execution.id, pipeline_id, status
        );
        Ok(execution)
    }

    /// Registers a run that has not started yet
    pub async fn create_execution(
        &self,
        pipeline_id: Uuid,
    ) -> Result<executions::Model, PipelineError> {
        self.insert_with_status(pipeline_id, ExecutionStatus::Pending)
            .await
    }

    /// Registers a run that is already in progress
    pub async fn start_execution(
        &self,
        pipeline_id: Uuid,
    ) -> Result<executions::Model, PipelineError> {
        self.insert_with_status(pipeline_id, ExecutionStatus::Running)
            .await
    }

    pub async fn get_execution(&self, id: Uuid) -> Result<executions::Model, PipelineError> {
        executions::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| PipelineError::NotFound(format!("execution {}", id)))
    }

    /// Moves a pending execution to running; the start time becomes now
    pub async fn mark_running(&self, id: Uuid) -> Result<executions::Model, PipelineError> {
        let txn = self.db.begin().await?;
        let existing = lock_execution(&txn, id).await?;
        if existing.status != ExecutionStatus::Pending {
            return Err(PipelineError::InvalidState(format!(
                "execution {} is {}, only pending executions can start",
                id, existing.status
            )));
        }

        let mut execution: executions::ActiveModel = existing.into();
        execution.status = Set(ExecutionStatus::Running);
        execution.start_time = Set(Utc::now());

        let running = execution.update(&txn).await?;
        txn.commit().await?;
        Ok(running)
    }

    /// Overwrites the running totals of a non-terminal execution
    pub async fn record_progress(
        &self,
        id: Uuid,
        records_processed: i64,
        records_failed: i64,
    ) -> Result<executions::Model, PipelineError> {
        validate_counts(records_processed, records_failed)?;

        let txn = self.db.begin().await?;
        let existing = lock_execution(&txn, id).await?;
        if existing.status.is_terminal() {
            return Err(PipelineError::InvalidState(format!(
                "execution {} already {}",
                id, existing.status
            )));
        }

        let mut execution: executions::ActiveModel = existing.into();
        execution.records_processed = Set(records_processed);
        execution.records_failed = Set(records_failed);

        let updated = execution.update(&txn).await?;
        txn.commit().await?;
        debug!(
            "Execution {} progress: {} processed, {} failed",
            id, records_processed, records_failed
        );
        Ok(updated)
    }

    /// Closes the execution with a terminal status and its final counts
    pub async fn finish_execution(
        &self,
        id: Uuid,
        request: FinishExecutionRequest,
    ) -> Result<executions::Model, PipelineError> {
        if !request.status.is_terminal() {
            return Err(PipelineError::Validation(format!(
                "cannot finish an execution as {}",
                request.status
            )));
        }
        validate_counts(request.records_processed, request.records_failed)?;

        let txn = self.db.begin().await?;
        let existing = lock_execution(&txn, id).await?;
        if existing.status.is_terminal() {
            return Err(PipelineError::InvalidState(format!(
                "execution {} already {}",
                id, existing.status
            )));
        }

        // end_time must never precede start_time
        let end_time = Utc::now().max(existing.start_time);

        let mut execution: executions::ActiveModel = existing.into();
        execution.status = Set(request.status);
        execution.end_time = Set(Some(end_time));
        execution.records_processed = Set(request.records_processed);
        execution.records_failed = Set(request.records_failed);
        if let Some(message) = request.error_message {
            execution.error_message = Set(Some(message));
        }
        if let Some(metrics) = request.metrics {
            execution.metrics = Set(metrics);
        }

        let finished = execution.update(&txn).await?;
        txn.commit().await?;
        match finished.status {
            ExecutionStatus::Failed => warn!(
                "Execution {} failed: {}",
                id,
                finished.error_message.as_deref().unwrap_or("no error message")
            ),
            status => info!("Execution {} {}", id, status),
        }
        Ok(finished)
    }

    /// Executions of a pipeline, newest first
    pub async fn list_executions(
        &self,
        pipeline_id: Uuid,
        status: Option<ExecutionStatus>,
        pagination: PaginationParams,
    ) -> Result<(Vec<executions::Model>, u64), PipelineError> {
        let (page, page_size) = pagination.normalize();

        let mut query =
            executions::Entity::find().filter(executions::Column::PipelineId.eq(pipeline_id));
        if let Some(status) = status {
            query = query.filter(executions::Column::Status.eq(status));
        }

        let paginator = query
            .order_by_desc(executions::Column::StartTime)
            .paginate(self.db.as_ref(), page_size);
        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(page - 1).await?;

        Ok((models, total))
    }

    pub async fn delete_execution(&self, id: Uuid) -> Result<(), PipelineError> {
        let result = executions::Entity::delete_by_id(id)
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(PipelineError::NotFound(format!("execution {}", id)));
        }
        Ok(())
    }

    pub async fn get_summary(&self, execution_id: Uuid) -> Result<ExecutionSummary, PipelineError> {
        ExecutionSummary::find_by_statement(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            format!(
                "SELECT * FROM {} WHERE execution_id = $1",
                EXECUTION_SUMMARY_VIEW
            ),
            [execution_id.into()],
        ))
        .one(self.db.as_ref())
        .await?
        .ok_or_else(|| PipelineError::NotFound(format!("execution {}", execution_id)))
    }

    /// Most recent summaries, optionally restricted to one pipeline
    pub async fn list_summaries(
        &self,
        pipeline_id: Option<Uuid>,
        limit: u64,
    ) -> Result<Vec<ExecutionSummary>, PipelineError> {
        let limit = summary_limit(limit);
        let statement = match pipeline_id {
            Some(pipeline_id) => Statement::from_sql_and_values(
                DatabaseBackend::Postgres,
                format!(
                    "SELECT * FROM {} WHERE pipeline_id = $1 ORDER BY start_time DESC LIMIT $2",
                    EXECUTION_SUMMARY_VIEW
                ),
                [pipeline_id.into(), limit.into()],
            ),
            None => Statement::from_sql_and_values(
                DatabaseBackend::Postgres,
                format!(
                    "SELECT * FROM {} ORDER BY start_time DESC LIMIT $1",
                    EXECUTION_SUMMARY_VIEW
                ),
                [limit.into()],
            ),
        };

        Ok(ExecutionSummary::find_by_statement(statement)
            .all(self.db.as_ref())
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn sample_execution(status: ExecutionStatus) -> executions::Model {
        let now = Utc::now();
        executions::Model {
            id: Uuid::new_v4(),
            pipeline_id: Uuid::new_v4(),
            status,
            start_time: now,
            end_time: None,
            records_processed: 0,
            records_failed: 0,
            error_message: None,
            metrics: serde_json::json!({}),
            created_at: now,
        }
    }

    #[test]
    fn test_validate_counts() {
        assert!(validate_counts(10, 2).is_ok());
        assert!(validate_counts(0, 0).is_ok());
        assert!(matches!(
            validate_counts(-1, 0),
            Err(PipelineError::Validation(_))
        ));
        assert!(matches!(
            validate_counts(3, 4),
            Err(PipelineError::Validation(_))
        ));
    }

    #[test]
    fn test_summary_limit_saturates() {
        assert_eq!(summary_limit(20), 20);
        assert_eq!(summary_limit(i64::MAX as u64), i64::MAX);
        assert_eq!(summary_limit(u64::MAX), i64::MAX);
    }

    #[tokio::test]
    async fn test_finish_rejects_non_terminal_status() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = ExecutionService::new(db);

        let request = FinishExecutionRequest {
            status: ExecutionStatus::Running,
            records_processed: 1,
            records_failed: 0,
            error_message: None,
            metrics: None,
        };
        let result = service.finish_execution(Uuid::new_v4(), request).await;
        assert!(matches!(result, Err(PipelineError::Validation(_))));
    }

    #[tokio::test]
    async fn test_finish_rejects_terminal_execution() {
        let completed = sample_execution(ExecutionStatus::Completed);
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![completed.clone()]])
                .into_connection(),
        );
        let service = ExecutionService::new(db);

        let result = service
            .finish_execution(completed.id, FinishExecutionRequest::completed(5, 0))
            .await;
        assert!(matches!(result, Err(PipelineError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_record_progress_rejects_terminal_execution() {
        let cancelled = sample_execution(ExecutionStatus::Cancelled);
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![cancelled.clone()]])
                .into_connection(),
        );
        let service = ExecutionService::new(db);

        let result = service.record_progress(cancelled.id, 10, 1).await;
        assert!(matches!(result, Err(PipelineError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_state_checks_read_the_row_for_update() {
        let failed = sample_execution(ExecutionStatus::Failed);
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![failed.clone()]])
                .into_connection(),
        );
        let service = ExecutionService::new(db.clone());

        let result = service
            .finish_execution(failed.id, FinishExecutionRequest::completed(1, 0))
            .await;
        assert!(matches!(result, Err(PipelineError::InvalidState(_))));

        drop(service);
        let db = Arc::try_unwrap(db).expect("single owner");
        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains("FOR UPDATE"));
    }

    #[tokio::test]
    async fn test_mark_running_requires_pending() {
        let running = sample_execution(ExecutionStatus::Running);
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![running.clone()]])
                .into_connection(),
        );
        let service = ExecutionService::new(db);

        let result = service.mark_running(running.id).await;
        assert!(matches!(result, Err(PipelineError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_create_execution_for_unknown_pipeline() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<pipelines::Model>::new()])
                .into_connection(),
        );
        let service = ExecutionService::new(db);

        let result = service.create_execution(Uuid::new_v4()).await;
        assert!(matches!(result, Err(PipelineError::NotFound(_))));
    }
}
