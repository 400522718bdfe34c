use pipewarden_core::require_non_blank;
use pipewarden_database::DbConnection;
use pipewarden_entities::audit_logs;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set};
use std::sync::Arc;
use uuid::Uuid;

use super::types::{contains_pattern, AuditEntry, AuditLogFilter, PipelineError};

const DEFAULT_FILTER_LIMIT: u64 = 100;

/// Structured audit trail of pipeline activity
pub struct AuditLogService {
    db: Arc<DbConnection>,
}

impl AuditLogService {
    pub fn new(db: Arc<DbConnection>) -> Self {
        Self { db }
    }

    pub async fn write(&self, entry: AuditEntry) -> Result<audit_logs::Model, PipelineError> {
        let module = require_non_blank("module", &entry.module)?;
        let event = require_non_blank("event", &entry.event)?;

        let mut log = audit_logs::ActiveModel {
            execution_id: Set(entry.execution_id),
            level: Set(entry.level),
            module: Set(module),
            event: Set(event),
            message: Set(entry.message),
            correlation_id: Set(entry.correlation_id),
            ..Default::default()
        };
        if let Some(context) = entry.context {
            if !context.is_object() {
                return Err(PipelineError::Validation(
                    "audit context must be a JSON object".to_string(),
                ));
            }
            log.context = Set(context);
        }

        Ok(log.insert(self.db.as_ref()).await?)
    }

    /// Entries of an execution in chronological order
    pub async fn list_for_execution(
        &self,
        execution_id: Uuid,
    ) -> Result<Vec<audit_logs::Model>, PipelineError> {
        Ok(audit_logs::Entity::find()
            .filter(audit_logs::Column::ExecutionId.eq(execution_id))
            .order_by_asc(audit_logs::Column::Timestamp)
            .order_by_asc(audit_logs::Column::Id)
            .all(self.db.as_ref())
            .await?)
    }

    pub async fn list_by_correlation(
        &self,
        correlation_id: Uuid,
    ) -> Result<Vec<audit_logs::Model>, PipelineError> {
        Ok(audit_logs::Entity::find()
            .filter(audit_logs::Column::CorrelationId.eq(correlation_id))
            .order_by_asc(audit_logs::Column::Timestamp)
            .order_by_asc(audit_logs::Column::Id)
            .all(self.db.as_ref())
            .await?)
    }

    /// Newest first
    pub async fn filter(
        &self,
        filter: AuditLogFilter,
    ) -> Result<Vec<audit_logs::Model>, PipelineError> {
        let mut query = audit_logs::Entity::find();

        if let Some(min_level) = filter.min_level {
            let levels: Vec<&str> = min_level.at_or_above().iter().map(|l| l.as_str()).collect();
            query = query.filter(audit_logs::Column::Level.is_in(levels));
        }
        if let Some(module) = filter.module {
            query = query.filter(audit_logs::Column::Module.eq(module));
        }
        if let Some(from) = filter.from {
            query = query.filter(audit_logs::Column::Timestamp.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(audit_logs::Column::Timestamp.lte(to));
        }

        Ok(query
            .order_by_desc(audit_logs::Column::Timestamp)
            .order_by_desc(audit_logs::Column::Id)
            .limit(filter.limit.unwrap_or(DEFAULT_FILTER_LIMIT))
            .offset(filter.offset.unwrap_or(0))
            .all(self.db.as_ref())
            .await?)
    }

    /// Case-insensitive substring match on the event name
    pub async fn search_events(
        &self,
        term: &str,
        limit: u64,
    ) -> Result<Vec<audit_logs::Model>, PipelineError> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(Vec::new());
        }

        Ok(audit_logs::Entity::find()
            .filter(Expr::col(audit_logs::Column::Event).ilike(contains_pattern(term)))
            .order_by_desc(audit_logs::Column::Timestamp)
            .limit(limit)
            .all(self.db.as_ref())
            .await?)
    }
}
