use pipewarden_core::{ServiceError, UtcDateTime};
use pipewarden_entities::types::{ExecutionStatus, LogLevel};
use sea_orm::sea_query::LikeExpr;
use sea_orm::{DbErr, SqlErr};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    #[error("{0} not found")]
    NotFound(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    /// Classifies a failed write: unique violations become `Conflict`
    pub(crate) fn from_write(err: DbErr, conflict: impl FnOnce() -> String) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => PipelineError::Conflict(conflict()),
            _ => PipelineError::Database(err),
        }
    }
}

impl From<ServiceError> for PipelineError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation { message } => PipelineError::Validation(message),
            ServiceError::NotFound { resource } => PipelineError::NotFound(resource),
            ServiceError::Conflict { message } => PipelineError::Conflict(message),
            other => PipelineError::Internal(other.to_string()),
        }
    }
}

impl From<PipelineError> for ServiceError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Database(e) => ServiceError::Database(e.to_string()),
            PipelineError::NotFound(resource) => ServiceError::not_found(resource),
            PipelineError::Validation(message) | PipelineError::InvalidState(message) => {
                ServiceError::validation(message)
            }
            PipelineError::Conflict(message) => ServiceError::Conflict { message },
            PipelineError::Internal(message) => {
                ServiceError::Internal(pipewarden_core::anyhow::anyhow!(message))
            }
        }
    }
}

/// `%term%` with the LIKE wildcards of `term` escaped by a backslash
pub(crate) fn like_contains(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

pub(crate) fn contains_pattern(term: &str) -> LikeExpr {
    LikeExpr::new(like_contains(term)).escape('\\')
}

// Request DTOs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePipelineRequest {
    pub name: String,
    pub description: Option<String>,
    pub config: Option<Json>,
    pub is_active: Option<bool>,
    pub created_by: Option<String>,
}

impl CreatePipelineRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            config: None,
            is_active: None,
            created_by: None,
        }
    }
}

/// Partial update; `None` leaves the column untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePipelineRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub config: Option<Json>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinishExecutionRequest {
    /// Must be terminal: completed, failed or cancelled
    pub status: ExecutionStatus,
    pub records_processed: i64,
    pub records_failed: i64,
    pub error_message: Option<String>,
    pub metrics: Option<Json>,
}

impl FinishExecutionRequest {
    pub fn completed(records_processed: i64, records_failed: i64) -> Self {
        Self {
            status: ExecutionStatus::Completed,
            records_processed,
            records_failed,
            error_message: None,
            metrics: None,
        }
    }

    pub fn failed(records_processed: i64, records_failed: i64, error: impl Into<String>) -> Self {
        Self {
            status: ExecutionStatus::Failed,
            records_processed,
            records_failed,
            error_message: Some(error.into()),
            metrics: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordValidationRequest {
    pub rule_name: String,
    pub rule_type: String,
    pub passed: bool,
    pub failed_count: i64,
    pub failure_details: Option<Json>,
}

/// A single audit trail entry to be written
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub level: LogLevel,
    pub module: String,
    pub event: String,
    pub execution_id: Option<Uuid>,
    pub message: Option<String>,
    pub correlation_id: Option<Uuid>,
    pub context: Option<Json>,
}

impl AuditEntry {
    pub fn new(level: LogLevel, module: impl Into<String>, event: impl Into<String>) -> Self {
        Self {
            level,
            module: module.into(),
            event: event.into(),
            execution_id: None,
            message: None,
            correlation_id: None,
            context: None,
        }
    }

    pub fn with_execution(mut self, execution_id: Uuid) -> Self {
        self.execution_id = Some(execution_id);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_correlation(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    pub fn with_context(mut self, context: Json) -> Self {
        self.context = Some(context);
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditLogFilter {
    /// Entries at this severity or above
    pub min_level: Option<LogLevel>,
    pub module: Option<String>,
    pub from: Option<UtcDateTime>,
    pub to: Option<UtcDateTime>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}
