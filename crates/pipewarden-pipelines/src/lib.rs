//! Pipeline registry, execution tracking, validation results and audit trail
//! for the `pipeline` schema

pub mod services;


pub use services::{
    AuditEntry, AuditLogFilter, AuditLogService, CreatePipelineRequest, ExecutionService,
    FinishExecutionRequest, PipelineError, PipelineService, RecordValidationRequest,
    UpdatePipelineRequest, ValidationResultService,
};
