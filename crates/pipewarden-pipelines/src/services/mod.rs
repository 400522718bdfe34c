pub mod audit_log_service;
pub mod execution_service;
pub mod pipeline_service;
pub mod types;
pub mod validation_service;

pub use audit_log_service::AuditLogService;
pub use execution_service::ExecutionService;
pub use pipeline_service::PipelineService;
pub use types::*;
pub use validation_service::ValidationResultService;
