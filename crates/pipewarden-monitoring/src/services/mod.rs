pub mod metric_service;
pub mod types;

pub use metric_service::MetricService;
pub use types::*;
