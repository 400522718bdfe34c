use pipewarden_core::{ServiceError, UtcDateTime};
use pipewarden_entities::types::MetricType;
use sea_orm::{DbErr, FromQueryResult};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitoringError {
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for MonitoringError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound { resource } => MonitoringError::NotFound(resource),
            ServiceError::Validation { message } => MonitoringError::Validation(message),
            ServiceError::Conflict { message } => MonitoringError::Conflict(message),
            other => MonitoringError::Internal(other.to_string()),
        }
    }
}

impl From<MonitoringError> for ServiceError {
    fn from(err: MonitoringError) -> Self {
        match err {
            MonitoringError::Database(e) => ServiceError::Database(e.to_string()),
            MonitoringError::NotFound(resource) => ServiceError::not_found(resource),
            MonitoringError::Validation(message) => ServiceError::validation(message),
            MonitoringError::Conflict(message) => ServiceError::Conflict { message },
            MonitoringError::Internal(message) => ServiceError::Internal(pipewarden_core::anyhow::anyhow!(message)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordMetricRequest {
    pub name: String,
    pub metric_type: MetricType,
    pub value: f64,
    /// JSON object of label name to value
    pub labels: Option<Json>,
    /// Defaults to now
    pub timestamp: Option<UtcDateTime>,
}

impl RecordMetricRequest {
    pub fn new(name: impl Into<String>, metric_type: MetricType, value: f64) -> Self {
        Self {
            name: name.into(),
            metric_type,
            value,
            labels: None,
            timestamp: None,
        }
    }

    pub fn with_labels(mut self, labels: Json) -> Self {
        self.labels = Some(labels);
        self
    }

    pub fn at(mut self, timestamp: UtcDateTime) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Checks the sample in isolation
    pub fn validate(&self) -> Result<(), MonitoringError> {
        if self.name.trim().is_empty() {
            return Err(MonitoringError::Validation(
                "metric name must not be empty".to_string(),
            ));
        }
        if !self.value.is_finite() {
            return Err(MonitoringError::Validation(format!(
                "metric '{}' has a non-finite value",
                self.name
            )));
        }
        if self.metric_type == MetricType::Counter && self.value < 0.0 {
            return Err(MonitoringError::Validation(format!(
                "counter '{}' cannot be negative",
                self.name
            )));
        }
        if let Some(labels) = &self.labels {
            if !labels.is_object() {
                return Err(MonitoringError::Validation(
                    "labels must be a JSON object".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricQuery {
    pub name: String,
    pub from: Option<UtcDateTime>,
    pub to: Option<UtcDateTime>,
    /// Samples whose labels contain every pair of this object
    pub labels: Option<Json>,
    pub limit: Option<u64>,
}

impl MetricQuery {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Summary statistics over a window of samples
#[derive(Debug, Clone, PartialEq, Serialize, FromQueryResult)]
pub struct MetricAggregate {
    pub count: i64,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub sum: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_metric_requests() {
        assert!(RecordMetricRequest::new("rows_in", MetricType::Counter, 10.0)
            .validate()
            .is_ok());
        assert!(RecordMetricRequest::new("lag", MetricType::Gauge, -3.5)
            .validate()
            .is_ok());

        assert!(RecordMetricRequest::new("rows_in", MetricType::Counter, -1.0)
            .validate()
            .is_err());
        assert!(RecordMetricRequest::new(" ", MetricType::Gauge, 1.0)
            .validate()
            .is_err());
        assert!(RecordMetricRequest::new("lag", MetricType::Gauge, f64::NAN)
            .validate()
            .is_err());
        assert!(
            RecordMetricRequest::new("latency", MetricType::Histogram, f64::INFINITY)
                .validate()
                .is_err()
        );
        assert!(RecordMetricRequest::new("lag", MetricType::Gauge, 1.0)
            .with_labels(serde_json::json!(["stage"]))
            .validate()
            .is_err());
    }
}
