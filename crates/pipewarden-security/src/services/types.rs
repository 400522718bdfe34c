use chrono::{DateTime, Utc};
use pipewarden_core::ServiceError;
use sea_orm::{DbErr, SqlErr};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use thiserror::Error;
use uuid::Uuid;

use crate::counters::SimulationCounters;

#[derive(Error, Debug)]
pub enum SecurityError {
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    #[error("{0} not found")]
    NotFound(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SecurityError {
    pub(crate) fn from_write(err: DbErr, conflict: impl FnOnce() -> String) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => SecurityError::Conflict(conflict()),
            _ => SecurityError::Database(err),
        }
    }
}

impl From<ServiceError> for SecurityError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation { message } => SecurityError::Validation(message),
            ServiceError::NotFound { resource } => SecurityError::NotFound(resource),
            ServiceError::Conflict { message } => SecurityError::Conflict(message),
            other => SecurityError::Internal(other.to_string()),
        }
    }
}

impl From<SecurityError> for ServiceError {
    fn from(err: SecurityError) -> Self {
        match err {
            SecurityError::Database(e) => ServiceError::Database(e.to_string()),
            SecurityError::NotFound(resource) => ServiceError::not_found(resource),
            SecurityError::Validation(message) => ServiceError::validation(message),
            SecurityError::Conflict(message) => ServiceError::Conflict { message },
            SecurityError::Internal(message) => {
                ServiceError::Internal(pipewarden_core::anyhow::anyhow!(message))
            }
        }
    }
}

/// Trims every attack type, drops repeats (first occurrence wins) and
/// rejects blank entries or an empty result.
pub fn normalize_attack_types(attack_types: Vec<String>) -> Result<Vec<String>, SecurityError> {
    let mut normalized: Vec<String> = Vec::with_capacity(attack_types.len());

    for attack_type in attack_types {
        let trimmed = attack_type.trim();
        if trimmed.is_empty() {
            return Err(SecurityError::Validation(
                "attack types must not contain blank entries".to_string(),
            ));
        }
        if !normalized.iter().any(|t| t == trimmed) {
            normalized.push(trimmed.to_string());
        }
    }

    if normalized.is_empty() {
        return Err(SecurityError::Validation(
            "a scenario needs at least one attack type".to_string(),
        ));
    }

    Ok(normalized)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateScenarioRequest {
    pub name: String,
    pub description: Option<String>,
    pub attack_types: Vec<String>,
    pub config: Option<Json>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateScenarioRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub attack_types: Option<Vec<String>>,
    pub config: Option<Json>,
    pub is_active: Option<bool>,
}

/// Mean time to detect, in milliseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MttdStats {
    pub mean_ms: Option<f64>,
    pub p50_ms: Option<f64>,
    pub p95_ms: Option<f64>,
    pub p99_ms: Option<f64>,
}

impl MttdStats {
    pub fn validate(&self) -> Result<(), SecurityError> {
        let values = [
            ("mttd_mean_ms", self.mean_ms),
            ("mttd_p50_ms", self.p50_ms),
            ("mttd_p95_ms", self.p95_ms),
            ("mttd_p99_ms", self.p99_ms),
        ];
        for (field, value) in values {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(SecurityError::Validation(format!(
                        "{} must be a non-negative number, got {}",
                        field, v
                    )));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordSimulationRequest {
    pub scenario_id: Uuid,
    pub execution_id: Option<Uuid>,
    pub attack_type: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub counters: SimulationCounters,
    pub mttd: MttdStats,
    /// 0 to 100
    pub security_score: Option<f64>,
    /// JSON array of findings
    pub vulnerabilities_found: Option<Json>,
}

impl RecordSimulationRequest {
    /// Checks everything that does not need the database
    pub fn validate(&self) -> Result<(), SecurityError> {
        if self.attack_type.trim().is_empty() {
            return Err(SecurityError::Validation(
                "attack_type must not be empty".to_string(),
            ));
        }
        if self.end_time < self.start_time {
            return Err(SecurityError::Validation(
                "end_time must not precede start_time".to_string(),
            ));
        }
        self.counters.validate()?;
        self.mttd.validate()?;
        if let Some(score) = self.security_score {
            if !(0.0..=100.0).contains(&score) {
                return Err(SecurityError::Validation(format!(
                    "security_score must be between 0 and 100, got {}",
                    score
                )));
            }
        }
        if let Some(found) = &self.vulnerabilities_found {
            if !found.is_array() {
                return Err(SecurityError::Validation(
                    "vulnerabilities_found must be a JSON array".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_security_error_converts_to_service_error() {
        assert!(matches!(
            ServiceError::from(SecurityError::NotFound("scenario x".to_string())),
            ServiceError::NotFound { resource } if resource == "scenario x"
        ));
        assert!(matches!(
            ServiceError::from(SecurityError::Conflict("duplicate".to_string())),
            ServiceError::Conflict { .. }
        ));
        assert!(matches!(
            ServiceError::from(SecurityError::Validation("bad score".to_string())),
            ServiceError::Validation { .. }
        ));
        assert!(matches!(
            ServiceError::from(SecurityError::Database(DbErr::Custom("boom".to_string()))),
            ServiceError::Database(_)
        ));
    }

    fn request() -> RecordSimulationRequest {
        let start = Utc::now();
        RecordSimulationRequest {
            scenario_id: Uuid::new_v4(),
            execution_id: None,
            attack_type: "sql_injection".to_string(),
            start_time: start,
            end_time: start + Duration::seconds(30),
            counters: SimulationCounters::new(10, 6, 2, 1),
            mttd: MttdStats {
                mean_ms: Some(120.0),
                p50_ms: Some(100.0),
                p95_ms: Some(300.0),
                p99_ms: Some(450.0),
            },
            security_score: Some(87.5),
            vulnerabilities_found: Some(serde_json::json!([])),
        }
    }

    #[test]
    fn test_normalize_attack_types() {
        let normalized = normalize_attack_types(vec![
            " sql_injection ".to_string(),
            "data_tampering".to_string(),
            "sql_injection".to_string(),
        ])
        .unwrap();
        assert_eq!(normalized, vec!["sql_injection", "data_tampering"]);

        assert!(normalize_attack_types(vec![]).is_err());
        assert!(normalize_attack_types(vec!["replay".to_string(), "  ".to_string()]).is_err());
    }

    #[test]
    fn test_valid_request() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_request_rejections() {
        let mut reversed = request();
        reversed.end_time = reversed.start_time - Duration::seconds(1);
        assert!(reversed.validate().is_err());

        let mut score = request();
        score.security_score = Some(100.5);
        assert!(score.validate().is_err());

        let mut mttd = request();
        mttd.mttd.p99_ms = Some(-1.0);
        assert!(mttd.validate().is_err());

        let mut blank = request();
        blank.attack_type = "  ".to_string();
        assert!(blank.validate().is_err());

        let mut findings = request();
        findings.vulnerabilities_found = Some(serde_json::json!({"sql": 1}));
        assert!(findings.validate().is_err());
    }

    #[test]
    fn test_boundary_score_accepted() {
        let mut zero = request();
        zero.security_score = Some(0.0);
        assert!(zero.validate().is_ok());

        let mut full = request();
        full.security_score = Some(100.0);
        assert!(full.validate().is_ok());
    }
}
