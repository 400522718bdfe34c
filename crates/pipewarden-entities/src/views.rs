//! Read models for the derived views created by the migrations.
//!
//! The views are plain SQL views, not tables, so they are mapped with
//! `FromQueryResult` instead of entities.

use pipewarden_core::DBDateTime;
use sea_orm::FromQueryResult;
use serde::Serialize;
use uuid::Uuid;

use crate::types::ExecutionStatus;

pub const EXECUTION_SUMMARY_VIEW: &str = "pipeline.execution_summary";
pub const SECURITY_POSTURE_VIEW: &str = "security.security_posture";

/// Row of `pipeline.execution_summary`
#[derive(Debug, Clone, PartialEq, Serialize, FromQueryResult)]
pub struct ExecutionSummary {
    pub execution_id: Uuid,
    pub pipeline_id: Uuid,
    pub pipeline_name: String,
    pub status: String,
    pub start_time: DBDateTime,
    pub end_time: Option<DBDateTime>,
    /// Null while the execution has no `end_time`
    pub duration_seconds: Option<f64>,
    pub records_processed: i64,
    pub records_failed: i64,
    /// `0` when nothing was processed, otherwise rounded to two decimals
    pub failure_rate_percent: f64,
}

impl ExecutionSummary {
    pub fn status(&self) -> Option<ExecutionStatus> {
        ExecutionStatus::from_str(&self.status)
    }
}

/// Row of `security.security_posture`, one per attack type
#[derive(Debug, Clone, PartialEq, Serialize, FromQueryResult)]
pub struct SecurityPosture {
    pub attack_type: String,
    pub total_simulations: i64,
    pub avg_security_score: Option<f64>,
    /// Mean of detected / total over the simulations, in `[0, 1]`
    pub avg_detection_rate: Option<f64>,
    pub avg_mttd_ms: Option<f64>,
    pub total_successful_attacks: i64,
    pub last_simulation: DBDateTime,
}
