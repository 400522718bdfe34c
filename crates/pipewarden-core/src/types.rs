//! Shared type aliases

use chrono::{DateTime, Utc};

/// Database DateTime type used across all Pipewarden crates
///
/// Maps to `TIMESTAMPTZ` columns in every schema.
pub type DBDateTime = DateTime<Utc>;

/// Standard UTC DateTime type for API-facing structs
pub type UtcDateTime = DateTime<Utc>;

/// Names of the three schemas owned by the framework, in creation order.
pub const PIPELINE_SCHEMA: &str = "pipeline";
pub const SECURITY_SCHEMA: &str = "security";
pub const MONITORING_SCHEMA: &str = "monitoring";

pub const MANAGED_SCHEMAS: [&str; 3] = [PIPELINE_SCHEMA, SECURITY_SCHEMA, MONITORING_SCHEMA];
