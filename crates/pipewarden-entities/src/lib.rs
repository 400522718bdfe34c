//! SeaORM entities for the `pipeline`, `security` and `monitoring` schemas

pub mod types;
pub mod views;

// pipeline schema
pub mod pipelines;
pub mod executions;
pub mod validation_results;
pub mod audit_logs;

// security schema
pub mod attack_scenarios;
pub mod simulation_results;

// monitoring schema
pub mod metrics;
