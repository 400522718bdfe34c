//! Attack scenarios and simulation results for the `security` schema

pub mod counters;
pub mod services;


pub use counters::SimulationCounters;
pub use services::{
    CreateScenarioRequest, MttdStats, RecordSimulationRequest, ScenarioService, SecurityError,
    SimulationService, UpdateScenarioRequest,
};
