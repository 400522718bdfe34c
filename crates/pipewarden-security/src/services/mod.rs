pub mod scenario_service;
pub mod simulation_service;
pub mod types;

pub use scenario_service::ScenarioService;
pub use simulation_service::SimulationService;
pub use types::*;
