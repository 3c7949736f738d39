// pendula_sim/src/prelude.rs

// Re-export the entire pendula_core prelude so you can easily access
// pure types like `Dynamics`, `Measurement`, `ExtendedKalmanFilter`, etc.
pub use pendula_core::prelude::*;

// Re-export common simulation-specific types for easy access.
pub use crate::error::SimError;
pub use crate::simulation::config::{
    FilterConfig, ScenarioConfig, SensorConfig, SensorKind, SimulationSettings, SystemConfig,
};
pub use crate::simulation::prng::SimulationRng;
pub use crate::simulation::report::{PosteriorRecord, RunReport, RunSummary};
pub use crate::simulation::runner::run_scenario;
pub use crate::simulation::sensor::NoisySensor;
pub use crate::simulation::truth::{generate_trajectory, TruthSample};
