// pendula_sim/src/simulation/config.rs

//! Loading and validation of scenario configuration.
//!
//! A scenario is layered from three sources, later ones winning:
//! built-in defaults (the classic double-pendulum run), an optional TOML
//! file, and `PENDULA_`-prefixed environment variables where `__` separates
//! nesting levels (e.g. `PENDULA_SIMULATION__STEPS=500`).

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;
use std::path::Path;
use tracing::info;

use pendula_core::prelude::*;

use crate::error::SimError;

// =========================================================================
// == Top-Level Configuration ==
// =========================================================================

/// # ScenarioConfig
/// The root of the data parsed from a `scenario.toml` file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)] // Fail if the TOML has fields not in our struct
pub struct ScenarioConfig {
    #[serde(default)] // Use default if the [simulation] section is missing
    pub simulation: SimulationSettings,

    #[serde(default)]
    pub system: SystemConfig,

    #[serde(default)]
    pub filter: FilterConfig,

    #[serde(default)]
    pub sensor: SensorConfig,
}

// =========================================================================
// == Configuration Sub-Structs ==
// These map directly to the sections in a scenario.toml file.
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationSettings {
    /// Optional seed for the pseudo-random number generator for determinism.
    pub seed: Option<u64>,
    /// Number of reference samples, including the initial state. The filter
    /// runs one step per sample after the first.
    pub steps: usize,
    /// Filter and measurement period, in seconds.
    pub dt: f64,
    /// RK4 sub-steps per `dt` for the reference trajectory.
    pub substeps: usize,
    /// True initial state of the system.
    pub initial_state: Vec<f64>,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            seed: None,
            steps: 4000,
            dt: 0.01,
            substeps: 10,
            initial_state: vec![FRAC_PI_2, 0.0, FRAC_PI_2, 0.0],
        }
    }
}

/// The simulated mechanism, selected by `model = "..."`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum SystemConfig {
    DoublePendulum(DoublePendulumParams),
    SinglePendulum(SinglePendulumParams),
}

impl Default for SystemConfig {
    fn default() -> Self {
        SystemConfig::DoublePendulum(DoublePendulumParams::default())
    }
}

impl SystemConfig {
    pub fn state_dim(&self) -> usize {
        match self {
            SystemConfig::DoublePendulum(_) => DOUBLE_PENDULUM_STATE_DIM,
            SystemConfig::SinglePendulum(_) => SINGLE_PENDULUM_STATE_DIM,
        }
    }
}

/// EKF tuning. Covariances are isotropic: each scalar multiplies the identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterConfig {
    /// Initial mean; zeros when omitted.
    pub initial_mean: Option<Vec<f64>>,
    pub initial_variance: f64,
    pub process_noise: f64,
    pub measurement_noise: f64,
    pub integrator: IntegratorKind,
    pub condition_limit: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            initial_mean: None,
            initial_variance: 10.0,
            process_noise: 1e-5,
            measurement_noise: 0.05,
            integrator: IntegratorKind::Rk4,
            condition_limit: DEFAULT_CONDITION_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    /// Direct, noisy link angles.
    #[default]
    JointAngles,
    /// Cartesian position of the last mass (double pendulum only).
    TipPosition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SensorConfig {
    pub kind: SensorKind,
    /// Actual variance of the additive Gaussian noise, unknown to the filter.
    pub noise_variance: f64,
    /// Probability that a reading is lost for a step.
    pub dropout_probability: f64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            kind: SensorKind::JointAngles,
            noise_variance: 0.05,
            dropout_probability: 0.0,
        }
    }
}

// =========================================================================
// == Loading ==
// =========================================================================

impl ScenarioConfig {
    /// Builds the layered provider stack without extracting it.
    pub fn figment(scenario_path: Option<&Path>) -> Figment {
        let mut figment = Figment::new();
        if let Some(path) = scenario_path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed("PENDULA_").split("__"))
    }

    /// Loads and validates a scenario.
    pub fn load(scenario_path: Option<&Path>) -> Result<Self, SimError> {
        if let Some(path) = scenario_path {
            if !path.is_file() {
                return Err(SimError::MissingScenario(path.to_path_buf()));
            }
            info!("Loading scenario from: {}", path.display());
        } else {
            info!("No scenario file given; using built-in defaults");
        }

        let config: ScenarioConfig = Self::figment(scenario_path).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field constraints serde cannot express.
    pub fn validate(&self) -> Result<(), SimError> {
        let invalid = |msg: String| Err(SimError::InvalidScenario(msg));
        let sim = &self.simulation;
        let dim = self.system.state_dim();

        if sim.steps < 2 {
            return invalid(format!("steps must be at least 2, got {}", sim.steps));
        }
        if sim.substeps == 0 {
            return invalid("substeps must be at least 1".to_string());
        }
        if sim.initial_state.len() != dim {
            return invalid(format!(
                "initial_state has {} components, the system has {dim}",
                sim.initial_state.len()
            ));
        }
        if let Some(mean) = &self.filter.initial_mean {
            if mean.len() != dim {
                return invalid(format!(
                    "filter.initial_mean has {} components, the system has {dim}",
                    mean.len()
                ));
            }
        }
        if !(self.sensor.noise_variance.is_finite() && self.sensor.noise_variance >= 0.0) {
            return invalid(format!(
                "sensor.noise_variance must be finite and non-negative, got {}",
                self.sensor.noise_variance
            ));
        }
        if !(0.0..=1.0).contains(&self.sensor.dropout_probability) {
            return invalid(format!(
                "sensor.dropout_probability must lie in [0, 1], got {}",
                self.sensor.dropout_probability
            ));
        }
        if matches!(
            (&self.system, self.sensor.kind),
            (SystemConfig::SinglePendulum(_), SensorKind::TipPosition)
        ) {
            return invalid("the tip_position sensor needs the double_pendulum model".to_string());
        }
        Ok(())
    }

    /// Builds the filter parameters for a system of dimension `n` observed
    /// through `m` measurement components.
    pub fn ekf_params(&self, n: usize, m: usize) -> EkfParams {
        let filter = &self.filter;
        let initial_mean = match &filter.initial_mean {
            Some(mean) => nalgebra::DVector::from_row_slice(mean),
            None => nalgebra::DVector::zeros(n),
        };
        EkfParams {
            initial_mean,
            initial_covariance: nalgebra::DMatrix::identity(n, n) * filter.initial_variance,
            process_noise_q: nalgebra::DMatrix::identity(n, n) * filter.process_noise,
            measurement_noise_r: nalgebra::DMatrix::identity(m, m) * filter.measurement_noise,
            dt: self.simulation.dt,
            condition_limit: filter.condition_limit,
        }
    }
}
