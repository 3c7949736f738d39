// pendula_core/src/prelude.rs

// --- Core Abstractions (The main contracts of the library) ---
pub use crate::error::{EstimationError, EstimationResult};
pub use crate::estimation::StateEstimator;
pub use crate::messages::{MeasurementMessage, ModuleInput};
pub use crate::models::dynamics::Dynamics;
pub use crate::models::measurement::Measurement;
pub use crate::utils::integrators::{Integrator, IntegratorKind};

// --- Core Data Structures (The "nouns" of the library) ---
pub use crate::state::layout::{
    double_pendulum_layout, single_pendulum_layout, DOUBLE_PENDULUM_STATE_DIM,
    SINGLE_PENDULUM_STATE_DIM,
};
pub use crate::state::{GaussianBelief, Link, StateVariable};

// --- Estimation Algorithms ---
pub use crate::estimation::filters::ekf::{
    EkfParams, ExtendedKalmanFilter, DEFAULT_CONDITION_LIMIT,
};

// --- Concrete Model Implementations (Export common ones for convenience) ---
pub use crate::models::dynamics::double_pendulum::{DoublePendulum, DoublePendulumParams};
pub use crate::models::dynamics::single_pendulum::{SinglePendulum, SinglePendulumParams};
pub use crate::models::measurement::joint_angles::JointAngleModel;
pub use crate::models::measurement::tip_position::TipPositionModel;
