// pendula_core/src/models/measurement/mod.rs

use dyn_clone::DynClone;
use nalgebra::{SMatrix, SVector};
use std::fmt::Debug;

// --- MEASUREMENT MODEL TRAIT ---
// Represents the mathematical model of a sensor. `z = h(x) + v`
pub trait Measurement<const N: usize, const M: usize>: DynClone + Debug + Send + Sync {
    /// Predicts the ideal measurement `z_pred = h(x)` from the filter state.
    fn predict_measurement(&self, x: &SVector<f64, N>) -> SVector<f64, M>;

    /// Calculates the measurement Jacobian `H = ∂h/∂x`, even when it is constant.
    fn calculate_jacobian(&self, x: &SVector<f64, N>) -> SMatrix<f64, M, N>;
}

pub mod joint_angles;
pub mod tip_position;
