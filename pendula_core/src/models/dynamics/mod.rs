// pendula_core/src/models/dynamics/mod.rs

use dyn_clone::DynClone;
use nalgebra::{SMatrix, SVector};
use std::fmt::Debug;

use crate::error::EstimationResult;
use crate::state::StateVariable;
use crate::utils::integrators::Integrator;
use crate::utils::jacobian::central_difference_jacobian;

// --- DYNAMICS MODEL TRAIT ---
// Represents the physics of an autonomous system. `x_dot = f(x)`
/// The continuous-time model a state estimator propagates.
///
/// The three capabilities, derivative, Jacobian and discretization, are
/// all an EKF needs, so any mechanism implementing this trait can be
/// swapped in without touching the filter.
pub trait Dynamics<const N: usize>: DynClone + Debug + Send + Sync {
    /// Returns the complete layout of the state vector for this model.
    /// The order of this Vec defines the indices for the state vector `x`.
    fn get_state_layout(&self) -> Vec<StateVariable>;

    /// Computes the time derivative of the state vector: `x_dot = f(x)`.
    ///
    /// Fails with `NumericalDegeneracy` instead of returning NaN or infinity.
    fn get_derivatives(&self, x: &SVector<f64, N>) -> EstimationResult<SVector<f64, N>>;

    /// Calculates the continuous-time Jacobian `A = ∂f/∂x` at `x`.
    ///
    /// The default uses central finite differences (see
    /// [`central_difference_jacobian`]), accurate to roughly 1e-10 at the
    /// price of `2N` derivative evaluations. Models with a closed form
    /// should override it.
    fn calculate_jacobian(&self, x: &SVector<f64, N>) -> EstimationResult<SMatrix<f64, N, N>> {
        central_difference_jacobian(|probe| self.get_derivatives(probe), x)
    }

    /// Advances `x` by one fixed step and returns `(x⁻, F)`, where `F` is the
    /// discrete state-transition Jacobian consistent with `integrator`.
    fn discretize(
        &self,
        x: &SVector<f64, N>,
        dt: f64,
        integrator: &dyn Integrator<N>,
    ) -> EstimationResult<(SVector<f64, N>, SMatrix<f64, N, N>)> {
        integrator.discretize(
            &|probe| self.get_derivatives(probe),
            &|probe| self.calculate_jacobian(probe),
            x,
            dt,
        )
    }

    /// Advances `x` by one step without linearizing.
    fn propagate(
        &self,
        x: &SVector<f64, N>,
        dt: f64,
        integrator: &dyn Integrator<N>,
    ) -> EstimationResult<SVector<f64, N>> {
        integrator.step(&|probe| self.get_derivatives(probe), x, dt)
    }
}

pub mod double_pendulum;
pub mod single_pendulum;
