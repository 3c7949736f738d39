// pendula_core/src/models/measurement/joint_angles.rs

use nalgebra::{SMatrix, SVector};

use crate::error::{EstimationError, EstimationResult};
use crate::models::measurement::Measurement;
use crate::state::layout::{double_pendulum_layout, single_pendulum_layout};
use crate::state::{Link, StateVariable};

/// Observes a subset of the state directly, `z = [x[i₀], x[i₁], …]`.
///
/// The observed components are located through the state layout rather than
/// hard-coded, so `H` is a constant 0/1 selection matrix.
#[derive(Debug, Clone)]
pub struct JointAngleModel<const N: usize, const M: usize> {
    indices: [usize; M],
}

impl<const N: usize, const M: usize> JointAngleModel<N, M> {
    pub fn new(layout: &[StateVariable], observed: &[StateVariable]) -> EstimationResult<Self> {
        EstimationError::check_shape("state layout", (N, 1), (layout.len(), 1))?;
        EstimationError::check_shape("observed variables", (M, 1), (observed.len(), 1))?;

        let mut indices = [0; M];
        for (slot, var) in indices.iter_mut().zip(observed) {
            *slot = layout.iter().position(|v| v == var).ok_or_else(|| {
                EstimationError::InvalidParameter(format!(
                    "observed variable {var:?} is not part of the state layout"
                ))
            })?;
        }
        Ok(Self { indices })
    }

    /// State indices read by each measurement component, in order.
    pub fn indices(&self) -> &[usize; M] {
        &self.indices
    }
}

impl JointAngleModel<4, 2> {
    /// Both link angles of the double pendulum, `z = [θ1, θ2]`.
    pub fn double_pendulum() -> EstimationResult<Self> {
        Self::new(
            &double_pendulum_layout(),
            &[StateVariable::Angle(Link::First), StateVariable::Angle(Link::Second)],
        )
    }
}

impl JointAngleModel<2, 1> {
    pub fn single_pendulum() -> EstimationResult<Self> {
        Self::new(&single_pendulum_layout(), &[StateVariable::Angle(Link::First)])
    }
}

impl<const N: usize, const M: usize> Measurement<N, M> for JointAngleModel<N, M> {
    fn predict_measurement(&self, x: &SVector<f64, N>) -> SVector<f64, M> {
        SVector::<f64, M>::from_fn(|row, _| x[self.indices[row]])
    }

    fn calculate_jacobian(&self, _x: &SVector<f64, N>) -> SMatrix<f64, M, N> {
        let mut h_jac = SMatrix::<f64, M, N>::zeros();
        for (row, &col) in self.indices.iter().enumerate() {
            h_jac[(row, col)] = 1.0;
        }
        h_jac
    }
}
