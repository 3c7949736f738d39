// pendula_core/src/estimation/mod.rs

use crate::error::EstimationResult;
use crate::messages::ModuleInput;
use crate::state::GaussianBelief;

/// The contract for any algorithm that performs the "State Estimator" role.
/// Its sole responsibility is to estimate the state of a system.
pub trait StateEstimator<const N: usize>: Send + Sync {
    /// The single, unified method for processing all types of input data.
    /// The implementation is responsible for interpreting the `ModuleInput`.
    ///
    /// A `Measurement` input runs a full predict/update cycle. Either both
    /// halves are committed or neither is: on error the belief, including its
    /// timestamp, is left as it was before the call.
    fn process(&mut self, input: &ModuleInput) -> EstimationResult<&GaussianBelief<N>>;

    /// Returns a reference to the current best estimate of the state.
    fn get_state(&self) -> &GaussianBelief<N>;
}

pub mod filters;
