// pendula_core/src/state.rs

use nalgebra::{SMatrix, SVector};
use serde::{Deserialize, Serialize};

pub mod layout;

/// Identifies one rigid link of a pendulum chain, counted from the pivot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Link {
    First,
    Second,
}

/// An enum that defines every variable that can exist in a state vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateVariable {
    /// Absolute angle of the link from the downward vertical, in radians.
    /// Never wrapped: it accumulates full rotations.
    Angle(Link),
    /// Time derivative of `Angle`, in rad/s.
    AngularRate(Link),
}

/// The Gaussian belief a filter carries between steps. It bundles the mean
/// with its schema (the layout), covariance, and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianBelief<const N: usize> {
    /// The ordered "schema" of the mean vector.
    pub layout: Vec<StateVariable>,
    /// The state estimate `x`.
    pub mean: SVector<f64, N>,
    /// The covariance matrix `P`.
    pub covariance: SMatrix<f64, N, N>,
    /// Time of the last prediction, in seconds since filter construction.
    pub timestamp: f64,
}

impl<const N: usize> GaussianBelief<N> {
    pub fn new(
        layout: Vec<StateVariable>,
        mean: SVector<f64, N>,
        covariance: SMatrix<f64, N, N>,
    ) -> Self {
        debug_assert_eq!(layout.len(), N);
        Self {
            layout,
            mean,
            covariance,
            timestamp: 0.0,
        }
    }

    /// Returns the dimension of the state vector.
    pub fn dim(&self) -> usize {
        N
    }

    /// Finds the index of a specific `StateVariable` in the layout.
    pub fn find_idx(&self, var: &StateVariable) -> Option<usize> {
        self.layout.iter().position(|v| v == var)
    }

    /// Looks up the current estimate of a single state variable.
    pub fn get(&self, var: &StateVariable) -> Option<f64> {
        self.find_idx(var).map(|i| self.mean[i])
    }

    /// Marginal standard deviation of a single state variable.
    pub fn std_dev(&self, var: &StateVariable) -> Option<f64> {
        self.find_idx(var)
            .map(|i| self.covariance[(i, i)].max(0.0).sqrt())
    }

    pub fn covariance_trace(&self) -> f64 {
        self.covariance.trace()
    }
}
