// pendula_core/src/estimation/filters/ekf.rs

use nalgebra::{DMatrix, DVector, SMatrix, SVector};
use tracing::{debug, trace, warn};

use crate::error::{EstimationError, EstimationResult};
use crate::estimation::StateEstimator;
use crate::messages::ModuleInput;
use crate::models::dynamics::Dynamics;
use crate::models::measurement::Measurement;
use crate::state::GaussianBelief;
use crate::utils::integrators::{Integrator, IntegratorKind};
use crate::utils::matrix::{ensure_finite, invert_well_conditioned, symmetrize};

/// Largest accepted 1-norm condition number of the innovation covariance.
pub const DEFAULT_CONDITION_LIMIT: f64 = 1e12;

/// Construction-time parameters of an [`ExtendedKalmanFilter`].
///
/// Vectors and matrices are runtime-sized here and shape-checked against the
/// filter's compile-time dimensions by [`ExtendedKalmanFilter::new`].
#[derive(Debug, Clone, PartialEq)]
pub struct EkfParams {
    pub initial_mean: DVector<f64>,
    pub initial_covariance: DMatrix<f64>,
    /// Process noise `Q`, added once per predict (not scaled by `dt`).
    pub process_noise_q: DMatrix<f64>,
    /// Measurement noise `R`.
    pub measurement_noise_r: DMatrix<f64>,
    /// Fixed prediction step, in seconds.
    pub dt: f64,
    pub condition_limit: f64,
}

/// A concrete implementation of an Extended Kalman Filter over a fixed-size
/// state (`N`) and measurement (`M`).
///
/// Both `predict` and `update` compute every candidate value before writing
/// anything, so a failed call leaves the belief exactly as it was.
#[derive(Debug)]
pub struct ExtendedKalmanFilter<const N: usize, const M: usize> {
    /// The current belief of the filter (x, P, t).
    belief: GaussianBelief<N>,
    /// The process noise covariance matrix (Q), modeling uncertainty in the dynamics.
    process_noise_q: SMatrix<f64, N, N>,
    measurement_noise_r: SMatrix<f64, M, M>,
    dt: f64,
    condition_limit: f64,

    dynamics: Box<dyn Dynamics<N>>,
    measurement: Box<dyn Measurement<N, M>>,
    integrator: Box<dyn Integrator<N>>,

    last_innovation: Option<SVector<f64, M>>,
}

/// Copies a runtime-sized matrix into a fixed-size one after checking its
/// shape and that every entry is finite.
fn to_fixed<const R: usize, const C: usize>(
    what: &'static str,
    m: &DMatrix<f64>,
) -> EstimationResult<SMatrix<f64, R, C>> {
    EstimationError::check_shape(what, (R, C), m.shape())?;
    if m.iter().any(|v| !v.is_finite()) {
        return Err(EstimationError::InvalidParameter(format!(
            "{what} contains non-finite values"
        )));
    }
    Ok(SMatrix::<f64, R, C>::from_column_slice(m.as_slice()))
}

/// Rejects covariance matrices with a negative variance on the diagonal.
fn check_variances<const D: usize>(what: &str, m: &SMatrix<f64, D, D>) -> EstimationResult<()> {
    match (0..D).find(|&i| m[(i, i)] < 0.0) {
        Some(i) => Err(EstimationError::InvalidParameter(format!(
            "{what} has negative variance {} at index {i}",
            m[(i, i)]
        ))),
        None => Ok(()),
    }
}

impl<const N: usize, const M: usize> ExtendedKalmanFilter<N, M> {
    /// Creates a new EKF instance.
    pub fn new(
        params: EkfParams,
        dynamics: Box<dyn Dynamics<N>>,
        measurement: Box<dyn Measurement<N, M>>,
        integrator: IntegratorKind,
    ) -> EstimationResult<Self> {
        if !(params.dt.is_finite() && params.dt > 0.0) {
            return Err(EstimationError::InvalidParameter(format!(
                "dt must be finite and positive, got {}",
                params.dt
            )));
        }
        if !(params.condition_limit > 1.0) {
            return Err(EstimationError::InvalidParameter(format!(
                "condition limit must be greater than 1, got {}",
                params.condition_limit
            )));
        }

        let initial_mean = DMatrix::from_column_slice(
            params.initial_mean.len(),
            1,
            params.initial_mean.as_slice(),
        );
        let mean: SVector<f64, N> = to_fixed("initial mean", &initial_mean)?;
        let covariance = symmetrize(&to_fixed("initial covariance", &params.initial_covariance)?);
        let process_noise_q = symmetrize(&to_fixed("process noise Q", &params.process_noise_q)?);
        let measurement_noise_r =
            symmetrize(&to_fixed("measurement noise R", &params.measurement_noise_r)?);

        check_variances("initial covariance", &covariance)?;
        check_variances("process noise Q", &process_noise_q)?;
        check_variances("measurement noise R", &measurement_noise_r)?;

        let layout = dynamics.get_state_layout();
        EstimationError::check_shape("state layout", (N, 1), (layout.len(), 1))?;

        debug!(
            state_dim = N,
            measurement_dim = M,
            dt = params.dt,
            ?integrator,
            "EKF initialized"
        );

        Ok(Self {
            belief: GaussianBelief::new(layout, mean, covariance),
            process_noise_q,
            measurement_noise_r,
            dt: params.dt,
            condition_limit: params.condition_limit,
            dynamics,
            measurement,
            integrator: integrator.build(),
            last_innovation: None,
        })
    }

    /// Advances the belief by one fixed step `dt`:
    /// `x ← x⁻`, `P ← sym(F P Fᵀ + Q)`.
    ///
    /// Calling it twice without an update advances two steps.
    pub fn predict(&mut self) -> EstimationResult<&GaussianBelief<N>> {
        let (x_pred, p_pred) = self.predicted().map_err(|err| {
            warn!(
                timestamp = self.belief.timestamp,
                %err,
                "EKF predict aborted; belief unchanged"
            );
            err
        })?;

        self.belief.mean = x_pred;
        self.belief.covariance = p_pred;
        self.belief.timestamp += self.dt;

        trace!(
            timestamp = self.belief.timestamp,
            trace_p = self.belief.covariance.trace(),
            "EKF predict"
        );
        Ok(&self.belief)
    }

    fn predicted(&self) -> EstimationResult<(SVector<f64, N>, SMatrix<f64, N, N>)> {
        let p = &self.belief.covariance;

        // 1. Propagate the mean and linearize the discrete map in one pass.
        let (x_pred, f_jac) =
            self.dynamics
                .discretize(&self.belief.mean, self.dt, self.integrator.as_ref())?;

        // 2. Predict the covariance matrix: P_k+1 = F * P_k * F^T + Q
        let p_pred = symmetrize(&(f_jac * p * f_jac.transpose() + self.process_noise_q));

        Ok((
            ensure_finite(x_pred, "predicted mean")?,
            ensure_finite(p_pred, "predicted covariance")?,
        ))
    }

    /// Fuses one measurement `z` (length `M`) into the belief.
    pub fn update(&mut self, z: &[f64]) -> EstimationResult<&GaussianBelief<N>> {
        let z = Self::measurement_vector(z)?;
        self.update_with(&z)
    }

    fn measurement_vector(z: &[f64]) -> EstimationResult<SVector<f64, M>> {
        EstimationError::check_shape("measurement", (M, 1), (z.len(), 1))?;
        if z.iter().any(|v| !v.is_finite()) {
            return Err(EstimationError::InvalidParameter(format!(
                "measurement contains non-finite values: {z:?}"
            )));
        }
        Ok(SVector::<f64, M>::from_column_slice(z))
    }

    fn update_with(&mut self, z: &SVector<f64, M>) -> EstimationResult<&GaussianBelief<N>> {
        let (x_new, p_new, y) = self
            .corrected(&self.belief.mean, &self.belief.covariance, z)
            .map_err(|err| {
                warn!(
                    timestamp = self.belief.timestamp,
                    %err,
                    "EKF update aborted; belief unchanged"
                );
                err
            })?;

        self.belief.mean = x_new;
        self.belief.covariance = p_new;
        self.last_innovation = Some(y);

        trace!(
            timestamp = self.belief.timestamp,
            innovation_norm = y.norm(),
            trace_p = self.belief.covariance.trace(),
            "EKF update"
        );
        Ok(&self.belief)
    }

    /// One full predict/update cycle, committed only if both halves succeed.
    fn step_with(&mut self, z: &SVector<f64, M>) -> EstimationResult<&GaussianBelief<N>> {
        let (x_new, p_new, y) = self
            .predicted()
            .and_then(|(x_pred, p_pred)| self.corrected(&x_pred, &p_pred, z))
            .map_err(|err| {
                warn!(
                    timestamp = self.belief.timestamp,
                    %err,
                    "EKF step aborted; belief unchanged"
                );
                err
            })?;

        self.belief.mean = x_new;
        self.belief.covariance = p_new;
        self.belief.timestamp += self.dt;
        self.last_innovation = Some(y);

        trace!(
            timestamp = self.belief.timestamp,
            innovation_norm = y.norm(),
            trace_p = self.belief.covariance.trace(),
            "EKF step"
        );
        Ok(&self.belief)
    }

    #[allow(clippy::type_complexity)]
    fn corrected(
        &self,
        x: &SVector<f64, N>,
        p: &SMatrix<f64, N, N>,
        z: &SVector<f64, M>,
    ) -> EstimationResult<(SVector<f64, N>, SMatrix<f64, N, N>, SVector<f64, M>)> {
        // 1. Predict the measurement from our current state: z_hat = h(x), and linearize.
        let z_pred = self.measurement.predict_measurement(x);
        let h_jac = self.measurement.calculate_jacobian(x);

        // 2. Innovation (y) and its covariance (S).
        let y = z - z_pred;
        let s = h_jac * p * h_jac.transpose() + self.measurement_noise_r;

        // 3. Kalman gain, refusing an ill-conditioned S.
        let s_inv = invert_well_conditioned(&s, self.condition_limit)?;
        let k_gain = p * h_jac.transpose() * s_inv;

        // 4. Correct the mean and covariance.
        let x_new = x + k_gain * y;
        let i_kh = SMatrix::<f64, N, N>::identity() - k_gain * h_jac;
        let p_new = symmetrize(&(i_kh * p));

        Ok((
            ensure_finite(x_new, "updated mean")?,
            ensure_finite(p_new, "updated covariance")?,
            y,
        ))
    }

    // --- Accessors ---

    pub fn belief(&self) -> &GaussianBelief<N> {
        &self.belief
    }

    pub fn mean(&self) -> &SVector<f64, N> {
        &self.belief.mean
    }

    pub fn covariance(&self) -> &SMatrix<f64, N, N> {
        &self.belief.covariance
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn condition_limit(&self) -> f64 {
        self.condition_limit
    }

    /// Innovation `y = z − h(x)` of the last successful update.
    pub fn last_innovation(&self) -> Option<&SVector<f64, M>> {
        self.last_innovation.as_ref()
    }

    pub fn dynamics(&self) -> &dyn Dynamics<N> {
        self.dynamics.as_ref()
    }
}

impl<const N: usize, const M: usize> Clone for ExtendedKalmanFilter<N, M> {
    fn clone(&self) -> Self {
        Self {
            belief: self.belief.clone(),
            process_noise_q: self.process_noise_q,
            measurement_noise_r: self.measurement_noise_r,
            dt: self.dt,
            condition_limit: self.condition_limit,
            dynamics: dyn_clone::clone_box(&*self.dynamics),
            measurement: dyn_clone::clone_box(&*self.measurement),
            integrator: dyn_clone::clone_box(&*self.integrator),
            last_innovation: self.last_innovation,
        }
    }
}

// --- The Public Trait Implementation ---
impl<const N: usize, const M: usize> StateEstimator<N> for ExtendedKalmanFilter<N, M> {
    fn process(&mut self, input: &ModuleInput) -> EstimationResult<&GaussianBelief<N>> {
        match input {
            ModuleInput::TimeStep => self.predict(),
            ModuleInput::Measurement { message } => {
                let z = Self::measurement_vector(message.z.as_slice())?;
                self.step_with(&z)
            }
        }
    }

    fn get_state(&self) -> &GaussianBelief<N> {
        &self.belief
    }
}
