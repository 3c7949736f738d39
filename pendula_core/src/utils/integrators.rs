// pendula_core/src/utils/integrators.rs

use dyn_clone::DynClone;
use nalgebra::{SMatrix, SVector};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::error::{EstimationError, EstimationResult};

/// A continuous-time derivative `ẋ = f(x)`.
pub type DerivativeFn<'a, const N: usize> =
    dyn Fn(&SVector<f64, N>) -> EstimationResult<SVector<f64, N>> + 'a;

/// The continuous-time Jacobian `A(x) = ∂f/∂x`.
pub type JacobianFn<'a, const N: usize> =
    dyn Fn(&SVector<f64, N>) -> EstimationResult<SMatrix<f64, N, N>> + 'a;

/// A fixed-step explicit integration scheme.
///
/// Besides advancing a state, every scheme knows how to differentiate its own
/// one-step map, which is the state-transition Jacobian `F` an EKF needs.
pub trait Integrator<const N: usize>: DynClone + Debug + Send + Sync {
    /// Advances `x0` by `dt` under `func`.
    fn step(
        &self,
        func: &DerivativeFn<'_, N>,
        x0: &SVector<f64, N>,
        dt: f64,
    ) -> EstimationResult<SVector<f64, N>>;

    /// Advances `x0` by `dt` and returns `(x(t + dt), ∂x(t + dt)/∂x0)`.
    fn discretize(
        &self,
        func: &DerivativeFn<'_, N>,
        jacobian: &JacobianFn<'_, N>,
        x0: &SVector<f64, N>,
        dt: f64,
    ) -> EstimationResult<(SVector<f64, N>, SMatrix<f64, N, N>)>;
}

fn check_dt(dt: f64) -> EstimationResult<()> {
    if dt.is_finite() && dt > 0.0 {
        Ok(())
    } else {
        Err(EstimationError::InvalidParameter(format!(
            "integration step must be finite and positive, got {dt}"
        )))
    }
}

// Runge-Kutta methods

/// Forward Euler. `F = I + dt·A(x0)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RK1;

impl<const N: usize> Integrator<N> for RK1 {
    fn step(
        &self,
        func: &DerivativeFn<'_, N>,
        x0: &SVector<f64, N>,
        dt: f64,
    ) -> EstimationResult<SVector<f64, N>> {
        check_dt(dt)?;
        Ok(x0 + func(x0)? * dt)
    }

    fn discretize(
        &self,
        func: &DerivativeFn<'_, N>,
        jacobian: &JacobianFn<'_, N>,
        x0: &SVector<f64, N>,
        dt: f64,
    ) -> EstimationResult<(SVector<f64, N>, SMatrix<f64, N, N>)> {
        check_dt(dt)?;
        let x_next = x0 + func(x0)? * dt;
        let f_jac = SMatrix::<f64, N, N>::identity() + jacobian(x0)? * dt;
        Ok((x_next, f_jac))
    }
}

/// Heun's method (explicit trapezoid).
#[derive(Debug, Default, Clone, Copy)]
pub struct RK2;

impl<const N: usize> Integrator<N> for RK2 {
    fn step(
        &self,
        func: &DerivativeFn<'_, N>,
        x0: &SVector<f64, N>,
        dt: f64,
    ) -> EstimationResult<SVector<f64, N>> {
        check_dt(dt)?;
        let k1 = func(x0)?;
        let k2 = func(&(x0 + k1 * dt))?;

        // Weighted average of k1 and k2
        Ok(x0 + (k1 + k2) * (0.5 * dt))
    }

    fn discretize(
        &self,
        func: &DerivativeFn<'_, N>,
        jacobian: &JacobianFn<'_, N>,
        x0: &SVector<f64, N>,
        dt: f64,
    ) -> EstimationResult<(SVector<f64, N>, SMatrix<f64, N, N>)> {
        check_dt(dt)?;
        let eye = SMatrix::<f64, N, N>::identity();

        let k1 = func(x0)?;
        let j1 = jacobian(x0)?;
        let x2 = x0 + k1 * dt;
        let k2 = func(&x2)?;
        let j2 = jacobian(&x2)? * (eye + j1 * dt);

        let x_next = x0 + (k1 + k2) * (0.5 * dt);
        let f_jac = eye + (j1 + j2) * (0.5 * dt);
        Ok((x_next, f_jac))
    }
}

/// Classic fourth-order Runge-Kutta.
///
/// `discretize` chains the stage Jacobians through the same stage
/// structure, `J_i = A(x_i) · ∂x_i/∂x0`, so `F` is the exact derivative of
/// the RK4 map rather than the first-order `I + dt·A`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RK4;

impl<const N: usize> Integrator<N> for RK4 {
    fn step(
        &self,
        func: &DerivativeFn<'_, N>,
        x0: &SVector<f64, N>,
        dt: f64,
    ) -> EstimationResult<SVector<f64, N>> {
        check_dt(dt)?;
        let half = 0.5 * dt;

        let k1 = func(x0)?;
        let k2 = func(&(x0 + k1 * half))?;
        let k3 = func(&(x0 + k2 * half))?;
        let k4 = func(&(x0 + k3 * dt))?;

        Ok(x0 + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (dt / 6.0))
    }

    fn discretize(
        &self,
        func: &DerivativeFn<'_, N>,
        jacobian: &JacobianFn<'_, N>,
        x0: &SVector<f64, N>,
        dt: f64,
    ) -> EstimationResult<(SVector<f64, N>, SMatrix<f64, N, N>)> {
        check_dt(dt)?;
        let eye = SMatrix::<f64, N, N>::identity();
        let half = 0.5 * dt;

        let k1 = func(x0)?;
        let j1 = jacobian(x0)?;

        let x2 = x0 + k1 * half;
        let k2 = func(&x2)?;
        let j2 = jacobian(&x2)? * (eye + j1 * half);

        let x3 = x0 + k2 * half;
        let k3 = func(&x3)?;
        let j3 = jacobian(&x3)? * (eye + j2 * half);

        let x4 = x0 + k3 * dt;
        let k4 = func(&x4)?;
        let j4 = jacobian(&x4)? * (eye + j3 * dt);

        let x_next = x0 + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (dt / 6.0);
        let f_jac = eye + (j1 + j2 * 2.0 + j3 * 2.0 + j4) * (dt / 6.0);
        Ok((x_next, f_jac))
    }
}

/// Config-facing selector for the integration scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegratorKind {
    Euler,
    Rk2,
    #[default]
    Rk4,
}

impl IntegratorKind {
    pub fn build<const N: usize>(self) -> Box<dyn Integrator<N>> {
        match self {
            IntegratorKind::Euler => Box::new(RK1),
            IntegratorKind::Rk2 => Box::new(RK2),
            IntegratorKind::Rk4 => Box::new(RK4),
        }
    }
}
