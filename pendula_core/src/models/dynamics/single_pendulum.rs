// pendula_core/src/models/dynamics/single_pendulum.rs

use nalgebra::{Matrix2, Vector2};
use serde::{Deserialize, Serialize};

use crate::error::{EstimationError, EstimationResult};
use crate::models::dynamics::Dynamics;
use crate::state::layout::single_pendulum_layout;
use crate::state::StateVariable;
use crate::utils::matrix::ensure_finite;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SinglePendulumParams {
    pub length: f64,
    pub g: f64,
}

impl Default for SinglePendulumParams {
    fn default() -> Self {
        Self {
            length: 1.0,
            g: 9.81,
        }
    }
}

impl SinglePendulumParams {
    pub fn validate(&self) -> EstimationResult<()> {
        if !(self.length.is_finite() && self.length > 0.0) {
            return Err(EstimationError::InvalidParameter(format!(
                "pendulum length must be finite and positive, got {}",
                self.length
            )));
        }
        if !self.g.is_finite() {
            return Err(EstimationError::InvalidParameter(format!(
                "gravity must be finite, got {}",
                self.g
            )));
        }
        Ok(())
    }
}

/// Frictionless simple pendulum, state `[θ, θ̇]` with `θ̈ = −(g/l)·sin θ`.
#[derive(Debug, Clone)]
pub struct SinglePendulum {
    params: SinglePendulumParams,
}

impl SinglePendulum {
    pub fn new(params: SinglePendulumParams) -> EstimationResult<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &SinglePendulumParams {
        &self.params
    }

    fn omega_squared(&self) -> f64 {
        self.params.g / self.params.length
    }
}

impl Dynamics<2> for SinglePendulum {
    fn get_state_layout(&self) -> Vec<StateVariable> {
        single_pendulum_layout()
    }

    fn get_derivatives(&self, x: &Vector2<f64>) -> EstimationResult<Vector2<f64>> {
        let x_dot = Vector2::new(x[1], -self.omega_squared() * x[0].sin());
        ensure_finite(x_dot, "single pendulum derivative")
    }

    fn calculate_jacobian(&self, x: &Vector2<f64>) -> EstimationResult<Matrix2<f64>> {
        let f_jac = Matrix2::new(0.0, 1.0, -self.omega_squared() * x[0].cos(), 0.0);
        ensure_finite(f_jac, "single pendulum Jacobian")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::integrators::{Integrator, RK4};
    use crate::utils::jacobian::central_difference_jacobian;
    use approx::assert_relative_eq;

    #[test]
    fn test_jacobian_matches_finite_differences() {
        let dynamics = SinglePendulum::new(SinglePendulumParams::default()).unwrap();
        for x in [Vector2::new(0.0, 0.0), Vector2::new(2.5, -3.0), Vector2::new(-7.1, 0.4)] {
            let numeric =
                central_difference_jacobian(|probe| dynamics.get_derivatives(probe), &x).unwrap();
            assert_relative_eq!(dynamics.calculate_jacobian(&x).unwrap(), numeric, epsilon = 1e-7);
        }
    }

    #[test]
    fn test_small_angle_period() {
        // For small swings the period approaches 2π·sqrt(l/g).
        let params = SinglePendulumParams::default();
        let dynamics = SinglePendulum::new(params).unwrap();
        let rk4: &dyn Integrator<2> = &RK4;

        let period = std::f64::consts::TAU * (params.length / params.g).sqrt();
        let steps = 10_000;
        let dt = period / steps as f64;

        let x0 = Vector2::new(1e-3, 0.0);
        let mut x = x0;
        for _ in 0..steps {
            x = dynamics.propagate(&x, dt, rk4).unwrap();
        }
        assert_relative_eq!(x, x0, epsilon = 1e-8);
    }

    #[test]
    fn test_rejects_invalid_length() {
        let params = SinglePendulumParams {
            length: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            SinglePendulum::new(params),
            Err(EstimationError::InvalidParameter(_))
        ));
    }
}
