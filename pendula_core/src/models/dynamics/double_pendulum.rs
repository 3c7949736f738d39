// pendula_core/src/models/dynamics/double_pendulum.rs

use nalgebra::{Matrix4, Vector4};
use serde::{Deserialize, Serialize};

use crate::error::{EstimationError, EstimationResult};
use crate::models::dynamics::Dynamics;
use crate::state::layout::double_pendulum_layout;
use crate::state::StateVariable;
use crate::utils::matrix::ensure_finite;

/// Smallest admissible magnitude of the per-link mass-matrix denominator.
const MIN_DENOMINATOR: f64 = f64::EPSILON;

/// Physical constants of a planar double pendulum with point masses on
/// massless rods.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DoublePendulumParams {
    /// Length of the first (upper) link, in metres.
    pub l1: f64,
    /// Length of the second (lower) link, in metres.
    pub l2: f64,
    /// Mass at the end of the first link, in kilograms.
    pub m1: f64,
    /// Mass at the end of the second link, in kilograms.
    pub m2: f64,
    /// Gravitational acceleration, in m/s^2.
    pub g: f64,
}

impl Default for DoublePendulumParams {
    fn default() -> Self {
        Self {
            l1: 1.0,
            l2: 2.0,
            m1: 1.0,
            m2: 2.0,
            g: 9.81,
        }
    }
}

impl DoublePendulumParams {
    pub fn validate(&self) -> EstimationResult<()> {
        let invalid = |msg: String| Err(EstimationError::InvalidParameter(msg));

        for (name, length) in [("l1", self.l1), ("l2", self.l2)] {
            if !(length.is_finite() && length > 0.0) {
                return invalid(format!(
                    "link length {name} must be finite and positive, got {length}"
                ));
            }
        }
        for (name, mass) in [("m1", self.m1), ("m2", self.m2)] {
            if !(mass.is_finite() && mass >= 0.0) {
                return invalid(format!("mass {name} must be finite and non-negative, got {mass}"));
            }
        }
        if self.m1 + self.m2 <= 0.0 {
            return invalid("total mass m1 + m2 must be positive".to_string());
        }
        if !self.g.is_finite() {
            return invalid(format!("gravity must be finite, got {}", self.g));
        }
        Ok(())
    }
}

/// Closed-form Lagrangian dynamics of the double pendulum.
///
/// State layout is `[θ1, θ1̇, θ2, θ2̇]` with both angles measured from the
/// downward vertical. With `δ = θ1 − θ2` the accelerations share the factor
/// `den = m1 + m2 − m2·cos²δ`, scaled by the link length:
///
/// ```text
/// θ1̈ = −(l1 m2 cosδ sinδ θ1̇² + l2 m2 sinδ θ2̇² + g(m1+m2) sinθ1 − g m2 cosδ sinθ2) / (l1·den)
/// θ2̈ =  (g(m1+m2) cosδ sinθ1 − g(m1+m2) sinθ2 + l1(m1+m2) θ1̇² sinδ + l2 m2 θ2̇² cosδ sinδ) / (l2·den)
/// ```
#[derive(Debug, Clone)]
pub struct DoublePendulum {
    params: DoublePendulumParams,
}

/// Intermediate quantities shared by the derivative and the Jacobian.
struct Terms {
    sin_d: f64,
    cos_d: f64,
    den: f64,
    /// Numerator of `−θ1̈·l1·den`.
    n1: f64,
    /// Numerator of `θ2̈·l2·den`.
    n2: f64,
}

impl DoublePendulum {
    pub fn new(params: DoublePendulumParams) -> EstimationResult<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &DoublePendulumParams {
        &self.params
    }

    fn terms(&self, x: &Vector4<f64>) -> EstimationResult<Terms> {
        let p = &self.params;
        let (th1, w1, th2, w2) = (x[0], x[1], x[2], x[3]);
        let (sin_d, cos_d) = (th1 - th2).sin_cos();
        let m = p.m1 + p.m2;

        let den = m - p.m2 * cos_d * cos_d;
        if !den.is_finite() || (den * p.l1.min(p.l2)).abs() < MIN_DENOMINATOR {
            return Err(EstimationError::NumericalDegeneracy(format!(
                "mass-matrix denominator {den:e} vanishes at θ1 = {th1}, θ2 = {th2}"
            )));
        }

        let n1 = p.l1 * p.m2 * cos_d * sin_d * w1 * w1
            + p.l2 * p.m2 * sin_d * w2 * w2
            + p.g * m * th1.sin()
            - p.g * p.m2 * cos_d * th2.sin();
        let n2 = p.g * m * cos_d * th1.sin() - p.g * m * th2.sin()
            + p.l1 * m * w1 * w1 * sin_d
            + p.l2 * p.m2 * w2 * w2 * cos_d * sin_d;

        Ok(Terms {
            sin_d,
            cos_d,
            den,
            n1,
            n2,
        })
    }

    /// Total mechanical energy (kinetic plus potential, zero with both rods
    /// horizontal). Conserved by the true dynamics.
    pub fn energy(&self, x: &Vector4<f64>) -> f64 {
        let p = &self.params;
        let (th1, w1, th2, w2) = (x[0], x[1], x[2], x[3]);

        let kinetic = 0.5 * p.m1 * (p.l1 * w1).powi(2)
            + 0.5
                * p.m2
                * ((p.l1 * w1).powi(2)
                    + (p.l2 * w2).powi(2)
                    + 2.0 * p.l1 * p.l2 * w1 * w2 * (th1 - th2).cos());
        let potential = -(p.m1 + p.m2) * p.g * p.l1 * th1.cos() - p.m2 * p.g * p.l2 * th2.cos();
        kinetic + potential
    }
}

impl Dynamics<4> for DoublePendulum {
    fn get_state_layout(&self) -> Vec<StateVariable> {
        double_pendulum_layout()
    }

    fn get_derivatives(&self, x: &Vector4<f64>) -> EstimationResult<Vector4<f64>> {
        let p = &self.params;
        let t = self.terms(x)?;

        let x_dot = Vector4::new(
            x[1],
            -t.n1 / (p.l1 * t.den),
            x[3],
            t.n2 / (p.l2 * t.den),
        );
        ensure_finite(x_dot, "double pendulum derivative")
    }

    fn calculate_jacobian(&self, x: &Vector4<f64>) -> EstimationResult<Matrix4<f64>> {
        let p = &self.params;
        let t = self.terms(x)?;
        let (th1, w1, th2, w2) = (x[0], x[1], x[2], x[3]);
        let (s, c) = (t.sin_d, t.cos_d);
        let m = p.m1 + p.m2;
        let cos_2d = c * c - s * s;

        let d1 = p.l1 * t.den;
        let d2 = p.l2 * t.den;
        let a1 = -t.n1 / d1;
        let a2 = t.n2 / d2;

        // ∂den/∂θ1; the θ2 partial is its negation.
        let dden = 2.0 * p.m2 * c * s;

        let dn1_dth1 = p.l1 * p.m2 * w1 * w1 * cos_2d
            + p.l2 * p.m2 * w2 * w2 * c
            + p.g * m * th1.cos()
            + p.g * p.m2 * s * th2.sin();
        let dn1_dth2 = -p.l1 * p.m2 * w1 * w1 * cos_2d
            - p.l2 * p.m2 * w2 * w2 * c
            - p.g * p.m2 * (s * th2.sin() + c * th2.cos());
        let dn1_dw1 = 2.0 * p.l1 * p.m2 * c * s * w1;
        let dn1_dw2 = 2.0 * p.l2 * p.m2 * s * w2;

        let dn2_dth1 = p.g * m * (c * th1.cos() - s * th1.sin())
            + p.l1 * m * w1 * w1 * c
            + p.l2 * p.m2 * w2 * w2 * cos_2d;
        let dn2_dth2 = p.g * m * s * th1.sin() - p.g * m * th2.cos()
            - p.l1 * m * w1 * w1 * c
            - p.l2 * p.m2 * w2 * w2 * cos_2d;
        let dn2_dw1 = 2.0 * p.l1 * m * s * w1;
        let dn2_dw2 = 2.0 * p.l2 * p.m2 * c * s * w2;

        // Quotient rule: for a = N/D, ∂a = (∂N − a·∂D)/D.
        let da1_dth1 = -(dn1_dth1 + a1 * p.l1 * dden) / d1;
        let da1_dth2 = -(dn1_dth2 - a1 * p.l1 * dden) / d1;
        let da2_dth1 = (dn2_dth1 - a2 * p.l2 * dden) / d2;
        let da2_dth2 = (dn2_dth2 + a2 * p.l2 * dden) / d2;

        #[rustfmt::skip]
        let f_jac = Matrix4::new(
            0.0,      1.0,            0.0,      0.0,
            da1_dth1, -dn1_dw1 / d1,  da1_dth2, -dn1_dw2 / d1,
            0.0,      0.0,            0.0,      1.0,
            da2_dth1, dn2_dw1 / d2,   da2_dth2, dn2_dw2 / d2,
        );
        ensure_finite(f_jac, "double pendulum Jacobian")
    }
}
