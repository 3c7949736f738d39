// pendula_core/src/models/measurement/tip_position.rs

use nalgebra::{Matrix2x4, Vector2, Vector4};

use crate::models::dynamics::double_pendulum::DoublePendulumParams;
use crate::models::measurement::Measurement;

/// Cartesian position of the second mass relative to the pivot, y pointing up:
/// `z = [l1 sinθ1 + l2 sinθ2, −l1 cosθ1 − l2 cosθ2]`.
#[derive(Debug, Clone)]
pub struct TipPositionModel {
    pub l1: f64,
    pub l2: f64,
}

impl TipPositionModel {
    pub fn from_params(params: &DoublePendulumParams) -> Self {
        Self {
            l1: params.l1,
            l2: params.l2,
        }
    }
}

impl Measurement<4, 2> for TipPositionModel {
    fn predict_measurement(&self, x: &Vector4<f64>) -> Vector2<f64> {
        let (s1, c1) = x[0].sin_cos();
        let (s2, c2) = x[2].sin_cos();
        Vector2::new(self.l1 * s1 + self.l2 * s2, -self.l1 * c1 - self.l2 * c2)
    }

    fn calculate_jacobian(&self, x: &Vector4<f64>) -> Matrix2x4<f64> {
        let (s1, c1) = x[0].sin_cos();
        let (s2, c2) = x[2].sin_cos();

        #[rustfmt::skip]
        let h_jac = Matrix2x4::new(
            self.l1 * c1, 0.0, self.l2 * c2, 0.0,
            self.l1 * s1, 0.0, self.l2 * s2, 0.0,
        );
        h_jac
    }
}
