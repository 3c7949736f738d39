// pendula_sim/src/simulation/truth.rs

use nalgebra::SVector;
use tracing::debug;

use pendula_core::prelude::*;
use pendula_core::utils::integrators::RK4;

/// One point of the noise-free reference trajectory.
#[derive(Debug, Clone, PartialEq)]
pub struct TruthSample<const N: usize> {
    pub step: usize,
    pub time: f64,
    pub state: SVector<f64, N>,
}

/// Integrates the dynamics without noise to produce the ground truth the
/// sensor observes and the filter is scored against.
///
/// Returns `steps` samples spaced `dt` apart. Sample 0 is `initial_state` at
/// time 0; each following sample is reached with `substeps` RK4 steps of
/// `dt / substeps`.
pub fn generate_trajectory<const N: usize>(
    dynamics: &dyn Dynamics<N>,
    initial_state: SVector<f64, N>,
    dt: f64,
    substeps: usize,
    steps: usize,
) -> EstimationResult<Vec<TruthSample<N>>> {
    if substeps == 0 {
        return Err(EstimationError::InvalidParameter(
            "reference trajectory needs at least one sub-step".to_string(),
        ));
    }

    let rk4: &dyn Integrator<N> = &RK4;
    let h = dt / substeps as f64;

    let mut samples = Vec::with_capacity(steps);
    let mut x = initial_state;
    for step in 0..steps {
        if step > 0 {
            for _ in 0..substeps {
                x = dynamics.propagate(&x, h, rk4)?;
            }
        }
        samples.push(TruthSample {
            step,
            time: step as f64 * dt,
            state: x,
        });
    }

    debug!(steps, substeps, dt, "reference trajectory generated");
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Vector2, Vector4};
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_first_sample_is_initial_state() {
        let dynamics = DoublePendulum::new(DoublePendulumParams::default()).unwrap();
        let x0 = Vector4::new(FRAC_PI_2, 0.0, FRAC_PI_2, 0.0);
        let samples = generate_trajectory::<4>(&dynamics, x0, 0.01, 10, 5).unwrap();

        assert_eq!(samples.len(), 5);
        assert_eq!(samples[0].state, x0);
        assert_eq!(samples[0].time, 0.0);
        assert_relative_eq!(samples[4].time, 0.04);
        assert_eq!(samples[3].step, 3);
    }

    #[test]
    fn test_double_pendulum_energy_is_conserved() {
        let dynamics = DoublePendulum::new(DoublePendulumParams::default()).unwrap();
        let x0 = Vector4::new(FRAC_PI_2, 0.0, FRAC_PI_2, 0.0);
        let samples = generate_trajectory::<4>(&dynamics, x0, 0.01, 10, 4000).unwrap();

        let e0 = dynamics.energy(&x0);
        for sample in samples.iter().step_by(100) {
            assert_relative_eq!(dynamics.energy(&sample.state), e0, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_matches_linearized_single_pendulum() {
        // Small swings follow θ(t) = θ0·cos(ωt).
        let params = SinglePendulumParams::default();
        let dynamics = SinglePendulum::new(params).unwrap();
        let omega = (params.g / params.length).sqrt();

        let samples =
            generate_trajectory::<2>(&dynamics, Vector2::new(1e-4, 0.0), 0.01, 10, 300).unwrap();
        for sample in &samples {
            let expected = 1e-4 * (omega * sample.time).cos();
            assert_relative_eq!(sample.state[0], expected, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_rejects_zero_substeps() {
        let dynamics = SinglePendulum::new(SinglePendulumParams::default()).unwrap();
        assert!(generate_trajectory::<2>(&dynamics, Vector2::zeros(), 0.01, 0, 10).is_err());
    }
}
