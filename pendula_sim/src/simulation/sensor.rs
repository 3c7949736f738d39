// pendula_sim/src/simulation/sensor.rs

use nalgebra::DVector;
use rand::Rng;
use rand_distr::{Distribution, Normal};

use pendula_core::prelude::*;

use crate::error::SimError;
use crate::simulation::prng::SimulationRng;
use crate::simulation::truth::TruthSample;

// =========================================================================
// == Noisy Sensor ==
// =========================================================================

/// Simulates a sensor reading `z = h(x_true) + v` with `v ~ N(0, σ²·I)`.
///
/// Every component draws its own noise sample. With probability
/// `dropout_probability` the reading is lost and no message is produced.
#[derive(Debug)]
pub struct NoisySensor<const N: usize, const M: usize> {
    model: Box<dyn Measurement<N, M>>,
    // Store the noise distribution for efficiency
    noise_dist: Normal<f64>,
    dropout_probability: f64,
}

impl<const N: usize, const M: usize> NoisySensor<N, M> {
    pub fn new(
        model: Box<dyn Measurement<N, M>>,
        noise_variance: f64,
        dropout_probability: f64,
    ) -> Result<Self, SimError> {
        if !(noise_variance.is_finite() && noise_variance >= 0.0) {
            return Err(SimError::InvalidScenario(format!(
                "sensor noise variance must be finite and non-negative, got {noise_variance}"
            )));
        }
        if !(0.0..=1.0).contains(&dropout_probability) {
            return Err(SimError::InvalidScenario(format!(
                "dropout probability must lie in [0, 1], got {dropout_probability}"
            )));
        }
        let noise_dist = Normal::new(0.0, noise_variance.sqrt())
            .map_err(|err| SimError::InvalidScenario(format!("sensor noise: {err}")))?;

        Ok(Self {
            model,
            noise_dist,
            dropout_probability,
        })
    }

    /// Produces the reading for one reference sample, or `None` on dropout.
    ///
    /// Draw order is fixed (dropout decision first, then one normal sample per
    /// component), so a seed fully determines the sequence of readings.
    pub fn measure(
        &self,
        sample: &TruthSample<N>,
        rng: &mut SimulationRng,
    ) -> Option<MeasurementMessage> {
        if rng.0.gen_bool(self.dropout_probability) {
            return None;
        }

        let perfect = self.model.predict_measurement(&sample.state);
        let z = DVector::from_iterator(
            M,
            perfect.iter().map(|v| v + self.noise_dist.sample(&mut rng.0)),
        );
        Some(MeasurementMessage::new(sample.step, sample.time, z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector4;

    fn sample(step: usize) -> TruthSample<4> {
        TruthSample {
            step,
            time: step as f64 * 0.01,
            state: Vector4::new(0.5, 1.0, -0.25, 2.0),
        }
    }

    fn sensor(noise_variance: f64, dropout_probability: f64) -> NoisySensor<4, 2> {
        NoisySensor::new(
            Box::new(JointAngleModel::double_pendulum().unwrap()),
            noise_variance,
            dropout_probability,
        )
        .unwrap()
    }

    #[test]
    fn test_noise_free_reading_is_exact() {
        let mut rng = SimulationRng::from_seed(1);
        let message = sensor(0.0, 0.0).measure(&sample(3), &mut rng).unwrap();
        assert_eq!(message.step, 3);
        assert_eq!(message.z.as_slice(), &[0.5, -0.25]);
    }

    #[test]
    fn test_same_seed_same_readings() {
        let sensor = sensor(0.05, 0.1);
        let mut a = SimulationRng::from_seed(99);
        let mut b = SimulationRng::from_seed(99);

        for k in 0..200 {
            assert_eq!(sensor.measure(&sample(k), &mut a), sensor.measure(&sample(k), &mut b));
        }
    }

    #[test]
    fn test_noise_statistics() {
        let sensor = sensor(0.05, 0.0);
        let mut rng = SimulationRng::from_seed(5);
        let n = 20_000;

        let (mut sum, mut sum_sq, mut cross) = ([0.0; 2], [0.0; 2], 0.0);
        for k in 0..n {
            let z = sensor.measure(&sample(k), &mut rng).unwrap().z;
            let v = [z[0] - 0.5, z[1] + 0.25];
            for i in 0..2 {
                sum[i] += v[i];
                sum_sq[i] += v[i] * v[i];
            }
            cross += v[0] * v[1];
        }

        let n = n as f64;
        for i in 0..2 {
            assert!((sum[i] / n).abs() < 0.01, "mean of component {i}");
            assert!((sum_sq[i] / n - 0.05).abs() < 0.003, "variance of component {i}");
        }
        // Components draw independent noise.
        assert!((cross / n).abs() < 0.003);
    }

    #[test]
    fn test_dropout_rate() {
        let sensor = sensor(0.05, 0.3);
        let mut rng = SimulationRng::from_seed(17);
        let n = 10_000;
        let dropped = (0..n)
            .filter(|&k| sensor.measure(&sample(k), &mut rng).is_none())
            .count();

        let rate = dropped as f64 / n as f64;
        assert!((rate - 0.3).abs() < 0.02, "dropout rate {rate}");
    }

    #[test]
    fn test_rejects_bad_settings() {
        let model = || -> Box<dyn Measurement<4, 2>> {
            Box::new(JointAngleModel::double_pendulum().unwrap())
        };
        assert!(NoisySensor::new(model(), -0.1, 0.0).is_err());
        assert!(NoisySensor::new(model(), 0.05, 1.1).is_err());
        assert!(NoisySensor::new(model(), f64::NAN, 0.0).is_err());
    }
}
