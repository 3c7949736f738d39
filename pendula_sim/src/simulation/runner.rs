// pendula_sim/src/simulation/runner.rs

//! Drives one scenario end to end: reference trajectory, noisy readings,
//! filter steps and the posterior history.

use nalgebra::SVector;
use tracing::{debug, info, warn};

use pendula_core::prelude::*;

use crate::error::SimError;
use crate::simulation::config::{ScenarioConfig, SensorKind, SystemConfig};
use crate::simulation::prng::SimulationRng;
use crate::simulation::report::{PosteriorRecord, RunReport};
use crate::simulation::sensor::NoisySensor;
use crate::simulation::truth::generate_trajectory;

/// Runs the scenario with the given seed.
///
/// Estimation failures inside the loop never abort the run. A rejected
/// predict/update cycle is logged at `warn`, counted in
/// [`RunReport::skipped_steps`], and replaced by a predict-only step so the
/// filter clock keeps pace with the reference trajectory.
pub fn run_scenario(config: &ScenarioConfig, seed: u64) -> Result<RunReport, SimError> {
    config.validate()?;
    let mut rng = SimulationRng::from_seed(seed);

    match (config.system, config.sensor.kind) {
        (SystemConfig::DoublePendulum(params), SensorKind::JointAngles) => {
            let model = JointAngleModel::double_pendulum()?;
            run::<4, 2, _, _>(config, seed, DoublePendulum::new(params)?, model, &mut rng)
        }
        (SystemConfig::DoublePendulum(params), SensorKind::TipPosition) => {
            let model = TipPositionModel::from_params(&params);
            run::<4, 2, _, _>(config, seed, DoublePendulum::new(params)?, model, &mut rng)
        }
        (SystemConfig::SinglePendulum(params), SensorKind::JointAngles) => {
            let model = JointAngleModel::single_pendulum()?;
            run::<2, 1, _, _>(config, seed, SinglePendulum::new(params)?, model, &mut rng)
        }
        (SystemConfig::SinglePendulum(_), SensorKind::TipPosition) => {
            Err(SimError::InvalidScenario(
                "the tip_position sensor needs the double_pendulum model".into(),
            ))
        }
    }
}

fn run<const N: usize, const M: usize, D, H>(
    config: &ScenarioConfig,
    seed: u64,
    dynamics: D,
    measurement: H,
    rng: &mut SimulationRng,
) -> Result<RunReport, SimError>
where
    D: Dynamics<N> + 'static,
    H: Measurement<N, M> + Clone + 'static,
{
    let sim = &config.simulation;
    let initial_state = SVector::<f64, N>::from_column_slice(&sim.initial_state);

    // --- 1. Ground truth ---
    let trajectory =
        generate_trajectory(&dynamics, initial_state, sim.dt, sim.substeps, sim.steps)?;

    // --- 2. Sensor and estimator ---
    let sensor = NoisySensor::new(
        Box::new(measurement.clone()),
        config.sensor.noise_variance,
        config.sensor.dropout_probability,
    )?;
    let mut filter = ExtendedKalmanFilter::<N, M>::new(
        config.ekf_params(N, M),
        Box::new(dynamics),
        Box::new(measurement),
        config.filter.integrator,
    )?;

    info!(
        seed,
        steps = sim.steps,
        dt = sim.dt,
        sensor = ?config.sensor.kind,
        "starting estimation run"
    );

    // --- 3. Filter loop: one predict/update per sample after the initial one ---
    let mut report = RunReport::new(seed, filter.dynamics().get_state_layout());
    for sample in trajectory.iter().skip(1) {
        let message = sensor.measure(sample, rng);
        let input = match &message {
            Some(message) => ModuleInput::Measurement { message },
            None => {
                report.dropped_measurements += 1;
                debug!(step = sample.step, "measurement dropped; predicting only");
                ModuleInput::TimeStep
            }
        };

        if let Err(err) = filter.process(&input) {
            warn!(step = sample.step, %err, "skipping estimation step");
            report.skipped_steps += 1;
            if message.is_some() {
                // The failed cycle committed nothing; still advance the clock.
                if let Err(err) = filter.process(&ModuleInput::TimeStep) {
                    warn!(step = sample.step, %err, "predict-only fallback failed");
                }
            }
        }

        report.push(PosteriorRecord::new(
            sample.step,
            filter.get_state(),
            &sample.state,
            message.as_ref(),
        ));
    }

    let belief = filter.get_state();
    for var in &belief.layout {
        debug!(
            ?var,
            estimate = ?belief.get(var),
            std_dev = ?belief.std_dev(var),
            "final belief"
        );
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short_config(steps: usize) -> ScenarioConfig {
        let mut config = ScenarioConfig::default();
        config.simulation.steps = steps;
        config
    }

    #[test]
    fn test_one_record_per_filter_step() {
        let report = run_scenario(&short_config(50), 1).unwrap();
        assert_eq!(report.records.len(), 49);
        assert_eq!(report.records[0].step, 1);
        assert_eq!(report.records[48].step, 49);
        assert_eq!(report.layout, double_pendulum_layout());
        assert!(report.records.iter().all(|r| r.measurement.is_some()));
        assert_eq!(report.skipped_steps, 0);
    }

    #[test]
    fn test_filter_time_tracks_reference_time() {
        let report = run_scenario(&short_config(30), 2).unwrap();
        for record in &report.records {
            approx::assert_relative_eq!(record.time, record.step as f64 * 0.01, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_dropouts_are_counted() {
        let mut config = short_config(400);
        config.sensor.dropout_probability = 0.5;
        let report = run_scenario(&config, 3).unwrap();

        let missing = report.records.iter().filter(|r| r.measurement.is_none()).count();
        assert_eq!(missing, report.dropped_measurements);
        assert!(missing > 100 && missing < 300);
    }

    #[test]
    fn test_singular_updates_are_skipped_not_fatal() {
        // A perfect sensor with zero angle uncertainty makes S singular on
        // every update; the run still completes.
        let mut config = short_config(10);
        config.filter.initial_variance = 0.0;
        config.filter.process_noise = 0.0;
        config.filter.measurement_noise = 0.0;
        config.sensor.noise_variance = 0.0;

        let report = run_scenario(&config, 4).unwrap();
        assert_eq!(report.records.len(), 9);
        assert_eq!(report.skipped_steps, 9);
        for record in &report.records {
            approx::assert_relative_eq!(record.time, record.step as f64 * 0.01, epsilon = 1e-12);
            assert_eq!(record.covariance_trace, 0.0);
        }
    }
}
