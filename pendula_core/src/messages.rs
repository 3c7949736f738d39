// pendula_core/src/messages.rs

use nalgebra::DVector;

// =========================================================================
// == Core Message Types ==
// =========================================================================

/// One measurement vector as delivered by a sensor, in the sensor's native
/// order. Its length is checked by the estimator, not here.
#[derive(Clone, Debug, PartialEq)]
pub struct MeasurementMessage {
    /// Index of the filter step this reading belongs to.
    pub step: usize,
    /// Time of the reading, in seconds.
    pub timestamp: f64,
    pub z: DVector<f64>,
}

impl MeasurementMessage {
    pub fn new(step: usize, timestamp: f64, z: DVector<f64>) -> Self {
        Self { step, timestamp, z }
    }
}

/// The universal input packet for all `StateEstimator` implementations.
#[derive(Clone, Copy, Debug)]
pub enum ModuleInput<'a> {
    /// Advance one fixed step without a measurement (dropout or heartbeat).
    TimeStep,
    /// Advance one fixed step, then fuse the measurement.
    Measurement { message: &'a MeasurementMessage },
}
