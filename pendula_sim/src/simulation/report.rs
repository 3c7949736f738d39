// pendula_sim/src/simulation/report.rs

use nalgebra::SVector;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

use pendula_core::prelude::*;

use crate::error::SimError;

/// Snapshot of the filter after one step, next to what it was estimating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosteriorRecord {
    pub step: usize,
    pub time: f64,
    pub mean: Vec<f64>,
    pub covariance_trace: f64,
    pub truth: Vec<f64>,
    /// The reading fused at this step; `None` when it was dropped.
    pub measurement: Option<Vec<f64>>,
}

impl PosteriorRecord {
    pub fn new<const N: usize>(
        step: usize,
        belief: &GaussianBelief<N>,
        truth: &SVector<f64, N>,
        measurement: Option<&MeasurementMessage>,
    ) -> Self {
        Self {
            step,
            time: belief.timestamp,
            mean: belief.mean.iter().copied().collect(),
            covariance_trace: belief.covariance_trace(),
            truth: truth.iter().copied().collect(),
            measurement: measurement.map(|m| m.z.iter().copied().collect()),
        }
    }
}

/// The append-only posterior history of one run plus its bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub seed: u64,
    /// Names the components of every `mean` and `truth` vector.
    pub layout: Vec<StateVariable>,
    pub records: Vec<PosteriorRecord>,
    /// Steps whose predict or update failed and was skipped.
    pub skipped_steps: usize,
    pub dropped_measurements: usize,
}

/// Headline numbers of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub steps: usize,
    pub rms_error: Vec<(StateVariable, f64)>,
    pub final_covariance_trace: Option<f64>,
    pub skipped_steps: usize,
    pub dropped_measurements: usize,
}

impl RunReport {
    pub fn new(seed: u64, layout: Vec<StateVariable>) -> Self {
        Self {
            seed,
            layout,
            ..Default::default()
        }
    }

    pub fn push(&mut self, record: PosteriorRecord) {
        self.records.push(record);
    }

    /// Root-mean-square estimation error of each state component over all
    /// records. Empty when there are no records.
    pub fn rms_errors(&self) -> Vec<f64> {
        if self.records.is_empty() {
            return Vec::new();
        }

        let mut sum_sq = vec![0.0; self.layout.len()];
        for record in &self.records {
            for (acc, (m, t)) in sum_sq.iter_mut().zip(record.mean.iter().zip(&record.truth)) {
                *acc += (m - t).powi(2);
            }
        }
        let n = self.records.len() as f64;
        sum_sq.into_iter().map(|s| (s / n).sqrt()).collect()
    }

    /// RMS error of a single state variable, if it is part of the layout.
    pub fn rms_for(&self, var: &StateVariable) -> Option<f64> {
        let idx = self.layout.iter().position(|v| v == var)?;
        self.rms_errors().get(idx).copied()
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            steps: self.records.len(),
            rms_error: self.layout.iter().copied().zip(self.rms_errors()).collect(),
            final_covariance_trace: self.records.last().map(|r| r.covariance_trace),
            skipped_steps: self.skipped_steps,
            dropped_measurements: self.dropped_measurements,
        }
    }

    pub fn log_summary(&self) {
        let summary = self.summary();
        info!(
            steps = summary.steps,
            skipped = summary.skipped_steps,
            dropped = summary.dropped_measurements,
            final_trace = ?summary.final_covariance_trace,
            "run complete"
        );
        for (var, rms) in &summary.rms_error {
            info!("  RMS error {var:?}: {rms:.4}");
        }
    }

    /// Writes the full history as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> Result<(), SimError> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        info!("Wrote run history to {}", path.display());
        Ok(())
    }
}
