// pendula_sim/src/error.rs

use pendula_core::error::EstimationError;
use std::path::PathBuf;
use thiserror::Error;

/// Failures of the simulation harness and the `pendula` binary.
///
/// Estimation errors inside a run are logged and skipped by the runner; they
/// only surface here when building the filter or models fails.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("failed to load scenario configuration: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("scenario file not found: {}", .0.display())]
    MissingScenario(PathBuf),

    #[error("invalid scenario: {0}")]
    InvalidScenario(String),

    #[error(transparent)]
    Estimation(#[from] EstimationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize run history: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<figment::Error> for SimError {
    fn from(err: figment::Error) -> Self {
        SimError::Config(Box::new(err))
    }
}
