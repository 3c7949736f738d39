// pendula_sim/src/cli.rs

use clap::Parser;
use std::path::PathBuf;

/// Pendula: EKF state estimation for simulated pendulum systems.
///
/// This struct defines the command-line arguments of the `pendula` binary.
/// Flags override the matching scenario settings.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The path to the scenario TOML file to run. Built-in defaults are used
    /// when omitted.
    #[arg(short, long)]
    pub scenario: Option<PathBuf>,

    /// Seed for the simulation RNG (overrides `simulation.seed`).
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of reference samples (overrides `simulation.steps`).
    #[arg(long)]
    pub steps: Option<usize>,

    /// Write the posterior history as JSON to this path.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
